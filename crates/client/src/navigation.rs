//! Client-side routes and the navigator.
//!
//! Views and the API client never jump between screens themselves; they ask
//! the [`Navigator`], and whoever renders (the CLI) watches where it points.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use scuffmart_core::ProductId;
use tokio::sync::watch;

/// A screen of the storefront.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Route {
    #[default]
    Home,
    Product(ProductId),
    Login,
    Register,
    Cart,
    Orders,
    AdminProducts,
    AdminOrders,
}

impl Route {
    /// Whether the route is only meaningful for admins.
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::AdminProducts | Self::AdminOrders)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Home => f.write_str("/"),
            Self::Product(id) => write!(f, "/product/{id}"),
            Self::Login => f.write_str("/login"),
            Self::Register => f.write_str("/register"),
            Self::Cart => f.write_str("/cart"),
            Self::Orders => f.write_str("/orders"),
            Self::AdminProducts => f.write_str("/admin"),
            Self::AdminOrders => f.write_str("/admin/orders"),
        }
    }
}

/// Error parsing a path into a [`Route`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown route: {0}")]
pub struct UnknownRoute(pub String);

impl FromStr for Route {
    type Err = UnknownRoute;

    fn from_str(path: &str) -> Result<Self, Self::Err> {
        let trimmed = path.trim().trim_end_matches('/');
        let segments: Vec<&str> = trimmed.split('/').filter(|s| !s.is_empty()).collect();
        match segments.as_slice() {
            [] => Ok(Self::Home),
            ["product", id] => id
                .parse()
                .map(Self::Product)
                .map_err(|_| UnknownRoute(path.to_owned())),
            ["login"] => Ok(Self::Login),
            ["register"] => Ok(Self::Register),
            ["cart"] => Ok(Self::Cart),
            ["orders"] => Ok(Self::Orders),
            ["admin"] => Ok(Self::AdminProducts),
            ["admin", "orders"] => Ok(Self::AdminOrders),
            _ => Err(UnknownRoute(path.to_owned())),
        }
    }
}

/// Process-wide current route.
///
/// Cheap to clone; all clones share one route.
#[derive(Debug, Clone)]
pub struct Navigator {
    route: Arc<watch::Sender<Route>>,
}

impl Navigator {
    /// Start at `initial`.
    #[must_use]
    pub fn new(initial: Route) -> Self {
        let (route, _) = watch::channel(initial);
        Self {
            route: Arc::new(route),
        }
    }

    /// Go to `route`. Subscribers are notified even if it is the current one.
    pub fn navigate(&self, route: Route) {
        tracing::debug!(%route, "navigate");
        self.route.send_replace(route);
    }

    /// Where the navigator currently points.
    #[must_use]
    pub fn current(&self) -> Route {
        *self.route.borrow()
    }

    /// Watch route changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Route> {
        self.route.subscribe()
    }
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new(Route::Home)
    }
}
