//! Top bar: brand, greeting, cart badge and admin links.

use askama::Template;
use scuffmart_client::App;

/// Largest count shown on the cart badge before it collapses to `99+`.
const BADGE_MAX: u32 = 99;

#[derive(Debug, Clone, Template)]
#[template(path = "header.txt")]
pub struct HeaderView {
    pub user_name: Option<String>,
    pub cart_badge: Option<String>,
    pub is_admin: bool,
}

impl HeaderView {
    /// Snapshot the session and cart.
    #[must_use]
    pub fn new(app: &App) -> Self {
        let user = app.session.user();
        Self {
            is_admin: user.as_ref().is_some_and(|u| u.is_admin()),
            user_name: user.map(|u| u.name),
            cart_badge: cart_badge(app.cart.cart_count()),
        }
    }
}

/// Badge text for a cart holding `count` units; hidden when empty.
#[must_use]
pub fn cart_badge(count: u32) -> Option<String> {
    match count {
        0 => None,
        n if n > BADGE_MAX => Some(format!("{BADGE_MAX}+")),
        n => Some(n.to_string()),
    }
}
