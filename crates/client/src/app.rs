//! Application context shared by every view.

use std::sync::Arc;

use crate::api::{CommerceApi, HttpApi};
use crate::auth::AuthStore;
use crate::cart::CartStore;
use crate::config::ClientConfig;
use crate::error::Result;
use crate::navigation::Navigator;
use crate::notifications::NotificationStore;
use crate::session::SessionStore;
use crate::storage::LocalStorage;

/// Everything a view needs, created once at startup.
///
/// Cloning is cheap: each store is an `Arc` handle onto shared state.
#[derive(Clone)]
pub struct App {
    pub config: ClientConfig,
    pub api: Arc<dyn CommerceApi>,
    pub session: SessionStore,
    pub auth: AuthStore,
    pub cart: CartStore,
    pub notifications: NotificationStore,
    pub navigator: Navigator,
}

impl App {
    /// Wire the HTTP client against `config`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Http` if the HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let session = SessionStore::open(LocalStorage::new(&config.storage_path));
        let navigator = Navigator::default();
        let api = HttpApi::new(&config, session.clone(), navigator.clone())?;
        Ok(Self::assemble(config, Arc::new(api), session, navigator))
    }

    /// Wire an arbitrary backend. The session is still read from
    /// `config.storage_path`.
    #[must_use]
    pub fn with_api(config: ClientConfig, api: Arc<dyn CommerceApi>) -> Self {
        let session = SessionStore::open(LocalStorage::new(&config.storage_path));
        Self::assemble(config, api, session, Navigator::default())
    }

    fn assemble(
        config: ClientConfig,
        api: Arc<dyn CommerceApi>,
        session: SessionStore,
        navigator: Navigator,
    ) -> Self {
        let notifications = NotificationStore::new(config.notification_ttl);
        let auth = AuthStore::new(Arc::clone(&api), session.clone());
        let cart = CartStore::new(Arc::clone(&api), session.clone(), notifications.clone());
        Self {
            config,
            api,
            session,
            auth,
            cart,
            notifications,
            navigator,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use reqwest::StatusCode;
    use scuffmart_core::{
        CartItem, CartItemId, CartSnapshot, Email, Price, ProductId, Role, User, UserId,
    };
    use secrecy::SecretString;

    use super::*;
    use crate::api::mock::MockApi;
    use crate::error::ApiError;

    fn user() -> User {
        User {
            id: UserId::new(1),
            name: "Ana".to_owned(),
            email: Email::parse("ana@example.com").unwrap(),
            role: Role::Client,
        }
    }

    fn app(name: &str, api: &Arc<MockApi>) -> App {
        let dir = std::env::temp_dir().join(format!(
            "scuffmart-app-{name}-{}",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        let config = ClientConfig::for_api("http://localhost:5001/api", dir.join("s.json")).unwrap();
        App::with_api(config, api.clone())
    }

    fn one_line() -> CartSnapshot {
        CartSnapshot::Items(vec![CartItem {
            id: CartItemId::new(10),
            product_id: ProductId::new(1),
            quantity: 2,
            name: "Dented kettle".to_owned(),
            price: Price::from_cents(1250),
            image_url: None,
        }])
    }

    async fn signed_in_with_cart(name: &str) -> (App, Arc<MockApi>) {
        let api = Arc::new(MockApi::new().with_auth(user(), "tok").with_cart(one_line()));
        let app = app(name, &api);
        app.auth
            .login(
                &Email::parse("ana@example.com").unwrap(),
                &SecretString::from("pw"),
            )
            .await
            .unwrap();
        app.cart.refresh_cart().await.unwrap();
        assert_eq!(app.cart.cart_count(), 2);
        (app, api)
    }

    #[tokio::test]
    async fn test_stores_share_one_session() {
        let (app, api) = signed_in_with_cart("shared").await;

        assert!(app.session.is_authenticated());
        assert_eq!(api.count("cart"), 1);
    }

    #[tokio::test]
    async fn test_logout_empties_cart_immediately() {
        let (app, api) = signed_in_with_cart("logout").await;

        app.auth.logout();

        assert!(app.cart.items().is_empty());
        assert_eq!(app.cart.cart_count(), 0);
        assert_eq!(app.cart.total_price(), Price::ZERO);
        assert_eq!(api.count("cart"), 1, "no request was needed");
    }

    #[tokio::test]
    async fn test_unauthorized_cart_fetch_empties_cart() {
        let (app, api) = signed_in_with_cart("expired").await;
        api.fail("cart", StatusCode::UNAUTHORIZED, None);

        let err = app.cart.refresh_cart().await.unwrap_err();

        assert!(matches!(err, ApiError::Unauthorized));
        assert!(app.cart.items().is_empty());
        assert_eq!(app.cart.cart_count(), 0);
        assert!(!app.cart.is_loading());
    }

    #[tokio::test]
    async fn test_other_account_never_sees_previous_lines() {
        let (app, _api) = signed_in_with_cart("switch").await;

        let other = User {
            id: UserId::new(2),
            name: "Bia".to_owned(),
            email: Email::parse("bia@example.com").unwrap(),
            role: Role::Client,
        };
        app.session.establish(other, SecretString::from("tok-2"));

        assert!(app.cart.items().is_empty(), "lines belong to the previous account");
    }
}
