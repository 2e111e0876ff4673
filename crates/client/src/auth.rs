//! Login, registration and logout on top of the [`SessionStore`].

use std::sync::Arc;

use scuffmart_core::{Email, User};
use secrecy::SecretString;
use tracing::instrument;

use crate::api::CommerceApi;
use crate::error::Result;
use crate::session::SessionStore;

/// Authentication actions.
#[derive(Clone)]
pub struct AuthStore {
    api: Arc<dyn CommerceApi>,
    session: SessionStore,
}

impl AuthStore {
    #[must_use]
    pub fn new(api: Arc<dyn CommerceApi>, session: SessionStore) -> Self {
        Self { api, session }
    }

    /// The session this store writes to.
    #[must_use]
    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Sign in and persist the session.
    ///
    /// # Errors
    ///
    /// Returns the backend error unchanged; the session is left as it was.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(&self, email: &Email, password: &SecretString) -> Result<User> {
        let auth = self.api.login(email, password).await?;
        self.session
            .establish(auth.user.clone(), SecretString::from(auth.token));
        Ok(auth.user)
    }

    /// Create an account and sign in as it.
    ///
    /// # Errors
    ///
    /// Returns the backend error unchanged; the session is left as it was.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn register(
        &self,
        name: &str,
        email: &Email,
        password: &SecretString,
    ) -> Result<User> {
        let auth = self.api.register(name, email, password).await?;
        self.session
            .establish(auth.user.clone(), SecretString::from(auth.token));
        Ok(auth.user)
    }

    /// Forget the session. The backend is not told.
    pub fn logout(&self) {
        self.session.clear();
    }

    /// Re-read the signed-in user from the backend, keeping the token.
    ///
    /// # Errors
    ///
    /// Returns the backend error. A 401 has already cleared the session.
    #[instrument(skip(self))]
    pub async fn refresh_profile(&self) -> Result<User> {
        let user = self.api.me().await?;
        self.session.replace_user(user.clone());
        Ok(user)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use reqwest::StatusCode;
    use scuffmart_core::{Role, UserId};
    use secrecy::ExposeSecret;

    use super::*;
    use crate::api::mock::{ApiCall, MockApi};
    use crate::storage::LocalStorage;

    fn temp_session(name: &str) -> SessionStore {
        let dir = std::env::temp_dir().join(format!(
            "scuffmart-auth-{name}-{}",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        SessionStore::open(LocalStorage::new(dir.join("storage.json")))
    }

    fn ana() -> User {
        User {
            id: UserId::new(4),
            name: "Ana".to_owned(),
            email: Email::parse("ana@example.com").unwrap(),
            role: Role::Client,
        }
    }

    #[tokio::test]
    async fn test_login_establishes_session() {
        let api = Arc::new(MockApi::new().with_auth(ana(), "tok-4"));
        let auth = AuthStore::new(api.clone(), temp_session("login"));

        let email = Email::parse("ana@example.com").unwrap();
        let user = auth
            .login(&email, &SecretString::from("pw"))
            .await
            .unwrap();

        assert_eq!(user.id, UserId::new(4));
        assert_eq!(auth.session().token().unwrap().expose_secret(), "tok-4");
        assert_eq!(api.calls(), vec![ApiCall::Login(email)]);
    }

    #[tokio::test]
    async fn test_failed_login_leaves_session_untouched() {
        let api = Arc::new(MockApi::new());
        api.fail("login", StatusCode::BAD_REQUEST, Some("Invalid credentials"));
        let auth = AuthStore::new(api, temp_session("login-fail"));

        let err = auth
            .login(
                &Email::parse("ana@example.com").unwrap(),
                &SecretString::from("wrong"),
            )
            .await
            .unwrap_err();

        assert_eq!(err.user_message("Login failed"), "Invalid credentials");
        assert!(!auth.session().is_authenticated());
    }

    #[tokio::test]
    async fn test_register_signs_in() {
        let api = Arc::new(MockApi::new().with_auth(ana(), "fresh"));
        let auth = AuthStore::new(api, temp_session("register"));

        auth.register(
            "Ana",
            &Email::parse("ana@example.com").unwrap(),
            &SecretString::from("pw"),
        )
        .await
        .unwrap();

        assert_eq!(auth.session().user_id(), Some(UserId::new(4)));
    }

    #[tokio::test]
    async fn test_logout_makes_no_call() {
        let api = Arc::new(MockApi::new().with_auth(ana(), "t"));
        let auth = AuthStore::new(api.clone(), temp_session("logout"));
        auth.session().establish(ana(), SecretString::from("t"));

        auth.logout();

        assert!(!auth.session().is_authenticated());
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_profile_replaces_user() {
        let mut promoted = ana();
        promoted.role = Role::Admin;
        let api = Arc::new(MockApi::new().with_auth(promoted, "ignored"));
        let auth = AuthStore::new(api, temp_session("me"));
        auth.session().establish(ana(), SecretString::from("kept"));

        auth.refresh_profile().await.unwrap();

        assert!(auth.session().is_admin());
        assert_eq!(auth.session().token().unwrap().expose_secret(), "kept");
    }
}
