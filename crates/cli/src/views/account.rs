//! Login, registration and logout pages.

use scuffmart_client::{ApiError, App, Route};
use scuffmart_core::{Email, User};
use secrecy::SecretString;
use tracing::instrument;

use crate::error::ViewError;
use crate::views::{invalid, report};

fn parse_email(app: &App, raw: &str) -> Result<Email, ViewError> {
    Email::parse(raw).map_err(|e| invalid(app, format!("Invalid email: {e}")))
}

/// After signing in: greet, go home, and load the new user's cart.
async fn signed_in(app: &App, user: &User) {
    app.notifications
        .show_success(format!("Welcome, {}!", user.name));
    app.navigator.navigate(Route::Home);
    if let Err(e) = app.cart.refresh_cart().await {
        tracing::warn!(error = %e, "Failed to load cart after sign-in");
    }
}

/// Sign in with email and password.
///
/// # Errors
///
/// `Invalid` for a malformed email, `Api` when the backend refuses.
#[instrument(skip(app, password))]
pub async fn login(app: &App, email: &str, password: SecretString) -> Result<User, ViewError> {
    app.navigator.navigate(Route::Login);
    let email = parse_email(app, email)?;

    match app.auth.login(&email, &password).await {
        Ok(user) => {
            signed_in(app, &user).await;
            Ok(user)
        }
        Err(ApiError::Unauthorized) => {
            app.notifications.show_error("Invalid email or password");
            Err(ViewError::Api(ApiError::Unauthorized))
        }
        Err(e) => Err(report(app, e, "Login failed")),
    }
}

/// Create an account and sign in.
///
/// # Errors
///
/// `Invalid` for a blank name or malformed email, `Api` when the backend
/// refuses (for example an email already in use).
#[instrument(skip(app, password))]
pub async fn register(
    app: &App,
    name: &str,
    email: &str,
    password: SecretString,
) -> Result<User, ViewError> {
    app.navigator.navigate(Route::Register);
    let name = name.trim();
    if name.is_empty() {
        return Err(invalid(app, "Name is required"));
    }
    let email = parse_email(app, email)?;

    let user = app
        .auth
        .register(name, &email, &password)
        .await
        .map_err(|e| report(app, e, "Registration failed"))?;
    signed_in(app, &user).await;
    Ok(user)
}

/// Forget the session locally and go home.
pub fn logout(app: &App) {
    let was_signed_in = app.session.is_authenticated();
    app.auth.logout();
    app.navigator.navigate(Route::Home);
    if was_signed_in {
        app.notifications.show_success("Signed out");
    }
}

/// Re-read the signed-in user from the backend.
///
/// # Errors
///
/// `LoginRequired` when signed out, `Api` when the backend refuses.
#[instrument(skip(app))]
pub async fn whoami(app: &App) -> Result<User, ViewError> {
    crate::views::require_login(app)?;
    app.auth
        .refresh_profile()
        .await
        .map_err(|e| report(app, e, "Failed to load profile"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use reqwest::StatusCode;
    use scuffmart_client::api::mock::{ApiCall, MockApi};
    use scuffmart_core::{CartSnapshot, Role};

    use super::*;
    use crate::views::testing;

    #[tokio::test]
    async fn test_login_greets_and_loads_cart() {
        let api = MockApi::new()
            .with_auth(testing::user(Role::Client), "tok")
            .with_cart(CartSnapshot::Items(vec![testing::line(1, 2, 100)]));
        let (app, api) = testing::app("login", api, None);

        login(&app, "ana@example.com", SecretString::from("pw"))
            .await
            .unwrap();

        assert_eq!(app.navigator.current(), Route::Home);
        assert_eq!(app.cart.cart_count(), 2);
        assert_eq!(app.notifications.active()[0].text, "Welcome, Ana!");
        assert_eq!(api.calls()[1], ApiCall::Cart);
    }

    #[tokio::test]
    async fn test_bad_email_makes_no_call() {
        let (app, api) = testing::app("login-bad", MockApi::new(), None);

        let result = login(&app, "not-an-email", SecretString::from("pw")).await;

        assert!(matches!(result, Err(ViewError::Invalid(_))));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_register_conflict_shows_server_message() {
        let api = MockApi::new();
        api.fail("register", StatusCode::BAD_REQUEST, Some("Email already registered"));
        let (app, _) = testing::app("register-dup", api, None);

        let result = register(&app, "Ana", "ana@example.com", SecretString::from("pw")).await;

        assert!(result.is_err());
        assert!(!app.session.is_authenticated());
        assert_eq!(app.notifications.active()[0].text, "Email already registered");
    }

    #[tokio::test]
    async fn test_logout_goes_home() {
        let (app, api) = testing::app("logout", MockApi::new(), Some(Role::Client));

        logout(&app);

        assert!(!app.session.is_authenticated());
        assert_eq!(app.navigator.current(), Route::Home);
        assert!(api.calls().is_empty());
    }
}
