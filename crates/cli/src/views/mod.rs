//! Terminal views.
//!
//! Each view reads the stores in an [`App`], renders an askama text
//! template, and exposes the actions its page offers. Actions report their
//! outcome through the notification store and steer the navigator the same
//! way the storefront pages do.

pub mod account;
pub mod admin;
pub mod cart;
pub mod header;
pub mod orders;
pub mod product;
pub mod products;

use scuffmart_client::{ApiError, App, Route};

use crate::error::ViewError;

/// Fail with `LoginRequired` (and head to the login route) when signed out.
pub(crate) fn require_login(app: &App) -> Result<(), ViewError> {
    if app.session.is_authenticated() {
        return Ok(());
    }
    app.navigator.navigate(Route::Login);
    Err(ViewError::LoginRequired)
}

/// Turn a backend failure into a notification and a `ViewError`.
///
/// A 401 has already cleared the session and moved the navigator, so it
/// raises no message of its own.
pub(crate) fn report(app: &App, error: ApiError, fallback: &str) -> ViewError {
    tracing::warn!(error = %error, "{fallback}");
    if !error.is_unauthorized() {
        app.notifications.show_error(error.user_message(fallback));
    }
    ViewError::Api(error)
}

/// Reject input with a notification.
pub(crate) fn invalid(app: &App, message: impl Into<String>) -> ViewError {
    let message = message.into();
    app.notifications.show_error(message.clone());
    ViewError::Invalid(message)
}
