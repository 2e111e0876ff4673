//! Errors returned by view actions.
//!
//! By the time a `ViewError` reaches the caller, the user-facing text has
//! already been pushed to the notification store; the error itself is for
//! logs and the exit status.

use std::path::PathBuf;

use scuffmart_client::ApiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ViewError {
    /// No session. The navigator has been sent to the login route.
    #[error("Login required")]
    LoginRequired,

    /// Signed in without the admin role. The navigator has been sent home.
    #[error("Admin access required")]
    Forbidden,

    /// Input rejected before any request was made.
    #[error("Invalid input: {0}")]
    Invalid(String),

    /// The backend call failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// An image file given to a product form could not be read.
    #[error("Failed to read image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),
}
