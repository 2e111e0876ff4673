//! Authenticated user identity.

use serde::{Deserialize, Serialize};

use super::{Email, Role, UserId};

/// The signed-in account as reported by `/auth/login`, `/auth/register` and
/// `/auth/me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    #[serde(default)]
    pub role: Role,
}

impl User {
    /// Whether the user may open the admin console.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}
