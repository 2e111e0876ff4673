//! Server timestamps.
//!
//! The backend's timestamp format depends on its database driver, so the raw
//! string is kept and only interpreted for display.

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// A creation timestamp exactly as the backend sent it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(String);

impl Timestamp {
    /// Wrap a raw server value.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The raw value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse into a naive date-time.
    ///
    /// Accepts RFC 3339 (`2024-05-01T13:45:00.000Z`) and SQL style
    /// (`2024-05-01 13:45:00`) values.
    #[must_use]
    pub fn parse(&self) -> Option<NaiveDateTime> {
        let raw = self.0.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.naive_utc());
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f"))
            .ok()
    }

    /// Format as `dd/mm/yyyy HH:MM`, falling back to the raw value.
    #[must_use]
    pub fn display(&self) -> String {
        self.parse().map_or_else(
            || self.0.clone(),
            |dt| dt.format("%d/%m/%Y %H:%M").to_string(),
        )
    }
}
