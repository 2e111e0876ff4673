//! Scuffmart client - REST access and shared state for the storefront.
//!
//! Views never talk to the backend directly. They read from the stores in an
//! [`App`] and call their actions; the stores call the [`api::CommerceApi`]
//! and publish the results on `tokio::sync::watch` channels.
//!
//! # Modules
//!
//! - [`api`] - Backend operations, the HTTP implementation and a test double
//! - [`auth`] - Login, registration, logout
//! - [`cart`] - Server-backed cart with re-fetch after every mutation
//! - [`config`] - Environment configuration
//! - [`navigation`] - Current route
//! - [`notifications`] - Transient user messages
//! - [`session`] - Signed-in user and token, persisted in [`storage`]

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod app;
pub mod auth;
pub mod cart;
pub mod config;
pub mod error;
pub mod navigation;
pub mod notifications;
pub mod session;
pub mod storage;

pub use app::App;
pub use config::{ClientConfig, ConfigError};
pub use error::{ApiError, Result};
pub use navigation::{Navigator, Route};
pub use notifications::{Notification, NotificationKind, NotificationStore};
