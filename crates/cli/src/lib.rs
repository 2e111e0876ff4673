//! Scuffmart terminal storefront.
//!
//! Views and their actions live here so they can be tested against
//! `scuffmart_client::api::mock::MockApi`; `main.rs` only parses arguments
//! and prints.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod error;
pub mod views;

pub use error::ViewError;
