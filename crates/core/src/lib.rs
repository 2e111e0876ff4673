//! Scuffmart Core - Shared domain types.
//!
//! This crate provides the types used across all Scuffmart components:
//! - `client` - REST client and the session/cart/notification stores
//! - `cli` - Terminal views over the stores
//!
//! # Architecture
//!
//! The core crate contains only types and pure helpers - no I/O, no HTTP
//! clients, no async. The remote commerce backend owns all durable state;
//! these types mirror its JSON shapes.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, prices, emails, statuses and the entities the
//!   backend returns (users, products, cart lines, orders)

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
