//! Core types for Scuffmart.
//!
//! This module provides type-safe wrappers for common domain concepts and the
//! entities exchanged with the commerce backend.

pub mod cart;
pub mod email;
pub mod id;
pub mod order;
pub mod price;
pub mod product;
pub mod status;
pub mod timestamp;
pub mod user;

pub use cart::{CartItem, CartSnapshot, cart_count, cart_total};
pub use email::{Email, EmailError};
pub use id::*;
pub use order::{Order, OrderItem};
pub use price::Price;
pub use product::{Product, StockLevel};
pub use status::*;
pub use timestamp::Timestamp;
pub use user::User;
