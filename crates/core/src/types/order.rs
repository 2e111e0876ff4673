//! Orders and their line items.

use serde::{Deserialize, Serialize};

use super::product::asset_path;
use super::{OrderId, OrderItemId, OrderStatus, Price, ProductId, Timestamp, UserId};

/// An order as returned by `GET /orders`.
///
/// `user_name` and `user_email` are only filled in for admin listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub total: Price,
    pub status: OrderStatus,
    #[serde(default)]
    pub created_at: Timestamp,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub user_email: Option<String>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
}

/// Immutable snapshot of a purchased product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub price: Price,
    pub name: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl OrderItem {
    /// Path of the item's image relative to the asset host.
    #[must_use]
    pub fn image_path(&self) -> Option<String> {
        self.image_url.as_deref().map(asset_path)
    }
}
