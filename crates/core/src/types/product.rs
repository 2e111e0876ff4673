//! Catalog products.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use super::{Price, ProductId, Timestamp};

/// Below this many units a product is flagged as "last units".
pub const LOW_STOCK_THRESHOLD: u32 = 5;

/// Largest quantity offered in a single add-to-cart.
pub const MAX_QUANTITY_PER_ADD: u32 = 10;

/// A product as listed by `GET /products`.
///
/// Products are server-owned; the client only requests mutations through the
/// admin endpoints and re-fetches afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Price,
    #[serde(default)]
    pub original_price: Option<Price>,
    /// What is wrong with the item (scratches, missing parts, ...).
    #[serde(default)]
    pub condition_description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    pub stock: u32,
    #[serde(default)]
    pub created_at: Timestamp,
}

/// How much of a product is left, for the stock badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockLevel {
    OutOfStock,
    Low(u32),
    Available(u32),
}

impl StockLevel {
    /// Classify a stock count.
    #[must_use]
    pub const fn of(stock: u32) -> Self {
        match stock {
            0 => Self::OutOfStock,
            n if n < LOW_STOCK_THRESHOLD => Self::Low(n),
            n => Self::Available(n),
        }
    }

    /// Whether anything can be bought.
    #[must_use]
    pub const fn in_stock(self) -> bool {
        !matches!(self, Self::OutOfStock)
    }
}

impl Product {
    /// Current stock classification.
    #[must_use]
    pub const fn stock_level(&self) -> StockLevel {
        StockLevel::of(self.stock)
    }

    /// Percentage off the original price, rounded half away from zero.
    ///
    /// `None` when there is no original price or it is not positive.
    #[must_use]
    pub fn discount_percentage(&self) -> Option<i64> {
        let original = self.original_price.filter(Price::is_positive)?;
        let ratio = (original.amount() - self.price.amount()) / original.amount();
        (ratio * Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
    }

    /// Quantities offered by the add-to-cart selector: `1..=min(10, stock)`.
    #[must_use]
    pub fn quantity_choices(&self) -> std::ops::RangeInclusive<u32> {
        1..=self.stock.min(MAX_QUANTITY_PER_ADD)
    }

    /// Path of the product image relative to the asset host.
    #[must_use]
    pub fn image_path(&self) -> Option<String> {
        self.image_url.as_deref().map(asset_path)
    }
}

/// Rewrite a backend image reference into a path served by the asset host.
///
/// The backend stores uploads under `/uploads/` but serves them from the root.
#[must_use]
pub fn asset_path(image_url: &str) -> String {
    image_url.strip_prefix("/uploads/").map_or_else(
        || image_url.to_owned(),
        |rest| format!("/{rest}"),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(stock: u32, price: i64, original: Option<i64>) -> Product {
        Product {
            id: ProductId::new(1),
            name: "Cracked phone".to_owned(),
            description: None,
            price: Price::from_cents(price),
            original_price: original.map(Price::from_cents),
            condition_description: Some("Screen cracked".to_owned()),
            image_url: Some("/uploads/phone.jpg".to_owned()),
            stock,
            created_at: Timestamp::default(),
        }
    }

    #[test]
    fn test_discount_percentage() {
        assert_eq!(product(1, 7500, Some(10000)).discount_percentage(), Some(25));
        assert_eq!(product(1, 6650, Some(10000)).discount_percentage(), Some(34));
        assert_eq!(product(1, 7500, None).discount_percentage(), None);
        assert_eq!(product(1, 7500, Some(0)).discount_percentage(), None);
    }

    #[test]
    fn test_stock_levels() {
        assert_eq!(product(0, 100, None).stock_level(), StockLevel::OutOfStock);
        assert_eq!(product(4, 100, None).stock_level(), StockLevel::Low(4));
        assert_eq!(product(5, 100, None).stock_level(), StockLevel::Available(5));
        assert!(!StockLevel::OutOfStock.in_stock());
    }

    #[test]
    fn test_quantity_choices_capped() {
        assert_eq!(product(3, 100, None).quantity_choices(), 1..=3);
        assert_eq!(product(40, 100, None).quantity_choices(), 1..=10);
        assert!(product(0, 100, None).quantity_choices().is_empty());
    }

    #[test]
    fn test_asset_path_rewrites_uploads() {
        assert_eq!(product(1, 1, None).image_path().unwrap(), "/phone.jpg");
        assert_eq!(asset_path("/images/a.png"), "/images/a.png");
    }

    #[test]
    fn test_deserialize_minimal_product() {
        let json = r#"{"id":3,"name":"Lamp","price":12.5,"stock":2,"created_at":"2024-01-01 10:00:00"}"#;
        let p: Product = serde_json::from_str(json).unwrap();
        assert_eq!(p.price, Price::from_cents(1250));
        assert!(p.original_price.is_none());
        assert_eq!(p.stock_level(), StockLevel::Low(2));
    }
}
