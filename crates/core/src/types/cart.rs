//! Cart lines and the two shapes of `GET /cart`.

use serde::{Deserialize, Deserializer, Serialize};

use super::{CartItemId, Price, ProductId};
use super::product::asset_path;

/// A cart line: a snapshot of the product taken when it was added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: CartItemId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub name: String,
    pub price: Price,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl CartItem {
    /// `price × quantity` for this line.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price.times(self.quantity)
    }

    /// Path of the line's image relative to the asset host.
    #[must_use]
    pub fn image_path(&self) -> Option<String> {
        self.image_url.as_deref().map(asset_path)
    }
}

/// Sum of quantities over `items`.
#[must_use]
pub fn cart_count(items: &[CartItem]) -> u32 {
    items.iter().map(|item| item.quantity).sum()
}

/// Sum of `price × quantity` over `items`.
#[must_use]
pub fn cart_total(items: &[CartItem]) -> Price {
    items.iter().map(CartItem::line_total).sum()
}

/// Body of `GET /cart`.
///
/// The backend answers with a bare array unless it dropped lines whose
/// product ran out of stock, in which case it wraps the surviving lines in an
/// envelope naming what it removed. Both shapes are decoded here so the cart
/// store never inspects raw JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CartSnapshot {
    /// Envelope: surviving lines plus the names of removed products.
    ItemsWithRemovals {
        items: Vec<CartItem>,
        /// Required key; `null` reads as nothing removed.
        #[serde(rename = "removedItems", deserialize_with = "null_as_empty")]
        removed_items: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// Plain array of lines.
    Items(Vec<CartItem>),
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

impl CartSnapshot {
    /// Split into the lines and the removed product names (empty for arrays).
    #[must_use]
    pub fn into_parts(self) -> (Vec<CartItem>, Vec<String>) {
        match self {
            Self::Items(items) => (items, Vec::new()),
            Self::ItemsWithRemovals {
                items,
                removed_items,
                ..
            } => (items, removed_items),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const LINE: &str =
        r#"{"id":1,"product_id":7,"quantity":2,"name":"Bent fork","price":3.5,"image_url":null}"#;

    #[test]
    fn test_plain_array_decodes_to_items() {
        let snapshot: CartSnapshot = serde_json::from_str(&format!("[{LINE}]")).unwrap();
        let CartSnapshot::Items(items) = snapshot else {
            panic!("expected plain items");
        };
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].product_id, ProductId::new(7));
    }

    #[test]
    fn test_envelope_decodes_to_removals() {
        let body = format!(r#"{{"items":[{LINE}],"removedItems":["Widget"],"message":"stock"}}"#);
        let snapshot: CartSnapshot = serde_json::from_str(&body).unwrap();
        let (items, removed) = snapshot.into_parts();
        assert_eq!(items.len(), 1);
        assert_eq!(removed, vec!["Widget".to_owned()]);
    }

    #[test]
    fn test_null_removals_adopt_items() {
        let body = format!(r#"{{"items":[{LINE}],"removedItems":null}}"#);
        let snapshot: CartSnapshot = serde_json::from_str(&body).unwrap();
        let (items, removed) = snapshot.into_parts();
        assert_eq!(items.len(), 1);
        assert!(removed.is_empty());

        let empty: CartSnapshot =
            serde_json::from_str(r#"{"items":[],"removedItems":null}"#).unwrap();
        assert_eq!(empty.into_parts(), (Vec::new(), Vec::new()));
    }

    #[test]
    fn test_object_without_removals_is_rejected() {
        let body = format!(r#"{{"items":[{LINE}]}}"#);
        assert!(serde_json::from_str::<CartSnapshot>(&body).is_err());
    }

    #[test]
    fn test_count_and_total() {
        let line: CartItem = serde_json::from_str(LINE).unwrap();
        let other = CartItem {
            id: CartItemId::new(2),
            product_id: ProductId::new(8),
            quantity: 1,
            name: "Chipped mug".to_owned(),
            price: Price::from_cents(1000),
            image_url: None,
        };
        let items = vec![line, other];
        assert_eq!(cart_count(&items), 3);
        assert_eq!(cart_total(&items), Price::from_cents(1700));
        assert_eq!(cart_total(&[]), Price::ZERO);
    }
}
