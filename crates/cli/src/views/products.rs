//! Catalog listing (home page).

use askama::Template;
use scuffmart_client::{App, ClientConfig};
use scuffmart_core::{Product, StockLevel};
use tracing::instrument;

use crate::error::ViewError;
use crate::views::report;

/// One product in a listing.
#[derive(Debug, Clone)]
pub struct ProductCard {
    pub id: String,
    pub name: String,
    pub price: String,
    pub original_price: Option<String>,
    pub discount: Option<String>,
    pub condition: Option<String>,
    pub stock_label: String,
    pub image: Option<String>,
}

impl ProductCard {
    #[must_use]
    pub fn new(product: &Product, config: &ClientConfig) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            price: product.price.display(),
            original_price: product.original_price.map(|p| p.display()),
            discount: discount_badge(product),
            condition: product.condition_description.clone(),
            stock_label: stock_label(product.stock_level()),
            image: product.image_path().map(|path| config.asset(&path)),
        }
    }
}

#[derive(Debug, Clone, Template)]
#[template(path = "products.txt")]
pub struct ProductListView {
    pub products: Vec<ProductCard>,
}

/// `-25% OFF` when the product has a positive original price.
pub(crate) fn discount_badge(product: &Product) -> Option<String> {
    product
        .discount_percentage()
        .map(|percent| format!("-{percent}% OFF"))
}

pub(crate) fn stock_label(level: StockLevel) -> String {
    match level {
        StockLevel::OutOfStock => "Out of stock".to_owned(),
        StockLevel::Low(n) => format!("{n} in stock (last units!)"),
        StockLevel::Available(n) => format!("{n} in stock"),
    }
}

/// Fetch the whole catalog.
///
/// # Errors
///
/// Returns `ViewError::Api` after raising an error notification.
#[instrument(skip(app))]
pub async fn load(app: &App) -> Result<ProductListView, ViewError> {
    let products = app
        .api
        .products()
        .await
        .map_err(|e| report(app, e, "Failed to load products"))?;

    Ok(ProductListView {
        products: products
            .iter()
            .map(|p| ProductCard::new(p, &app.config))
            .collect(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use reqwest::StatusCode;
    use scuffmart_client::api::mock::MockApi;
    use scuffmart_core::Price;

    use super::*;
    use crate::views::testing;

    #[tokio::test]
    async fn test_listing_shows_discount_and_condition() {
        let mut lamp = testing::product(1, "Lamp", 7500, 3);
        lamp.original_price = Some(Price::from_cents(10000));
        lamp.condition_description = Some("Dented base".to_owned());
        lamp.image_url = Some("/uploads/lamp.jpg".to_owned());
        let api = MockApi::new().with_products(vec![lamp, testing::product(2, "Mug", 990, 0)]);
        let (app, _) = testing::app("list", api, None);

        let view = load(&app).await.unwrap();
        assert_eq!(
            view.products[0].image.as_deref(),
            Some("http://localhost:5001/lamp.jpg")
        );

        let text = view.render().unwrap();
        assert!(text.contains("#1 Lamp  R$ 75.00  (was R$ 100.00, -25% OFF)"));
        assert!(text.contains("3 in stock (last units!)"));
        assert!(text.contains("Condition: Dented base"));
        assert!(text.contains("#2 Mug  R$ 9.90"));
        assert!(text.contains("Out of stock"));
    }

    #[tokio::test]
    async fn test_empty_catalog() {
        let (app, _) = testing::app("list-empty", MockApi::new(), None);
        let text = load(&app).await.unwrap().render().unwrap();
        assert!(text.contains("No products available yet."));
    }

    #[tokio::test]
    async fn test_load_failure_notifies() {
        let api = MockApi::new();
        api.fail("products", StatusCode::INTERNAL_SERVER_ERROR, None);
        let (app, _) = testing::app("list-fail", api, None);

        assert!(matches!(load(&app).await, Err(ViewError::Api(_))));
        assert_eq!(app.notifications.active()[0].text, "Failed to load products");
    }
}
