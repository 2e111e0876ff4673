//! Product detail page and its add-to-cart action.

use askama::Template;
use scuffmart_client::{App, Route};
use scuffmart_core::{Product, ProductId, StockLevel};
use tracing::instrument;

use crate::error::ViewError;
use crate::views::products::discount_badge;
use crate::views::{invalid, report, require_login};

#[derive(Debug, Clone, Template)]
#[template(path = "product.txt")]
pub struct ProductDetailView {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub condition: Option<String>,
    pub in_stock: bool,
    pub price: String,
    pub original_price: Option<String>,
    pub discount: Option<String>,
    pub stock_line: String,
    pub image: Option<String>,
    pub signed_in: bool,
    /// `1-N` when the product can be added.
    pub quantity_choices: Option<String>,
}

impl ProductDetailView {
    #[must_use]
    pub fn new(product: &Product, app: &App) -> Self {
        let level = product.stock_level();
        let choices = product.quantity_choices();
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            description: product.description.clone(),
            condition: product.condition_description.clone(),
            in_stock: level.in_stock(),
            price: product.price.display(),
            original_price: product.original_price.map(|p| p.display()),
            discount: discount_badge(product),
            stock_line: stock_line(level),
            image: product.image_path().map(|path| app.config.asset(&path)),
            signed_in: app.session.is_authenticated(),
            quantity_choices: (!choices.is_empty())
                .then(|| format!("{}-{}", choices.start(), choices.end())),
        }
    }
}

fn stock_line(level: StockLevel) -> String {
    match level {
        StockLevel::OutOfStock => "Available: 0 units (out of stock)".to_owned(),
        StockLevel::Low(n) => format!("Available: {n} units (last units!)"),
        StockLevel::Available(n) => format!("Available: {n} units"),
    }
}

/// Fetch one product.
///
/// # Errors
///
/// Returns `ViewError::Api` after raising "Product not found".
#[instrument(skip(app))]
pub async fn load(app: &App, id: ProductId) -> Result<ProductDetailView, ViewError> {
    let product = fetch(app, id).await?;
    Ok(ProductDetailView::new(&product, app))
}

async fn fetch(app: &App, id: ProductId) -> Result<Product, ViewError> {
    app.api
        .product(id)
        .await
        .map_err(|e| report(app, e, "Product not found"))
}

/// Put `quantity` units of a product in the cart.
///
/// Signed out, heads to the login route without calling the backend. The
/// quantity must be one the page would offer: `1..=min(10, stock)`.
///
/// # Errors
///
/// `LoginRequired`, `Invalid` for an out-of-range quantity, or `Api`.
#[instrument(skip(app))]
pub async fn add_to_cart(app: &App, id: ProductId, quantity: u32) -> Result<(), ViewError> {
    require_login(app)?;
    app.navigator.navigate(Route::Product(id));

    let product = fetch(app, id).await?;
    if !product.stock_level().in_stock() {
        return Err(invalid(app, "Product out of stock"));
    }
    let choices = product.quantity_choices();
    if !choices.contains(&quantity) {
        return Err(invalid(
            app,
            format!(
                "Quantity must be between {} and {}",
                choices.start(),
                choices.end()
            ),
        ));
    }

    app.cart
        .add_to_cart(id, quantity)
        .await
        .map_err(|e| report(app, e, "Failed to add product to cart"))?;
    app.notifications.show_success("Product added to cart!");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use reqwest::StatusCode;
    use scuffmart_client::NotificationKind;
    use scuffmart_client::api::mock::{ApiCall, MockApi};
    use scuffmart_core::Role;

    use super::*;
    use crate::views::testing;

    #[tokio::test]
    async fn test_detail_renders_quantity_range() {
        let api = MockApi::new().with_products(vec![testing::product(7, "Chair", 4500, 25)]);
        let (app, _) = testing::app("detail", api, Some(Role::Client));

        let text = load(&app, ProductId::new(7)).await.unwrap().render().unwrap();
        assert!(text.contains("Price: R$ 45.00"));
        assert!(text.contains("Available: 25 units"));
        assert!(text.contains("quantity from 1-10"));
    }

    #[tokio::test]
    async fn test_detail_out_of_stock_signed_out() {
        let api = MockApi::new().with_products(vec![testing::product(7, "Chair", 4500, 0)]);
        let (app, _) = testing::app("detail-oos", api, None);

        let text = load(&app, ProductId::new(7)).await.unwrap().render().unwrap();
        assert!(text.contains("OUT OF STOCK"));
        assert!(text.contains("Log in to add products"));
    }

    #[tokio::test]
    async fn test_add_requires_login() {
        let (app, api) = testing::app("add-anon", MockApi::new(), None);

        let result = add_to_cart(&app, ProductId::new(7), 1).await;

        assert!(matches!(result, Err(ViewError::LoginRequired)));
        assert_eq!(app.navigator.current(), Route::Login);
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_add_rejects_quantity_over_stock() {
        let api = MockApi::new().with_products(vec![testing::product(7, "Chair", 4500, 3)]);
        let (app, api) = testing::app("add-range", api, Some(Role::Client));

        let result = add_to_cart(&app, ProductId::new(7), 4).await;

        assert!(matches!(result, Err(ViewError::Invalid(_))));
        assert_eq!(api.count("add_to_cart"), 0);
        assert_eq!(app.notifications.active()[0].kind, NotificationKind::Error);
    }

    #[tokio::test]
    async fn test_add_then_single_refresh() {
        let api = MockApi::new().with_products(vec![testing::product(7, "Chair", 4500, 25)]);
        let (app, api) = testing::app("add-ok", api, Some(Role::Client));

        add_to_cart(&app, ProductId::new(7), 2).await.unwrap();

        let calls = api.calls();
        assert_eq!(
            &calls[1..],
            &[ApiCall::AddToCart(ProductId::new(7), 2), ApiCall::Cart]
        );
        assert_eq!(app.notifications.active()[0].text, "Product added to cart!");
    }

    #[tokio::test]
    async fn test_add_shows_server_message() {
        let api = MockApi::new().with_products(vec![testing::product(7, "Chair", 4500, 25)]);
        api.fail(
            "add_to_cart",
            StatusCode::BAD_REQUEST,
            Some("Only 1 left in stock"),
        );
        let (app, _) = testing::app("add-msg", api, Some(Role::Client));

        assert!(add_to_cart(&app, ProductId::new(7), 2).await.is_err());
        assert_eq!(app.notifications.active()[0].text, "Only 1 left in stock");
    }
}
