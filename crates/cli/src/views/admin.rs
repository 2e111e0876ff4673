//! Admin console: product management and order status updates.
//!
//! Every entry point checks the admin role first. Non-admins are sent home
//! with an error. Every successful mutation re-fetches the full listing it
//! changed and returns it.

use std::path::PathBuf;
use std::str::FromStr;

use askama::Template;
use scuffmart_client::api::{ImageUpload, ProductForm};
use scuffmart_client::{App, Route};
use scuffmart_core::{OrderId, OrderStatus, Price, Product, ProductId};
use tracing::instrument;

use crate::error::ViewError;
use crate::views::orders::{self, OrdersView};
use crate::views::products::stock_label;
use crate::views::{invalid, report};

/// Fail with `Forbidden` (and head home) unless signed in as an admin.
pub fn require_admin(app: &App) -> Result<(), ViewError> {
    if app.session.is_admin() {
        return Ok(());
    }
    app.navigator.navigate(Route::Home);
    app.notifications.show_error("Admin access required");
    Err(ViewError::Forbidden)
}

// =============================================================================
// Products
// =============================================================================

#[derive(Debug, Clone)]
pub struct AdminProductRow {
    pub id: String,
    pub name: String,
    pub price: String,
    pub stock: u32,
    pub stock_label: String,
}

impl From<&Product> for AdminProductRow {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            price: product.price.display(),
            stock: product.stock,
            stock_label: stock_label(product.stock_level()),
        }
    }
}

#[derive(Debug, Clone, Template)]
#[template(path = "admin_products.txt")]
pub struct AdminProductsView {
    pub products: Vec<AdminProductRow>,
}

/// Raw product form input, as typed by the operator.
///
/// `None` leaves a field unchanged on update (and empty on create). An empty
/// string clears an optional field.
#[derive(Debug, Clone, Default)]
pub struct ProductInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
    pub original_price: Option<String>,
    pub condition_description: Option<String>,
    pub stock: Option<String>,
    pub image: Option<PathBuf>,
}

impl ProductInput {
    /// Write the given fields over `form`.
    fn apply(self, form: &mut ProductForm) -> Result<(), String> {
        if let Some(name) = self.name {
            let name = name.trim();
            if name.is_empty() {
                return Err("Name is required".to_owned());
            }
            name.clone_into(&mut form.name);
        }
        if let Some(description) = self.description {
            form.description = non_empty(description);
        }
        if let Some(price) = self.price {
            form.price = parse_price(&price)?;
        }
        if let Some(original) = self.original_price {
            form.original_price = non_empty(original)
                .map(|raw| parse_price(&raw))
                .transpose()?;
        }
        if let Some(condition) = self.condition_description {
            form.condition_description = non_empty(condition);
        }
        if let Some(stock) = self.stock {
            form.stock = parse_stock(&stock)?;
        }
        Ok(())
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

fn parse_price(raw: &str) -> Result<Price, String> {
    Price::from_str(raw.trim())
        .ok()
        .filter(|price| price.amount().is_sign_positive())
        .ok_or_else(|| format!("Invalid price: {raw}"))
}

/// Stock must be a non-negative integer.
pub fn parse_stock(raw: &str) -> Result<u32, String> {
    raw.trim()
        .parse::<u32>()
        .map_err(|_| "Stock must be a non-negative integer".to_owned())
}

fn read_image(path: Option<PathBuf>) -> Result<Option<ImageUpload>, ViewError> {
    path.map(|path| {
        ImageUpload::from_path(&path).map_err(|source| ViewError::Image { path, source })
    })
    .transpose()
}

/// List every product.
///
/// # Errors
///
/// `Forbidden` for non-admins, `Api` when the fetch fails.
#[instrument(skip(app))]
pub async fn products(app: &App) -> Result<AdminProductsView, ViewError> {
    require_admin(app)?;
    app.navigator.navigate(Route::AdminProducts);
    fetch_products(app).await
}

async fn fetch_products(app: &App) -> Result<AdminProductsView, ViewError> {
    let products = app
        .api
        .products()
        .await
        .map_err(|e| report(app, e, "Failed to load products"))?;
    Ok(AdminProductsView {
        products: products.iter().map(AdminProductRow::from).collect(),
    })
}

/// Create a product. Name and price are required.
///
/// # Errors
///
/// `Forbidden`, `Invalid` for bad input, `Image` if the file is unreadable,
/// or `Api`.
#[instrument(skip(app, input))]
pub async fn create_product(app: &App, input: ProductInput) -> Result<AdminProductsView, ViewError> {
    require_admin(app)?;
    if input.name.is_none() {
        return Err(invalid(app, "Name is required"));
    }
    if input.price.is_none() {
        return Err(invalid(app, "Price is required"));
    }

    let mut form = ProductForm {
        name: String::new(),
        description: None,
        price: Price::ZERO,
        original_price: None,
        condition_description: None,
        stock: 0,
        image: None,
    };
    let image = input.image.clone();
    input.apply(&mut form).map_err(|message| invalid(app, message))?;
    form.image = read_image(image)?;

    app.api
        .create_product(&form)
        .await
        .map_err(|e| report(app, e, "Failed to save product"))?;
    app.notifications.show_success("Product created!");
    fetch_products(app).await
}

/// Edit a product. Fields absent from `input` keep their current values.
///
/// # Errors
///
/// `Forbidden`, `Invalid` for bad input, `Image` if the file is unreadable,
/// or `Api`.
#[instrument(skip(app, input))]
pub async fn update_product(
    app: &App,
    id: ProductId,
    input: ProductInput,
) -> Result<AdminProductsView, ViewError> {
    require_admin(app)?;
    let current = app
        .api
        .product(id)
        .await
        .map_err(|e| report(app, e, "Product not found"))?;

    let mut form = ProductForm::from_product(&current);
    let image = input.image.clone();
    input.apply(&mut form).map_err(|message| invalid(app, message))?;
    form.image = read_image(image)?;

    app.api
        .update_product(id, &form)
        .await
        .map_err(|e| report(app, e, "Failed to save product"))?;
    app.notifications.show_success("Product updated!");
    fetch_products(app).await
}

/// Delete a product.
///
/// # Errors
///
/// `Forbidden` or `Api`.
#[instrument(skip(app))]
pub async fn delete_product(app: &App, id: ProductId) -> Result<AdminProductsView, ViewError> {
    require_admin(app)?;
    app.api
        .delete_product(id)
        .await
        .map_err(|e| report(app, e, "Failed to delete product"))?;
    app.notifications.show_success("Product deleted!");
    fetch_products(app).await
}

/// Set a product's stock from operator input.
///
/// # Errors
///
/// `Forbidden`, `Invalid` unless `raw` is a non-negative integer, or `Api`.
#[instrument(skip(app))]
pub async fn update_stock(app: &App, id: ProductId, raw: &str) -> Result<AdminProductsView, ViewError> {
    require_admin(app)?;
    let stock = parse_stock(raw).map_err(|message| invalid(app, message))?;
    app.api
        .update_stock(id, stock)
        .await
        .map_err(|e| report(app, e, "Failed to update stock"))?;
    app.notifications.show_success("Stock updated!");
    fetch_products(app).await
}

// =============================================================================
// Orders
// =============================================================================

/// List every order with its customer.
///
/// # Errors
///
/// `Forbidden` for non-admins, `Api` when the fetch fails.
#[instrument(skip(app))]
pub async fn orders(app: &App) -> Result<OrdersView, ViewError> {
    require_admin(app)?;
    app.navigator.navigate(Route::AdminOrders);
    orders::fetch(app).await
}

/// Move an order to another status.
///
/// The backend decides whether the transition is allowed and may describe
/// side effects (stock returned, ...) in its message, which is shown as is.
///
/// # Errors
///
/// `Forbidden`, `Invalid` for an unknown status, or `Api`.
#[instrument(skip(app))]
pub async fn update_order_status(app: &App, id: OrderId, raw: &str) -> Result<OrdersView, ViewError> {
    require_admin(app)?;
    let status = OrderStatus::from_str(raw).map_err(|message| invalid(app, message))?;

    let ack = app
        .api
        .update_order_status(id, status)
        .await
        .map_err(|e| report(app, e, "Failed to update order status"))?;
    app.notifications.show_success(
        ack.message
            .unwrap_or_else(|| "Order status updated!".to_owned()),
    );
    orders::fetch(app).await
}
