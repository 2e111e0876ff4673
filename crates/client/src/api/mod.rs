//! Commerce backend API.
//!
//! # Architecture
//!
//! - [`CommerceApi`] is the seam every store and view depends on
//! - [`HttpApi`] is the `reqwest` implementation used in production
//! - `mock::MockApi` (tests and the `test-util` feature) records calls and
//!   replays canned responses
//!
//! The backend owns all durable state. Mutating endpoints answer with a
//! small acknowledgement ([`Ack`]); callers re-fetch whatever they display.

mod http;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;

use std::path::Path;

use async_trait::async_trait;
use scuffmart_core::{
    CartSnapshot, Email, Order, OrderId, OrderStatus, Price, Product, ProductId, User,
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use http::HttpApi;

/// Body of `POST /auth/login` and `POST /auth/register`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
}

/// Body of `GET /auth/me`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeResponse {
    pub user: User,
}

/// Acknowledgement returned by mutating endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub message: Option<String>,
}

impl Ack {
    /// Decode a mutation response body.
    ///
    /// Empty bodies and bodies without a string `message` field (created
    /// entities, `true`, ...) are acknowledgements without a message.
    #[must_use]
    pub fn from_body(body: &str) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|value| {
                value
                    .get("message")
                    .and_then(serde_json::Value::as_str)
                    .map(str::to_owned)
            });
        Self { message }
    }
}

/// Body of `POST /orders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CheckoutOutcome {
    /// The created order.
    Placed(Box<Order>),
    /// Any other acknowledgement.
    Acknowledged(Ack),
}

/// An image attached to a product form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// Read an image file from disk.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the file cannot be read.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map_or_else(|| "image".to_owned(), |n| n.to_string_lossy().into_owned());
        let content_type = content_type_for(path).to_owned();
        Ok(Self {
            file_name,
            content_type,
            bytes,
        })
    }
}

fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "avif" => "image/avif",
        _ => "application/octet-stream",
    }
}

/// Fields of the admin product form, sent as multipart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductForm {
    pub name: String,
    pub description: Option<String>,
    pub price: Price,
    pub original_price: Option<Price>,
    pub condition_description: Option<String>,
    pub stock: u32,
    pub image: Option<ImageUpload>,
}

impl ProductForm {
    /// Prefill the form from an existing product (no image).
    #[must_use]
    pub fn from_product(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price,
            original_price: product.original_price,
            condition_description: product.condition_description.clone(),
            stock: product.stock,
            image: None,
        }
    }

    /// Text fields in wire order. Absent optional values are sent empty.
    #[must_use]
    pub fn text_fields(&self) -> [(&'static str, String); 6] {
        [
            ("name", self.name.clone()),
            ("description", self.description.clone().unwrap_or_default()),
            ("price", self.price.amount().to_string()),
            (
                "original_price",
                self.original_price
                    .map(|p| p.amount().to_string())
                    .unwrap_or_default(),
            ),
            (
                "condition_description",
                self.condition_description.clone().unwrap_or_default(),
            ),
            ("stock", self.stock.to_string()),
        ]
    }
}

/// Operations offered by the commerce backend.
#[async_trait]
pub trait CommerceApi: Send + Sync {
    /// `POST /auth/login`
    async fn login(&self, email: &Email, password: &SecretString) -> Result<AuthResponse>;

    /// `POST /auth/register`
    async fn register(
        &self,
        name: &str,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthResponse>;

    /// `GET /auth/me`
    async fn me(&self) -> Result<User>;

    /// `GET /products`
    async fn products(&self) -> Result<Vec<Product>>;

    /// `GET /products/:id`
    async fn product(&self, id: ProductId) -> Result<Product>;

    /// `POST /products` (multipart)
    async fn create_product(&self, form: &ProductForm) -> Result<Ack>;

    /// `PUT /products/:id` (multipart)
    async fn update_product(&self, id: ProductId, form: &ProductForm) -> Result<Ack>;

    /// `DELETE /products/:id`
    async fn delete_product(&self, id: ProductId) -> Result<Ack>;

    /// `PUT /products/:id/stock`
    async fn update_stock(&self, id: ProductId, stock: u32) -> Result<Ack>;

    /// `GET /cart`
    async fn cart(&self) -> Result<CartSnapshot>;

    /// `POST /cart/add`
    async fn add_to_cart(&self, product_id: ProductId, quantity: u32) -> Result<Ack>;

    /// `PUT /cart/update`
    async fn update_cart_item(&self, product_id: ProductId, quantity: u32) -> Result<Ack>;

    /// `DELETE /cart/remove` (body-carrying)
    async fn remove_from_cart(&self, product_id: ProductId) -> Result<Ack>;

    /// `GET /orders`
    async fn orders(&self) -> Result<Vec<Order>>;

    /// `POST /orders`: turns the current cart into an order.
    async fn checkout(&self) -> Result<CheckoutOutcome>;

    /// `PUT /orders/:id/status`
    async fn update_order_status(&self, id: OrderId, status: OrderStatus) -> Result<Ack>;
}
