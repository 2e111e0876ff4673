//! In-memory [`CommerceApi`] for tests.
//!
//! Records every call in order and answers from canned data. Failures are
//! injected per operation and persist until cleared.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::StatusCode;
use scuffmart_core::{
    CartSnapshot, Email, Order, OrderId, OrderStatus, Product, ProductId, User,
};
use secrecy::SecretString;

use super::{Ack, AuthResponse, CheckoutOutcome, CommerceApi, ProductForm};
use crate::error::{ApiError, Result};

/// A recorded call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    Login(Email),
    Register(Email),
    Me,
    Products,
    Product(ProductId),
    CreateProduct(ProductForm),
    UpdateProduct(ProductId, ProductForm),
    DeleteProduct(ProductId),
    UpdateStock(ProductId, u32),
    Cart,
    AddToCart(ProductId, u32),
    UpdateCartItem(ProductId, u32),
    RemoveFromCart(ProductId),
    Orders,
    Checkout,
    UpdateOrderStatus(OrderId, OrderStatus),
}

impl ApiCall {
    /// Operation name used to key injected failures.
    #[must_use]
    pub const fn operation(&self) -> &'static str {
        match self {
            Self::Login(_) => "login",
            Self::Register(_) => "register",
            Self::Me => "me",
            Self::Products => "products",
            Self::Product(_) => "product",
            Self::CreateProduct(_) => "create_product",
            Self::UpdateProduct(..) => "update_product",
            Self::DeleteProduct(_) => "delete_product",
            Self::UpdateStock(..) => "update_stock",
            Self::Cart => "cart",
            Self::AddToCart(..) => "add_to_cart",
            Self::UpdateCartItem(..) => "update_cart_item",
            Self::RemoveFromCart(_) => "remove_from_cart",
            Self::Orders => "orders",
            Self::Checkout => "checkout",
            Self::UpdateOrderStatus(..) => "update_order_status",
        }
    }
}

/// Recording fake backend.
#[derive(Debug, Default)]
pub struct MockApi {
    calls: Mutex<Vec<ApiCall>>,
    failures: Mutex<HashMap<&'static str, (StatusCode, Option<String>)>>,
    auth: Mutex<Option<AuthResponse>>,
    products: Mutex<Vec<Product>>,
    orders: Mutex<Vec<Order>>,
    /// Cart answers in order; the last one repeats.
    carts: Mutex<VecDeque<CartSnapshot>>,
    acks: Mutex<HashMap<&'static str, Ack>>,
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

impl MockApi {
    /// An empty backend: no products, orders or cart lines.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `login`/`register` with this user and token.
    #[must_use]
    pub fn with_auth(self, user: User, token: &str) -> Self {
        *lock(&self.auth) = Some(AuthResponse {
            user,
            token: token.to_owned(),
        });
        self
    }

    /// Answer `products`/`product` from this catalog.
    #[must_use]
    pub fn with_products(self, products: Vec<Product>) -> Self {
        *lock(&self.products) = products;
        self
    }

    /// Answer `orders` with these orders.
    #[must_use]
    pub fn with_orders(self, orders: Vec<Order>) -> Self {
        *lock(&self.orders) = orders;
        self
    }

    /// Queue a `cart` answer.
    #[must_use]
    pub fn with_cart(self, snapshot: CartSnapshot) -> Self {
        self.push_cart(snapshot);
        self
    }

    /// Queue a `cart` answer on a shared mock.
    pub fn push_cart(&self, snapshot: CartSnapshot) {
        lock(&self.carts).push_back(snapshot);
    }

    /// Acknowledge `operation` with a message.
    pub fn ack_with(&self, operation: &'static str, message: &str) {
        lock(&self.acks).insert(
            operation,
            Ack {
                message: Some(message.to_owned()),
            },
        );
    }

    /// Make `operation` fail with `status` and an optional server message.
    pub fn fail(&self, operation: &'static str, status: StatusCode, message: Option<&str>) {
        lock(&self.failures).insert(operation, (status, message.map(str::to_owned)));
    }

    /// Stop failing `operation`.
    pub fn succeed(&self, operation: &'static str) {
        lock(&self.failures).remove(operation);
    }

    /// Every call so far, oldest first.
    #[must_use]
    pub fn calls(&self) -> Vec<ApiCall> {
        lock(&self.calls).clone()
    }

    /// Number of calls to `operation`.
    #[must_use]
    pub fn count(&self, operation: &str) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|c| c.operation() == operation)
            .count()
    }

    /// Forget recorded calls.
    pub fn reset_calls(&self) {
        lock(&self.calls).clear();
    }

    fn record(&self, call: ApiCall) -> Result<()> {
        let operation = call.operation();
        lock(&self.calls).push(call);
        match lock(&self.failures).get(operation) {
            Some((StatusCode::UNAUTHORIZED, _)) => Err(ApiError::Unauthorized),
            Some((status, message)) => Err(ApiError::Rejected {
                status: *status,
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }

    fn ack(&self, operation: &'static str) -> Ack {
        lock(&self.acks).get(operation).cloned().unwrap_or_default()
    }

    fn auth_response(&self) -> Result<AuthResponse> {
        lock(&self.auth).clone().ok_or(ApiError::Rejected {
            status: StatusCode::UNAUTHORIZED,
            message: Some("Invalid credentials".to_owned()),
        })
    }

    fn not_found(what: &str) -> ApiError {
        ApiError::Rejected {
            status: StatusCode::NOT_FOUND,
            message: Some(format!("{what} not found")),
        }
    }
}

#[async_trait]
impl CommerceApi for MockApi {
    async fn login(&self, email: &Email, _password: &SecretString) -> Result<AuthResponse> {
        self.record(ApiCall::Login(email.clone()))?;
        self.auth_response()
    }

    async fn register(
        &self,
        _name: &str,
        email: &Email,
        _password: &SecretString,
    ) -> Result<AuthResponse> {
        self.record(ApiCall::Register(email.clone()))?;
        self.auth_response()
    }

    async fn me(&self) -> Result<User> {
        self.record(ApiCall::Me)?;
        self.auth_response().map(|auth| auth.user)
    }

    async fn products(&self) -> Result<Vec<Product>> {
        self.record(ApiCall::Products)?;
        Ok(lock(&self.products).clone())
    }

    async fn product(&self, id: ProductId) -> Result<Product> {
        self.record(ApiCall::Product(id))?;
        lock(&self.products)
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| Self::not_found("Product"))
    }

    async fn create_product(&self, form: &ProductForm) -> Result<Ack> {
        self.record(ApiCall::CreateProduct(form.clone()))?;
        Ok(self.ack("create_product"))
    }

    async fn update_product(&self, id: ProductId, form: &ProductForm) -> Result<Ack> {
        self.record(ApiCall::UpdateProduct(id, form.clone()))?;
        Ok(self.ack("update_product"))
    }

    async fn delete_product(&self, id: ProductId) -> Result<Ack> {
        self.record(ApiCall::DeleteProduct(id))?;
        Ok(self.ack("delete_product"))
    }

    async fn update_stock(&self, id: ProductId, stock: u32) -> Result<Ack> {
        self.record(ApiCall::UpdateStock(id, stock))?;
        Ok(self.ack("update_stock"))
    }

    async fn cart(&self) -> Result<CartSnapshot> {
        self.record(ApiCall::Cart)?;
        let mut carts = lock(&self.carts);
        let snapshot = if carts.len() > 1 {
            carts.pop_front()
        } else {
            carts.front().cloned()
        };
        Ok(snapshot.unwrap_or_else(|| CartSnapshot::Items(Vec::new())))
    }

    async fn add_to_cart(&self, product_id: ProductId, quantity: u32) -> Result<Ack> {
        self.record(ApiCall::AddToCart(product_id, quantity))?;
        Ok(self.ack("add_to_cart"))
    }

    async fn update_cart_item(&self, product_id: ProductId, quantity: u32) -> Result<Ack> {
        self.record(ApiCall::UpdateCartItem(product_id, quantity))?;
        Ok(self.ack("update_cart_item"))
    }

    async fn remove_from_cart(&self, product_id: ProductId) -> Result<Ack> {
        self.record(ApiCall::RemoveFromCart(product_id))?;
        Ok(self.ack("remove_from_cart"))
    }

    async fn orders(&self) -> Result<Vec<Order>> {
        self.record(ApiCall::Orders)?;
        Ok(lock(&self.orders).clone())
    }

    async fn checkout(&self) -> Result<CheckoutOutcome> {
        self.record(ApiCall::Checkout)?;
        Ok(CheckoutOutcome::Acknowledged(self.ack("checkout")))
    }

    async fn update_order_status(&self, id: OrderId, status: OrderStatus) -> Result<Ack> {
        self.record(ApiCall::UpdateOrderStatus(id, status))?;
        Ok(self.ack("update_order_status"))
    }
}
