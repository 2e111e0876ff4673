//! Order history. Shoppers see their own orders, admins see everyone's.

use askama::Template;
use scuffmart_client::{App, Route};
use scuffmart_core::Order;
use tracing::instrument;

use crate::error::ViewError;
use crate::views::{report, require_login};

#[derive(Debug, Clone)]
pub struct OrderLineView {
    pub name: String,
    pub quantity: u32,
    pub price: String,
}

#[derive(Debug, Clone)]
pub struct OrderRow {
    pub id: String,
    pub date: String,
    pub status: String,
    pub total: String,
    /// `Name <email>`, shown to admins only.
    pub customer: Option<String>,
    pub items: Vec<OrderLineView>,
}

impl OrderRow {
    fn new(order: &Order, with_customer: bool) -> Self {
        let customer = with_customer.then(|| customer_label(order));
        Self {
            id: order.id.to_string(),
            date: order.created_at.display(),
            status: order.status.label().to_owned(),
            total: order.total.display(),
            customer,
            items: order
                .items
                .iter()
                .map(|item| OrderLineView {
                    name: item.name.clone(),
                    quantity: item.quantity,
                    price: item.price.display(),
                })
                .collect(),
        }
    }
}

fn customer_label(order: &Order) -> String {
    match (&order.user_name, &order.user_email) {
        (Some(name), Some(email)) => format!("{name} <{email}>"),
        (Some(name), None) => name.clone(),
        (None, Some(email)) => email.clone(),
        (None, None) => format!("user #{}", order.user_id),
    }
}

#[derive(Debug, Clone, Template)]
#[template(path = "orders.txt")]
pub struct OrdersView {
    pub title: String,
    pub orders: Vec<OrderRow>,
}

impl OrdersView {
    /// Build the listing; `admin` switches the title and adds customers.
    #[must_use]
    pub fn new(orders: &[Order], admin: bool) -> Self {
        Self {
            title: if admin { "All orders" } else { "My orders" }.to_owned(),
            orders: orders.iter().map(|o| OrderRow::new(o, admin)).collect(),
        }
    }
}

/// Fetch and show the signed-in user's orders (all orders for admins).
///
/// # Errors
///
/// `LoginRequired` when signed out, `Api` when the fetch fails.
#[instrument(skip(app))]
pub async fn load(app: &App) -> Result<OrdersView, ViewError> {
    require_login(app)?;
    app.navigator.navigate(Route::Orders);
    fetch(app).await
}

pub(crate) async fn fetch(app: &App) -> Result<OrdersView, ViewError> {
    let orders = app
        .api
        .orders()
        .await
        .map_err(|e| report(app, e, "Failed to load orders"))?;
    Ok(OrdersView::new(&orders, app.session.is_admin()))
}
