//! Cart page: lines, totals, quantity edits and checkout.

use askama::Template;
use scuffmart_client::api::CheckoutOutcome;
use scuffmart_client::{App, Route};
use scuffmart_core::{CartItem, ProductId};
use tracing::instrument;

use crate::error::ViewError;
use crate::views::{invalid, report, require_login};

#[derive(Debug, Clone)]
pub struct CartLineView {
    pub product_id: String,
    pub name: String,
    pub quantity: u32,
    pub unit_price: String,
    pub line_total: String,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Template)]
#[template(path = "cart.txt")]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub item_count: u32,
    pub subtotal: String,
    /// Shipping is always free, so the total equals the subtotal.
    pub total: String,
}

impl CartView {
    /// Render the cart store's current lines.
    #[must_use]
    pub fn new(app: &App) -> Self {
        let subtotal = app.cart.total_price().display();
        Self {
            lines: app
                .cart
                .items()
                .iter()
                .map(|item| line_view(item, app))
                .collect(),
            item_count: app.cart.cart_count(),
            total: subtotal.clone(),
            subtotal,
        }
    }
}

fn line_view(item: &CartItem, app: &App) -> CartLineView {
    CartLineView {
        product_id: item.product_id.to_string(),
        name: item.name.clone(),
        quantity: item.quantity,
        unit_price: item.price.display(),
        line_total: item.line_total().display(),
        image: item.image_path().map(|path| app.config.asset(&path)),
    }
}

/// Fetch and show the cart.
///
/// # Errors
///
/// `LoginRequired` when signed out, `Api` when the fetch fails.
#[instrument(skip(app))]
pub async fn load(app: &App) -> Result<CartView, ViewError> {
    require_login(app)?;
    app.navigator.navigate(Route::Cart);
    app.cart
        .refresh_cart()
        .await
        .map_err(|e| report(app, e, "Failed to load cart"))?;
    Ok(CartView::new(app))
}

/// Change a line's quantity. Zero or less removes the line.
///
/// # Errors
///
/// `LoginRequired`, `Invalid` for an absurd quantity, or `Api`.
#[instrument(skip(app))]
pub async fn set_quantity(app: &App, product_id: ProductId, quantity: i64) -> Result<(), ViewError> {
    if quantity <= 0 {
        return remove(app, product_id).await;
    }
    require_login(app)?;
    let quantity = u32::try_from(quantity).map_err(|_| invalid(app, "Quantity is too large"))?;

    app.cart
        .update_cart_item(product_id, quantity)
        .await
        .map_err(|e| report(app, e, "Failed to update quantity"))?;
    Ok(())
}

/// Drop a line from the cart.
///
/// # Errors
///
/// `LoginRequired` or `Api`.
#[instrument(skip(app))]
pub async fn remove(app: &App, product_id: ProductId) -> Result<(), ViewError> {
    require_login(app)?;
    app.cart
        .remove_from_cart(product_id)
        .await
        .map_err(|e| report(app, e, "Failed to remove item"))?;
    Ok(())
}

/// Turn the cart into an order, then show the orders page.
///
/// An empty cart is refused without calling the backend. On success the cart
/// is re-fetched, since the backend emptied it.
///
/// # Errors
///
/// `LoginRequired`, `Invalid` for an empty cart, or `Api`.
#[instrument(skip(app))]
pub async fn checkout(app: &App) -> Result<(), ViewError> {
    require_login(app)?;
    app.cart
        .refresh_cart()
        .await
        .map_err(|e| report(app, e, "Failed to load cart"))?;
    if app.cart.items().is_empty() {
        return Err(invalid(app, "Your cart is empty"));
    }

    let outcome = app
        .api
        .checkout()
        .await
        .map_err(|e| report(app, e, "Failed to place order"))?;
    match outcome {
        CheckoutOutcome::Placed(order) => {
            tracing::info!(order_id = %order.id, total = %order.total, "Order placed");
            app.notifications
                .show_success(format!("Order #{} placed successfully!", order.id));
        }
        CheckoutOutcome::Acknowledged(_) => {
            app.notifications.show_success("Order placed successfully!");
        }
    }

    if let Err(e) = app.cart.refresh_cart().await {
        tracing::warn!(error = %e, "Failed to refresh cart after checkout");
    }
    app.navigator.navigate(Route::Orders);
    Ok(())
}
