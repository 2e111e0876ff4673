//! Server-owned shopping cart mirrored in memory.
//!
//! The backend is the only source of truth. Every mutation is followed by a
//! full re-fetch, so the local copy never diverges for longer than one
//! request.

use std::sync::Arc;

use scuffmart_core::{CartItem, Price, ProductId, UserId, cart_count, cart_total};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::instrument;

use crate::api::{Ack, CommerceApi};
use crate::error::{ApiError, Result};
use crate::notifications::NotificationStore;
use crate::session::SessionStore;

/// What the cart store publishes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartState {
    pub items: Vec<CartItem>,
    /// A fetch is in flight.
    pub loading: bool,
    /// Account the items were fetched for. Items whose owner is no longer
    /// signed in are stale and never read back.
    pub owner: Option<UserId>,
}

/// Shared cart store.
///
/// Cheap to clone; all clones share one cart.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<CartStoreInner>,
}

struct CartStoreInner {
    api: Arc<dyn CommerceApi>,
    session: SessionStore,
    notifications: NotificationStore,
    state: watch::Sender<CartState>,
}

impl CartStore {
    #[must_use]
    pub fn new(
        api: Arc<dyn CommerceApi>,
        session: SessionStore,
        notifications: NotificationStore,
    ) -> Self {
        let (state, _) = watch::channel(CartState::default());
        Self {
            inner: Arc::new(CartStoreInner {
                api,
                session,
                notifications,
                state,
            }),
        }
    }

    /// Replace the local cart with the backend's.
    ///
    /// Signed out, the cart is emptied without a request. Lines the backend
    /// dropped for lack of stock are reported in a single warning.
    ///
    /// # Errors
    ///
    /// Returns the backend error. The previous items are kept, except on
    /// `Unauthorized`, which empties the cart.
    #[instrument(skip(self))]
    pub async fn refresh_cart(&self) -> Result<()> {
        let Some(owner) = self.inner.session.user_id() else {
            self.clear();
            return Ok(());
        };

        self.inner.state.send_modify(|state| state.loading = true);
        let (items, removed) = match self.inner.api.cart().await {
            Ok(snapshot) => snapshot.into_parts(),
            Err(ApiError::Unauthorized) => {
                self.clear();
                return Err(ApiError::Unauthorized);
            }
            Err(e) => {
                self.inner.state.send_modify(|state| state.loading = false);
                return Err(e);
            }
        };

        if !removed.is_empty() {
            tracing::info!(removed = ?removed, "Backend dropped out-of-stock cart lines");
            self.inner.notifications.show_warning(format!(
                "Removed from your cart (out of stock): {}",
                removed.join(", ")
            ));
        }

        tracing::debug!(lines = items.len(), "Cart refreshed");
        self.inner.state.send_modify(|state| {
            state.items = items;
            state.loading = false;
            state.owner = Some(owner);
        });
        Ok(())
    }

    /// Drop every line.
    fn clear(&self) {
        self.inner.state.send_if_modified(|state| {
            let changed = !state.items.is_empty() || state.loading || state.owner.is_some();
            state.items.clear();
            state.loading = false;
            state.owner = None;
            changed
        });
    }

    /// Add `quantity` of a product, then re-fetch.
    ///
    /// # Errors
    ///
    /// Returns the backend error; no re-fetch happens.
    #[instrument(skip(self))]
    pub async fn add_to_cart(&self, product_id: ProductId, quantity: u32) -> Result<Ack> {
        let ack = self.inner.api.add_to_cart(product_id, quantity).await?;
        self.resync().await;
        Ok(ack)
    }

    /// Set a line's quantity, then re-fetch.
    ///
    /// # Errors
    ///
    /// Returns the backend error; no re-fetch happens.
    #[instrument(skip(self))]
    pub async fn update_cart_item(&self, product_id: ProductId, quantity: u32) -> Result<Ack> {
        let ack = self
            .inner
            .api
            .update_cart_item(product_id, quantity)
            .await?;
        self.resync().await;
        Ok(ack)
    }

    /// Remove a line, then re-fetch.
    ///
    /// # Errors
    ///
    /// Returns the backend error; no re-fetch happens.
    #[instrument(skip(self))]
    pub async fn remove_from_cart(&self, product_id: ProductId) -> Result<Ack> {
        let ack = self.inner.api.remove_from_cart(product_id).await?;
        self.resync().await;
        Ok(ack)
    }

    /// Follow-up fetch after a mutation. The mutation already succeeded, so
    /// a failure here is only logged.
    pub(crate) async fn resync(&self) {
        if let Err(e) = self.refresh_cart().await {
            tracing::warn!(error = %e, "Failed to refresh cart");
        }
    }

    /// Run `f` over the lines that belong to the signed-in user; a cart
    /// fetched for anyone else (or for nobody) reads as empty.
    fn with_items<T>(&self, f: impl FnOnce(&[CartItem]) -> T) -> T {
        let state = self.inner.state.borrow();
        let current = self.inner.session.user_id();
        if state.owner.is_some() && state.owner == current {
            f(&state.items)
        } else {
            f(&[])
        }
    }

    /// Current lines.
    #[must_use]
    pub fn items(&self) -> Vec<CartItem> {
        self.with_items(<[CartItem]>::to_vec)
    }

    /// Total quantity across lines.
    #[must_use]
    pub fn cart_count(&self) -> u32 {
        self.with_items(cart_count)
    }

    /// Total price across lines.
    #[must_use]
    pub fn total_price(&self) -> Price {
        self.with_items(cart_total)
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.inner.state.borrow().loading
    }

    /// Watch the cart. Check `owner` against the session before trusting
    /// `items`; the readers above do this already.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CartState> {
        self.inner.state.subscribe()
    }

    /// Keep the cart in step with the signed-in identity.
    ///
    /// Fetches once immediately, then again every time the session's user
    /// changes (login, logout, switching accounts, a 401). Abort the handle
    /// to stop.
    pub fn spawn_session_sync(&self) -> JoinHandle<()> {
        let store = self.clone();
        let mut session = self.inner.session.subscribe();
        tokio::spawn(async move {
            let mut last = identity(&mut session);
            store.resync().await;

            while session.changed().await.is_ok() {
                let current = identity(&mut session);
                if current == last {
                    continue;
                }
                tracing::debug!(from = ?last, to = ?current, "Session identity changed");
                last = current;
                store.resync().await;
            }
        })
    }
}

fn identity(rx: &mut watch::Receiver<Option<crate::session::Session>>) -> Option<UserId> {
    rx.borrow_and_update().as_ref().map(|s| s.user.id)
}
