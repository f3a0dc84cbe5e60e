//! Checkout transaction: validate the cart, submit the order, settle state.
//!
//! # States
//!
//! ```text
//! Idle -> Pending -> Success
//!                 \-> Error
//! ```
//!
//! `Success` and `Error` are terminal; call [`CheckoutTransaction::reset`]
//! before submitting again. Checkout is all-or-nothing from the cart's
//! perspective: the cart is only touched after the order service accepts.

use std::fmt;
use std::str::FromStr;

use cartsync_core::{CartLine, OrderItem, OrderRequest, ProductId};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};

use crate::cart::CartStore;
use crate::catalog::{CatalogCache, CatalogError, CatalogSnapshot};
use crate::remote::{CatalogService, OrderService, RemoteError};

/// Current phase of a checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckoutState {
    #[default]
    Idle,
    Pending,
    Success,
    Error,
}

impl fmt::Display for CheckoutState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Error => "error",
        })
    }
}

/// What checkout compares cart quantities against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StockPolicy {
    /// Stock recorded on the cart line when the product was first added.
    #[default]
    CartSnapshot,
    /// Stock in the current catalog snapshot, falling back to the cart
    /// line's stock for products no longer listed.
    LiveCatalog,
}

impl fmt::Display for StockPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::CartSnapshot => "snapshot",
            Self::LiveCatalog => "catalog",
        })
    }
}

impl FromStr for StockPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "snapshot" => Ok(Self::CartSnapshot),
            "catalog" => Ok(Self::LiveCatalog),
            other => Err(format!("expected `snapshot` or `catalog`, got `{other}`")),
        }
    }
}

/// Why a checkout did not complete.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Nothing to check out. State is unchanged.
    #[error("Cart is empty")]
    EmptyCart,

    /// A previous checkout has not been reset. State is unchanged.
    #[error("Checkout is {0}, reset before submitting again")]
    NotIdle(CheckoutState),

    /// A line asks for more than is available. No order was sent.
    #[error("Product {title} does not have enough stock ({requested} requested, {available} available)")]
    InsufficientStock {
        product_id: ProductId,
        title: String,
        requested: u32,
        available: u32,
    },

    /// The order service rejected the order or could not be reached.
    #[error("Order submission failed: {0}")]
    Remote(#[from] RemoteError),
}

/// A placed order.
#[derive(Debug)]
pub struct OrderReceipt {
    /// Items sent to the order service, in cart order.
    pub items: Vec<OrderItem>,
    /// Catalog refresh started after the order was accepted.
    ///
    /// Dropping the handle detaches the refresh; it still runs.
    pub refresh: JoinHandle<Result<usize, CatalogError>>,
}

/// One-shot checkout over a shared cart and catalog.
pub struct CheckoutTransaction<O, C> {
    orders: O,
    cart: CartStore,
    catalog: CatalogCache<C>,
    policy: StockPolicy,
    state: CheckoutState,
}

impl<O: OrderService, C: CatalogService> CheckoutTransaction<O, C> {
    /// Create an idle transaction.
    #[must_use]
    pub const fn new(
        orders: O,
        cart: CartStore,
        catalog: CatalogCache<C>,
        policy: StockPolicy,
    ) -> Self {
        Self {
            orders,
            cart,
            catalog,
            policy,
            state: CheckoutState::Idle,
        }
    }

    #[must_use]
    pub const fn state(&self) -> CheckoutState {
        self.state
    }

    #[must_use]
    pub const fn policy(&self) -> StockPolicy {
        self.policy
    }

    /// Return to `Idle` from any state, returning the previous state.
    ///
    /// Also recovers a transaction left `Pending` by a dropped `submit`.
    pub fn reset(&mut self) -> CheckoutState {
        std::mem::take(&mut self.state)
    }

    /// Validate the cart and place the order.
    ///
    /// Operates on the cart lines as they are at call time; mutations made
    /// while the order is in flight are not part of it, and are cleared
    /// with the rest of the cart on success.
    ///
    /// # Errors
    ///
    /// - `EmptyCart` / `NotIdle` if there is nothing to do (state unchanged)
    /// - `InsufficientStock` if validation fails (state `Error`, no order sent)
    /// - `Remote` if the order service fails (state `Error`, cart unchanged)
    #[instrument(skip(self), fields(policy = %self.policy))]
    pub async fn submit(&mut self) -> Result<OrderReceipt, CheckoutError> {
        if self.state != CheckoutState::Idle {
            return Err(CheckoutError::NotIdle(self.state));
        }

        let lines = self.cart.lines();
        if lines.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        self.state = CheckoutState::Pending;

        let catalog = self.catalog.snapshot();
        if let Some(shortfall) = first_shortfall(&lines, self.policy, &catalog) {
            info!(reason = %shortfall, "Checkout rejected");
            self.state = CheckoutState::Error;
            return Err(shortfall);
        }

        let order = OrderRequest::from_lines(&lines);
        if let Err(e) = self.orders.submit_order(&order).await {
            warn!(error = %e, "Order submission failed, cart left intact");
            self.state = CheckoutState::Error;
            return Err(e.into());
        }

        self.cart.clear();
        self.state = CheckoutState::Success;
        info!(items = order.order_items.len(), "Order placed");

        let catalog = self.catalog.clone();
        let refresh = tokio::spawn(async move { catalog.refresh().await });

        Ok(OrderReceipt {
            items: order.order_items,
            refresh,
        })
    }
}

/// The first line requesting more than its available stock.
fn first_shortfall(
    lines: &[CartLine],
    policy: StockPolicy,
    catalog: &CatalogSnapshot,
) -> Option<CheckoutError> {
    lines.iter().find_map(|line| {
        let available = match policy {
            StockPolicy::CartSnapshot => line.stock,
            StockPolicy::LiveCatalog => catalog
                .get(&line.product_id)
                .map_or(line.stock, |p| p.stock),
        };

        line.exceeds(available)
            .then(|| CheckoutError::InsufficientStock {
                product_id: line.product_id.clone(),
                title: line.title.clone(),
                requested: line.quantity,
                available,
            })
    })
}
