//! Session wiring.
//!
//! A [`Session`] owns one catalog cache, one cart and one checkout
//! transaction built over the same slot store. Front ends hold the session
//! and reach the components through it.

use std::sync::Arc;

use cartsync_core::ProductId;
use tracing::info;

use crate::cart::CartStore;
use crate::catalog::{CatalogCache, CatalogLoad};
use crate::checkout::{CheckoutTransaction, OrderReceipt, StockPolicy};
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::remote::{CatalogService, HttpClient, OrderService};
use crate::storage::{FileStore, SlotStore};

/// One user's cart and catalog view.
pub struct Session<C, O> {
    catalog: CatalogCache<C>,
    cart: CartStore,
    checkout: CheckoutTransaction<O, C>,
}

impl<C: CatalogService, O: OrderService> Session<C, O> {
    /// Build a session, rehydrating the cart from `store`.
    ///
    /// The catalog stays empty until [`start`](Self::start).
    #[must_use]
    pub fn new(
        store: Arc<dyn SlotStore>,
        catalog_service: C,
        order_service: O,
        policy: StockPolicy,
    ) -> Self {
        let catalog = CatalogCache::new(catalog_service, Arc::clone(&store));
        let cart = CartStore::load(store);
        let checkout =
            CheckoutTransaction::new(order_service, cart.clone(), catalog.clone(), policy);

        Self {
            catalog,
            cart,
            checkout,
        }
    }

    /// Populate the catalog from storage or the remote service.
    pub async fn start(&self) -> CatalogLoad {
        let load = self.catalog.load().await;
        info!(catalog = ?load, cart_lines = self.cart.len(), "Session started");
        load
    }

    #[must_use]
    pub const fn catalog(&self) -> &CatalogCache<C> {
        &self.catalog
    }

    #[must_use]
    pub const fn cart(&self) -> &CartStore {
        &self.cart
    }

    #[must_use]
    pub const fn checkout(&self) -> &CheckoutTransaction<O, C> {
        &self.checkout
    }

    pub const fn checkout_mut(&mut self) -> &mut CheckoutTransaction<O, C> {
        &mut self.checkout
    }

    /// Look a product up and add one unit of it to the cart.
    ///
    /// Returns the line's new quantity.
    ///
    /// # Errors
    ///
    /// Returns `ProductNotFound` if neither the snapshot nor the remote
    /// catalog knows the id, or `Catalog` if the remote lookup fails.
    pub async fn add_to_cart(&self, id: &ProductId) -> Result<u32> {
        let product = self
            .catalog
            .lookup(id)
            .await?
            .ok_or_else(|| EngineError::ProductNotFound(id.clone()))?;
        Ok(self.cart.add(&product))
    }

    /// Submit the cart through the session's checkout transaction.
    ///
    /// # Errors
    ///
    /// Returns `Checkout` with the reason the order was not placed.
    pub async fn checkout_cart(&mut self) -> Result<OrderReceipt> {
        Ok(self.checkout.submit().await?)
    }
}

impl Session<HttpClient, HttpClient> {
    /// Build a session persisting to `config.state_dir` and talking to the
    /// configured remote service.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        let store: Arc<dyn SlotStore> = Arc::new(FileStore::new(&config.state_dir));
        Self::with_store(config, store)
    }

    /// Like [`from_config`](Self::from_config) with a caller-supplied store.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn with_store(config: &EngineConfig, store: Arc<dyn SlotStore>) -> Result<Self> {
        let client = HttpClient::new(&config.remote)?;
        Ok(Self::new(
            store,
            client.clone(),
            client,
            config.stock_policy,
        ))
    }
}
