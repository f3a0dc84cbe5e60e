//! Integration tests for cartsync.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p cartsync-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `session_flow` - browse, add, check out, observe refreshed stock
//! - `rehydration` - state surviving a restart through the filesystem store
//! - `checkout` - validation and failure paths across sessions
//!
//! Tests run against [`FakeShop`], an in-process stand-in for the remote
//! catalog and order service that decrements stock on accepted orders.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use cartsync_core::{Decimal, OrderRequest, Product, ProductId};
use cartsync_engine::remote::{CatalogService, OrderService, RemoteError};
use cartsync_engine::storage::{FileStore, SlotStore};
use cartsync_engine::{Session, StockPolicy};

/// Session type used throughout the tests.
pub type ShopSession = Session<Arc<FakeShop>, Arc<FakeShop>>;

/// Build a product with the fields the engine cares about.
#[must_use]
pub fn product(id: &str, price: Decimal, stock: u32) -> Product {
    Product {
        id: ProductId::new(id),
        title: format!("Product {id}"),
        description: format!("Description of {id}"),
        category: "test".to_string(),
        price,
        stock,
        images: vec![format!("https://img.example/{id}.png")],
        tags: Vec::new(),
        reviews: Vec::new(),
    }
}

#[derive(Default)]
struct ShopState {
    products: Vec<Product>,
    orders: Vec<OrderRequest>,
    catalog_offline: bool,
    reject_orders: bool,
}

/// In-process catalog and order service.
#[derive(Default)]
pub struct FakeShop {
    state: Mutex<ShopState>,
    product_fetches: AtomicUsize,
    order_calls: AtomicUsize,
}

impl FakeShop {
    /// A shop listing `products`.
    #[must_use]
    pub fn with_products(products: Vec<Product>) -> Arc<Self> {
        let shop = Self::default();
        shop.lock().products = products;
        Arc::new(shop)
    }

    fn lock(&self) -> MutexGuard<'_, ShopState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make product list fetches fail with 503.
    pub fn set_catalog_offline(&self, offline: bool) {
        self.lock().catalog_offline = offline;
    }

    /// Make order submissions fail with 500.
    pub fn set_reject_orders(&self, reject: bool) {
        self.lock().reject_orders = reject;
    }

    /// Append a product to the remote listing.
    pub fn list(&self, product: Product) {
        self.lock().products.push(product);
    }

    /// Change a product's stock on the remote side.
    pub fn set_stock(&self, id: &str, stock: u32) {
        if let Some(p) = self.lock().products.iter_mut().find(|p| p.id.as_str() == id) {
            p.stock = stock;
        }
    }

    /// Remote stock of a product.
    #[must_use]
    pub fn stock(&self, id: &str) -> Option<u32> {
        self.lock()
            .products
            .iter()
            .find(|p| p.id.as_str() == id)
            .map(|p| p.stock)
    }

    /// Orders accepted so far.
    #[must_use]
    pub fn orders(&self) -> Vec<OrderRequest> {
        self.lock().orders.clone()
    }

    /// Number of full product list fetches.
    #[must_use]
    pub fn product_fetches(&self) -> usize {
        self.product_fetches.load(Ordering::SeqCst)
    }

    /// Number of order submissions, accepted or not.
    #[must_use]
    pub fn order_calls(&self) -> usize {
        self.order_calls.load(Ordering::SeqCst)
    }
}

impl CatalogService for FakeShop {
    async fn fetch_products(&self) -> Result<Vec<Product>, RemoteError> {
        self.product_fetches.fetch_add(1, Ordering::SeqCst);
        let state = self.lock();
        if state.catalog_offline {
            return Err(RemoteError::Status {
                status: 503,
                body: "catalog offline".to_string(),
            });
        }
        Ok(state.products.clone())
    }

    async fn fetch_product(&self, id: &ProductId) -> Result<Option<Product>, RemoteError> {
        Ok(self.lock().products.iter().find(|p| &p.id == id).cloned())
    }
}

impl OrderService for FakeShop {
    async fn submit_order(&self, order: &OrderRequest) -> Result<(), RemoteError> {
        self.order_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.lock();
        if state.reject_orders {
            return Err(RemoteError::Status {
                status: 500,
                body: "order rejected".to_string(),
            });
        }

        for item in &order.order_items {
            if let Some(p) = state.products.iter_mut().find(|p| p.id == item.product_id) {
                p.stock = p.stock.saturating_sub(item.quantity);
            }
        }
        state.orders.push(order.clone());
        Ok(())
    }
}

/// Open a session persisting to `dir`, as a fresh process would.
#[must_use]
pub fn open_session(dir: &Path, shop: &Arc<FakeShop>, policy: StockPolicy) -> ShopSession {
    let store: Arc<dyn SlotStore> = Arc::new(FileStore::new(dir));
    Session::new(store, Arc::clone(shop), Arc::clone(shop), policy)
}
