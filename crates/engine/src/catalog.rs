//! Catalog cache: the locally known product list.
//!
//! The cache is optimistic-stale. Once a snapshot exists it is served
//! without waiting on the network, and a failed refresh keeps the last
//! known-good snapshot. Snapshots are replaced wholesale, never patched.
//!
//! Concurrent refreshes are not coalesced; whichever completes last wins.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{Arc, PoisonError, RwLock};

use cartsync_core::{Product, ProductError, ProductId};
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

use crate::remote::{CatalogService, RemoteError};
use crate::storage::{Slot, SlotRead, SlotStore, load_json, store_json};

/// A product list that violates the catalog invariants.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SnapshotError {
    /// Two products share an id.
    #[error("duplicate product id in catalog: {0}")]
    DuplicateId(ProductId),

    /// A product failed validation.
    #[error(transparent)]
    InvalidProduct(#[from] ProductError),
}

/// Errors from a catalog refresh or lookup.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The remote catalog could not be reached or answered with an error.
    #[error("Catalog service error: {0}")]
    Remote(#[from] RemoteError),

    /// The remote catalog returned an invalid product list.
    #[error("Invalid catalog: {0}")]
    Snapshot(#[from] SnapshotError),
}

/// Result of [`CatalogCache::load`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogLoad {
    /// Adopted the persisted snapshot without a network call.
    Restored(usize),
    /// Fetched a fresh snapshot from the remote catalog.
    Refreshed(usize),
    /// Nothing persisted and the fetch failed; the catalog is empty.
    Unavailable,
}

/// The full product list at a point in time.
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    products: Vec<Product>,
    index: HashMap<ProductId, usize>,
    fetched_at: Option<DateTime<Utc>>,
}

impl CatalogSnapshot {
    /// Build a snapshot, enforcing unique ids and valid products.
    ///
    /// # Errors
    ///
    /// Returns `SnapshotError` if an id repeats or a product is invalid.
    pub fn new(
        products: Vec<Product>,
        fetched_at: Option<DateTime<Utc>>,
    ) -> Result<Self, SnapshotError> {
        let mut index = HashMap::with_capacity(products.len());
        for (position, product) in products.iter().enumerate() {
            product.validate()?;
            match index.entry(product.id.clone()) {
                Entry::Occupied(_) => return Err(SnapshotError::DuplicateId(product.id.clone())),
                Entry::Vacant(slot) => {
                    slot.insert(position);
                }
            }
        }

        Ok(Self {
            products,
            index,
            fetched_at,
        })
    }

    /// Products in catalog order.
    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Look up a product by id.
    #[must_use]
    pub fn get(&self, id: &ProductId) -> Option<&Product> {
        self.index.get(id).and_then(|&i| self.products.get(i))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// When the snapshot was fetched, or `None` if it was restored from storage.
    #[must_use]
    pub const fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.fetched_at
    }
}

/// Locally cached catalog backed by the `products` slot.
///
/// Cheaply cloneable; clones share the same snapshot.
pub struct CatalogCache<C> {
    inner: Arc<CatalogCacheInner<C>>,
}

struct CatalogCacheInner<C> {
    service: C,
    store: Arc<dyn SlotStore>,
    snapshot: RwLock<Arc<CatalogSnapshot>>,
}

impl<C> Clone for CatalogCache<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: CatalogService> CatalogCache<C> {
    /// Create an empty cache. Call [`load`](Self::load) to populate it.
    #[must_use]
    pub fn new(service: C, store: Arc<dyn SlotStore>) -> Self {
        Self {
            inner: Arc::new(CatalogCacheInner {
                service,
                store,
                snapshot: RwLock::new(Arc::new(CatalogSnapshot::default())),
            }),
        }
    }

    /// Populate the cache at start-up.
    ///
    /// Adopts the persisted snapshot if it decodes; otherwise clears a
    /// corrupt slot and refreshes from the remote catalog.
    #[instrument(skip(self))]
    pub async fn load(&self) -> CatalogLoad {
        match load_json::<Vec<Product>>(self.inner.store.as_ref(), Slot::Products) {
            Ok(SlotRead::Loaded(products)) => match CatalogSnapshot::new(products, None) {
                Ok(snapshot) => {
                    let count = snapshot.len();
                    self.replace(snapshot);
                    info!(count, "Restored catalog from storage");
                    return CatalogLoad::Restored(count);
                }
                Err(e) => {
                    warn!(error = %e, "Persisted catalog is invalid, refetching");
                    self.clear_slot();
                }
            },
            Ok(SlotRead::Corrupt(e)) => {
                warn!(error = %e, "Persisted catalog is corrupt, refetching");
                self.clear_slot();
            }
            Ok(SlotRead::Missing) => debug!("No persisted catalog"),
            Err(e) => warn!(error = %e, "Failed to read persisted catalog"),
        }

        match self.refresh().await {
            Ok(count) => CatalogLoad::Refreshed(count),
            Err(_) => CatalogLoad::Unavailable,
        }
    }

    /// Fetch the full product list and replace the snapshot.
    ///
    /// On failure the current snapshot is left untouched. The error is
    /// logged here; callers may ignore it.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the fetch fails or the list is invalid.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<usize, CatalogError> {
        let products = match self.inner.service.fetch_products().await {
            Ok(products) => products,
            Err(e) => {
                error!(error = %e, "Catalog refresh failed, keeping current snapshot");
                return Err(e.into());
            }
        };

        let snapshot = CatalogSnapshot::new(products, Some(Utc::now())).map_err(|e| {
            error!(error = %e, "Catalog refresh returned invalid data, keeping current snapshot");
            e
        })?;

        let count = snapshot.len();
        self.replace_and_persist(snapshot);
        info!(count, "Catalog refreshed");
        Ok(count)
    }

    /// Look up a product locally, falling back to the remote service.
    ///
    /// The remote result is returned but not merged into the snapshot.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Remote` if the fallback fetch fails.
    #[instrument(skip_all, fields(product_id = %id))]
    pub async fn lookup(&self, id: &ProductId) -> Result<Option<Product>, CatalogError> {
        if let Some(product) = self.get(id) {
            return Ok(Some(product));
        }

        debug!("Product not in snapshot, asking remote catalog");
        self.inner.service.fetch_product(id).await.map_err(|e| {
            warn!(error = %e, "Remote product lookup failed");
            CatalogError::Remote(e)
        })
    }

    /// Get a product from the current snapshot.
    #[must_use]
    pub fn get(&self, id: &ProductId) -> Option<Product> {
        self.snapshot().get(id).cloned()
    }

    /// The current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        let guard = self
            .inner
            .snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    fn replace(&self, snapshot: CatalogSnapshot) {
        let mut guard = self
            .inner
            .snapshot
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::new(snapshot);
    }

    /// Swap the snapshot and write the slot under one lock so concurrent
    /// refreshes leave memory and storage agreeing on the same winner.
    fn replace_and_persist(&self, snapshot: CatalogSnapshot) {
        let mut guard = self
            .inner
            .snapshot
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        if let Err(e) = store_json(self.inner.store.as_ref(), Slot::Products, snapshot.products())
        {
            warn!(error = %e, "Failed to persist catalog");
        }
        *guard = Arc::new(snapshot);
    }

    fn clear_slot(&self) {
        if let Err(e) = self.inner.store.remove(Slot::Products) {
            warn!(error = %e, "Failed to clear persisted catalog");
        }
    }
}
