//! Cart store: the user's pending selections.
//!
//! Every mutation is write-through. The in-memory change and the write to
//! the `cart` slot happen under one lock, so persisted state never lags or
//! reorders relative to memory. A failing write is logged, not surfaced.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use cartsync_core::{CartLine, Decimal, Product, ProductId};
use tracing::{debug, warn};

use crate::storage::{Slot, SlotRead, SlotStore, load_json, store_json};

/// Shared, persisted cart.
///
/// Cheaply cloneable; clones observe and mutate the same lines.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<CartStoreInner>,
}

struct CartStoreInner {
    lines: Mutex<Vec<CartLine>>,
    store: Arc<dyn SlotStore>,
}

impl CartStore {
    /// Create an empty cart without reading storage.
    #[must_use]
    pub fn new(store: Arc<dyn SlotStore>) -> Self {
        Self::with_lines(store, Vec::new())
    }

    /// Rehydrate the cart from the `cart` slot.
    ///
    /// A corrupt slot is cleared and the cart starts empty. Lines with a
    /// zero quantity are dropped and repeated product ids keep their first
    /// occurrence.
    #[must_use]
    pub fn load(store: Arc<dyn SlotStore>) -> Self {
        let lines = match load_json::<Vec<CartLine>>(store.as_ref(), Slot::Cart) {
            Ok(SlotRead::Loaded(lines)) => lines,
            Ok(SlotRead::Missing) => Vec::new(),
            Ok(SlotRead::Corrupt(e)) => {
                warn!(error = %e, "Persisted cart is corrupt, starting empty");
                if let Err(e) = store.remove(Slot::Cart) {
                    warn!(error = %e, "Failed to clear persisted cart");
                }
                Vec::new()
            }
            Err(e) => {
                warn!(error = %e, "Failed to read persisted cart, starting empty");
                Vec::new()
            }
        };

        let loaded = lines.len();
        let lines = normalize(lines);
        let cart = Self::with_lines(store, lines);

        if cart.len() == loaded {
            debug!(lines = loaded, "Restored cart");
        } else {
            warn!(
                loaded,
                kept = cart.len(),
                "Dropped invalid persisted cart lines"
            );
            let guard = cart.lock();
            cart.persist(&guard);
        }

        cart
    }

    fn with_lines(store: Arc<dyn SlotStore>, lines: Vec<CartLine>) -> Self {
        Self {
            inner: Arc::new(CartStoreInner {
                lines: Mutex::new(lines),
                store,
            }),
        }
    }

    /// Add one unit of a product.
    ///
    /// Increments an existing line or appends a new line snapshotting the
    /// product. Stock is not checked here; checkout catches overshoot.
    /// Returns the line's new quantity.
    pub fn add(&self, product: &Product) -> u32 {
        self.mutate(|lines| {
            if let Some(line) = lines.iter_mut().find(|l| l.product_id == product.id) {
                line.quantity = line.quantity.saturating_add(1);
                line.quantity
            } else {
                lines.push(CartLine::from_product(product));
                1
            }
        })
    }

    /// Set a line's quantity. A quantity of zero or less removes the line.
    ///
    /// Returns `true` if a line for `id` existed.
    pub fn set_quantity(&self, id: &ProductId, quantity: i64) -> bool {
        self.mutate(|lines| {
            let Some(position) = lines.iter().position(|l| &l.product_id == id) else {
                return false;
            };

            if quantity <= 0 {
                lines.remove(position);
            } else if let Some(line) = lines.get_mut(position) {
                line.quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
            }
            true
        })
    }

    /// Increase a line's quantity by one.
    pub fn increase(&self, id: &ProductId) -> bool {
        self.step(id, 1)
    }

    /// Decrease a line's quantity by one, removing it at zero.
    pub fn decrease(&self, id: &ProductId) -> bool {
        self.step(id, -1)
    }

    /// Remove a line entirely.
    pub fn remove(&self, id: &ProductId) -> bool {
        self.set_quantity(id, 0)
    }

    fn step(&self, id: &ProductId, delta: i64) -> bool {
        self.mutate(|lines| {
            let Some(position) = lines.iter().position(|l| &l.product_id == id) else {
                return false;
            };
            let next = lines
                .get(position)
                .map_or(0, |l| i64::from(l.quantity) + delta);
            if next <= 0 {
                lines.remove(position);
            } else if let Some(line) = lines.get_mut(position) {
                line.quantity = u32::try_from(next).unwrap_or(u32::MAX);
            }
            true
        })
    }

    /// Remove every line and erase the `cart` slot.
    pub fn clear(&self) {
        let mut guard = self.lock();
        guard.clear();
        if let Err(e) = self.inner.store.remove(Slot::Cart) {
            warn!(error = %e, "Failed to clear persisted cart");
        }
    }

    /// Current lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> Vec<CartLine> {
        self.lock().clone()
    }

    /// The line for a product, if present.
    #[must_use]
    pub fn get(&self, id: &ProductId) -> Option<CartLine> {
        self.lock().iter().find(|l| &l.product_id == id).cloned()
    }

    /// `Σ(quantity × price)` over all lines.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.lock().iter().map(CartLine::subtotal).sum()
    }

    /// Total units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lock()
            .iter()
            .fold(0_u32, |acc, l| acc.saturating_add(l.quantity))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<CartLine>> {
        self.inner
            .lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply a mutation and persist the result before releasing the lock.
    fn mutate<R>(&self, f: impl FnOnce(&mut Vec<CartLine>) -> R) -> R {
        let mut guard = self.lock();
        let result = f(&mut guard);
        self.persist(&guard);
        result
    }

    fn persist(&self, lines: &[CartLine]) {
        if let Err(e) = store_json(self.inner.store.as_ref(), Slot::Cart, lines) {
            warn!(error = %e, "Failed to persist cart");
        }
    }
}

/// Drop zero-quantity lines and repeated product ids.
fn normalize(lines: Vec<CartLine>) -> Vec<CartLine> {
    let mut seen = HashSet::with_capacity(lines.len());
    lines
        .into_iter()
        .filter(|l| l.quantity > 0)
        .filter(|l| seen.insert(l.product_id.clone()))
        .collect()
}
