//! Unified error type for callers that drive a whole session.
//!
//! Each component keeps its own error enum; `EngineError` wraps them so a
//! front end can use a single `Result<T>` across operations.

use thiserror::Error;

use crate::catalog::CatalogError;
use crate::checkout::CheckoutError;
use crate::config::ConfigError;
use crate::remote::RemoteError;
use crate::storage::StorageError;

/// Engine-level error type.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Remote service client failed.
    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),

    /// Slot store failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Catalog refresh or lookup failed.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Checkout did not complete.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Requested product is unknown to the catalog.
    #[error("Product not found: {0}")]
    ProductNotFound(cartsync_core::ProductId),
}

impl EngineError {
    /// Whether the error reflects a fault worth reporting, rather than an
    /// expected outcome the user can act on.
    #[must_use]
    pub const fn is_fault(&self) -> bool {
        match self {
            Self::Config(_) | Self::Remote(_) | Self::Storage(_) | Self::Catalog(_) => true,
            Self::Checkout(e) => matches!(e, CheckoutError::Remote(_)),
            Self::ProductNotFound(_) => false,
        }
    }
}

/// Result alias using [`EngineError`].
pub type Result<T> = std::result::Result<T, EngineError>;
