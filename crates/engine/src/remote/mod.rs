//! Remote catalog and order service interfaces.
//!
//! # Endpoints
//!
//! - `GET /product/` - full product list
//! - `GET /product/{id}` - single product, 404 when unknown
//! - `POST /orders` - order submission, any 2xx is success
//!
//! The engine only talks to these through [`CatalogService`] and
//! [`OrderService`]; [`HttpClient`] is the production implementation.

mod http;

pub use http::HttpClient;

use std::future::Future;
use std::sync::Arc;

use cartsync_core::{OrderRequest, Product, ProductId};
use thiserror::Error;

/// Errors that can occur when talking to the remote services.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// HTTP request failed (connection, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Service answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Status {
        /// Response status code.
        status: u16,
        /// Truncated response body.
        body: String,
    },

    /// Rate limited by the service.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Source of catalog data.
///
/// Implementations must be thread-safe (`Send + Sync`) so refreshes can run
/// on spawned tasks.
pub trait CatalogService: Send + Sync + 'static {
    /// Fetch the full ordered product list.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-success response.
    fn fetch_products(&self) -> impl Future<Output = Result<Vec<Product>, RemoteError>> + Send;

    /// Fetch one product. Returns `None` if the service does not know it.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-success, non-404 response.
    fn fetch_product(
        &self,
        id: &ProductId,
    ) -> impl Future<Output = Result<Option<Product>, RemoteError>> + Send;
}

/// Sink for order submissions.
pub trait OrderService: Send + Sync + 'static {
    /// Submit an order. The response body is ignored.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-success response.
    fn submit_order(
        &self,
        order: &OrderRequest,
    ) -> impl Future<Output = Result<(), RemoteError>> + Send;
}

impl<T: CatalogService> CatalogService for Arc<T> {
    fn fetch_products(&self) -> impl Future<Output = Result<Vec<Product>, RemoteError>> + Send {
        (**self).fetch_products()
    }

    fn fetch_product(
        &self,
        id: &ProductId,
    ) -> impl Future<Output = Result<Option<Product>, RemoteError>> + Send {
        (**self).fetch_product(id)
    }
}

impl<T: OrderService> OrderService for Arc<T> {
    fn submit_order(
        &self,
        order: &OrderRequest,
    ) -> impl Future<Output = Result<(), RemoteError>> + Send {
        (**self).submit_order(order)
    }
}

/// Truncate a response body for logs and error messages.
pub(crate) fn truncate_body(body: &str, max_chars: usize) -> String {
    body.chars().take(max_chars).collect()
}
