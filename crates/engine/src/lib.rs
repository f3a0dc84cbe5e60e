//! Cartsync engine.
//!
//! Keeps a persisted view of a product catalog and a shopping cart, and
//! reconciles both against a remote order service.
//!
//! # Components
//!
//! - [`catalog::CatalogCache`] - optimistic-stale product list backed by the `products` slot
//! - [`cart::CartStore`] - write-through cart backed by the `cart` slot
//! - [`checkout::CheckoutTransaction`] - validate, submit, clear, refresh
//! - [`session::Session`] - wires the three over one slot store
//!
//! Remote services sit behind [`remote::CatalogService`] and
//! [`remote::OrderService`]; storage sits behind [`storage::SlotStore`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod error;
pub mod remote;
pub mod session;
pub mod storage;

pub use cart::CartStore;
pub use catalog::{CatalogCache, CatalogError, CatalogLoad, CatalogSnapshot};
pub use checkout::{CheckoutError, CheckoutState, CheckoutTransaction, OrderReceipt, StockPolicy};
pub use config::{ConfigError, EngineConfig, RemoteConfig};
pub use error::{EngineError, Result};
pub use session::Session;
