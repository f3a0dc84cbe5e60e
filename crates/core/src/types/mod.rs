//! Core types for cartsync.
//!
//! This module provides type-safe wrappers for catalog and cart concepts.

pub mod cart;
pub mod id;
pub mod price;
pub mod product;

pub use cart::{CartLine, OrderItem, OrderRequest};
pub use id::*;
pub use price::{format_price, line_amount};
pub use product::{MAX_RATING, Product, ProductError, Review};
