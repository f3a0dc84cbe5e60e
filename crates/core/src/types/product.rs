//! Catalog product and review types.
//!
//! These mirror the JSON objects served by the remote catalog service
//! (`GET /product/`). Optional collections default to empty so sparse
//! payloads still parse.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::id::{ProductId, ReviewId};

/// Highest rating a review may carry.
pub const MAX_RATING: f64 = 5.0;

/// Errors reported by [`Product::validate`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProductError {
    /// The product has a negative price.
    #[error("product {id} has a negative price: {price}")]
    NegativePrice {
        /// Offending product.
        id: ProductId,
        /// Price as received.
        price: Decimal,
    },
    /// A review rating falls outside `[0, 5]`.
    #[error("review {review} on product {id} has rating {rating} outside [0, 5]")]
    RatingOutOfRange {
        /// Product carrying the review.
        id: ProductId,
        /// Offending review.
        review: ReviewId,
        /// Rating as received.
        rating: f64,
    },
}

/// A customer review attached to a product.
///
/// Reviews are append-only on the remote side and read-only here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: ReviewId,
    pub reviewer_name: String,
    pub reviewer_email: String,
    /// Rating in `[0, 5]`.
    pub rating: f64,
    pub comment: String,
    /// Raw date string as served by the catalog.
    pub date: String,
}

impl Review {
    /// Parse the review date as RFC 3339, if it is one.
    #[must_use]
    pub fn parsed_date(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.date)
            .ok()
            .map(|d| d.with_timezone(&Utc))
    }
}

/// A catalog product.
///
/// Immutable for the lifetime of a catalog snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    /// Unit price in the store currency.
    pub price: Decimal,
    /// Remote inventory count at fetch time.
    pub stock: u32,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub reviews: Vec<Review>,
}

impl Product {
    /// Cover image, if the product has any images.
    #[must_use]
    pub fn first_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }

    /// Mean review rating, or `None` without reviews.
    #[must_use]
    #[allow(clippy::cast_precision_loss)] // Review counts never approach f64 precision
    pub fn average_rating(&self) -> Option<f64> {
        if self.reviews.is_empty() {
            return None;
        }
        let sum: f64 = self.reviews.iter().map(|r| r.rating).sum();
        Some(sum / self.reviews.len() as f64)
    }

    /// Whether the product currently has any stock.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }

    /// Check the data-model invariants that the types alone cannot express.
    ///
    /// # Errors
    ///
    /// Returns `ProductError` on a negative price or an out-of-range rating.
    pub fn validate(&self) -> Result<(), ProductError> {
        if self.price.is_sign_negative() && !self.price.is_zero() {
            return Err(ProductError::NegativePrice {
                id: self.id.clone(),
                price: self.price,
            });
        }

        if let Some(review) = self
            .reviews
            .iter()
            .find(|r| !(0.0..=MAX_RATING).contains(&r.rating))
        {
            return Err(ProductError::RatingOutOfRange {
                id: self.id.clone(),
                review: review.id.clone(),
                rating: review.rating,
            });
        }

        Ok(())
    }
}
