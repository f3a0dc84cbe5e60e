//! Cart line and order request types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::price::line_amount;
use super::product::Product;

/// One product's entry in the cart.
///
/// `title`, `price` and `stock` are a snapshot taken when the product was
/// first added; they are not live-linked to the catalog and may go stale.
/// `quantity` is always positive while the line is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Weak reference to a catalog product.
    #[serde(rename = "id")]
    pub product_id: ProductId,
    pub title: String,
    pub price: Decimal,
    pub stock: u32,
    pub quantity: u32,
}

impl CartLine {
    /// Snapshot a product into a new line with quantity 1.
    #[must_use]
    pub fn from_product(product: &Product) -> Self {
        Self {
            product_id: product.id.clone(),
            title: product.title.clone(),
            price: product.price,
            stock: product.stock,
            quantity: 1,
        }
    }

    /// `price × quantity` for this line.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        line_amount(self.price, self.quantity)
    }

    /// Whether the quantity exceeds the given stock level.
    #[must_use]
    pub const fn exceeds(&self, available: u32) -> bool {
        self.quantity > available
    }

    /// Whether the quantity exceeds the stock recorded at add-time.
    #[must_use]
    pub const fn exceeds_stock(&self) -> bool {
        self.exceeds(self.stock)
    }
}

/// One entry of an order submission.
///
/// Field names match the remote order service (`produtoId`). Price is not
/// sent; the service is the price authority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    #[serde(rename = "produtoId")]
    pub product_id: ProductId,
    pub quantity: u32,
}

impl From<&CartLine> for OrderItem {
    fn from(line: &CartLine) -> Self {
        Self {
            product_id: line.product_id.clone(),
            quantity: line.quantity,
        }
    }
}

/// Body of `POST /orders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub order_items: Vec<OrderItem>,
}

impl OrderRequest {
    /// Build a request from cart lines, preserving their order.
    #[must_use]
    pub fn from_lines(lines: &[CartLine]) -> Self {
        Self {
            order_items: lines.iter().map(OrderItem::from).collect(),
        }
    }
}
