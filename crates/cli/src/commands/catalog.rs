//! Catalog commands.
//!
//! # Usage
//!
//! ```bash
//! cartsync products
//! cartsync products --refresh
//! cartsync product 3
//! cartsync refresh
//! ```

use cartsync_core::{MAX_RATING, Product, ProductId, format_price};
use cartsync_engine::{CatalogLoad, EngineError, Result};

use super::CliSession;

/// List every product in the catalog.
#[allow(clippy::print_stdout)]
pub async fn list(session: &CliSession, refresh: bool) -> Result<()> {
    let load = session.start().await;
    if refresh && !matches!(load, CatalogLoad::Refreshed(_)) {
        session.catalog().refresh().await?;
    }

    let snapshot = session.catalog().snapshot();
    if snapshot.is_empty() {
        println!("No products available.");
        return Ok(());
    }

    for product in snapshot.products() {
        println!("{}", product_row(product));
    }
    Ok(())
}

/// Show one product's details and reviews.
#[allow(clippy::print_stdout)]
pub async fn show(session: &CliSession, id: &ProductId) -> Result<()> {
    session.start().await;
    let product = session
        .catalog()
        .lookup(id)
        .await?
        .ok_or_else(|| EngineError::ProductNotFound(id.clone()))?;

    for line in product_details(&product) {
        println!("{line}");
    }
    Ok(())
}

/// Refetch the catalog.
#[allow(clippy::print_stdout)]
pub async fn refresh(session: &CliSession) -> Result<()> {
    let count = session.catalog().refresh().await?;
    tracing::info!(count, "Catalog refreshed");
    println!("Catalog refreshed: {count} products.");
    Ok(())
}

fn stock_label(product: &Product) -> String {
    if product.in_stock() {
        format!("{} in stock", product.stock)
    } else {
        "out of stock".to_string()
    }
}

fn product_row(product: &Product) -> String {
    format!(
        "{:<8} {:<40} {:>10}  {}",
        product.id.as_str(),
        product.title,
        format_price(product.price),
        stock_label(product)
    )
}

fn product_details(product: &Product) -> Vec<String> {
    let mut lines = vec![
        product.title.clone(),
        format!("  id:       {}", product.id),
        format!("  price:    {}", format_price(product.price)),
        format!("  stock:    {}", stock_label(product)),
    ];

    if !product.category.is_empty() {
        lines.push(format!("  category: {}", product.category));
    }
    if !product.tags.is_empty() {
        lines.push(format!("  tags:     {}", product.tags.join(", ")));
    }
    if let Some(image) = product.first_image() {
        lines.push(format!("  image:    {image}"));
    }
    if !product.description.is_empty() {
        lines.push(String::new());
        lines.push(format!("  {}", product.description));
    }

    match product.average_rating() {
        Some(average) => {
            lines.push(String::new());
            lines.push(format!(
                "  rating:   {average:.1}/{MAX_RATING} ({} reviews)",
                product.reviews.len()
            ));
            for review in &product.reviews {
                lines.push(format!(
                    "    {}/{MAX_RATING} {}: {}",
                    review.rating, review.reviewer_name, review.comment
                ));
            }
        }
        None => lines.push("  no reviews yet".to_string()),
    }

    lines
}

#[cfg(test)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use cartsync_core::Decimal;

    use super::*;

    fn product(stock: u32) -> Product {
        Product {
            id: ProductId::new("7"),
            title: "Pineapple".to_string(),
            description: String::new(),
            category: "fruit".to_string(),
            price: Decimal::new(450, 2),
            stock,
            images: vec!["https://img.example/7.png".to_string()],
            tags: vec!["fresh".to_string(), "tropical".to_string()],
            reviews: Vec::new(),
        }
    }

    #[test]
    fn test_product_row() {
        let row = product_row(&product(3));
        assert!(row.starts_with("7        Pineapple"));
        assert!(row.contains("$4.50"));
        assert!(row.ends_with("3 in stock"));
    }

    #[test]
    fn test_out_of_stock_label() {
        assert_eq!(stock_label(&product(0)), "out of stock");
    }

    #[test]
    fn test_product_details_without_reviews() {
        let lines = product_details(&product(1));
        assert_eq!(lines[0], "Pineapple");
        assert!(lines.iter().any(|l| l == "  tags:     fresh, tropical"));
        assert!(lines.iter().any(|l| l == "  image:    https://img.example/7.png"));
        assert_eq!(lines.last().map(String::as_str), Some("  no reviews yet"));
    }
}
