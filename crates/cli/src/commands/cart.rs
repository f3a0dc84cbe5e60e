//! Cart commands.
//!
//! # Usage
//!
//! ```bash
//! cartsync cart
//! cartsync add 3
//! cartsync set 3 5
//! cartsync inc 3
//! cartsync dec 3
//! cartsync remove 3
//! ```
//!
//! Only `add` needs the catalog; the others work on the stored cart alone.

use cartsync_core::{CartLine, Decimal, ProductId, format_price};
use cartsync_engine::Result;

use super::CliSession;

/// Print every line and the cart total.
#[allow(clippy::print_stdout)]
pub fn show(session: &CliSession) {
    let cart = session.cart();
    let lines = cart.lines();
    if lines.is_empty() {
        println!("Cart is empty.");
        return;
    }

    for line in &lines {
        println!("{}", line_row(line));
    }
    println!("{}", summary(cart.item_count(), cart.total()));
}

/// Look a product up and add one unit of it.
#[allow(clippy::print_stdout)]
pub async fn add(session: &CliSession, id: &ProductId) -> Result<()> {
    session.start().await;
    let quantity = session.add_to_cart(id).await?;
    println!("Added {id} (quantity {quantity}).");
    print_badge(session);
    Ok(())
}

pub fn set(session: &CliSession, id: &ProductId, quantity: i64) {
    if session.cart().set_quantity(id, quantity) {
        print_line_state(session, id);
    } else {
        print_missing(id);
    }
}

pub fn increase(session: &CliSession, id: &ProductId) {
    if session.cart().increase(id) {
        print_line_state(session, id);
    } else {
        print_missing(id);
    }
}

pub fn decrease(session: &CliSession, id: &ProductId) {
    if session.cart().decrease(id) {
        print_line_state(session, id);
    } else {
        print_missing(id);
    }
}

#[allow(clippy::print_stdout)]
pub fn remove(session: &CliSession, id: &ProductId) {
    if session.cart().remove(id) {
        println!("Removed {id}.");
        print_badge(session);
    } else {
        print_missing(id);
    }
}

#[allow(clippy::print_stdout)]
fn print_line_state(session: &CliSession, id: &ProductId) {
    match session.cart().get(id) {
        Some(line) => println!("{}", line_row(&line)),
        None => println!("Removed {id}."),
    }
    print_badge(session);
}

#[allow(clippy::print_stdout)]
fn print_missing(id: &ProductId) {
    println!("Product {id} is not in the cart.");
}

#[allow(clippy::print_stdout)]
fn print_badge(session: &CliSession) {
    println!("Cart: {} items.", session.cart().item_count());
}

fn line_row(line: &CartLine) -> String {
    format!(
        "{:<8} {:<40} {:>4} x {:>10} = {:>10}",
        line.product_id.as_str(),
        line.title,
        line.quantity,
        format_price(line.price),
        format_price(line.subtotal())
    )
}

fn summary(items: u32, total: Decimal) -> String {
    format!("{items} items, total {}", format_price(total))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_row_shows_subtotal() {
        let line = CartLine {
            product_id: ProductId::new("a"),
            title: "Apple".to_string(),
            price: Decimal::new(105, 1),
            stock: 5,
            quantity: 2,
        };
        let row = line_row(&line);
        assert!(row.contains("2 x"));
        assert!(row.contains("$10.50"));
        assert!(row.ends_with("$21.00"));
    }

    #[test]
    fn test_summary() {
        assert_eq!(summary(3, Decimal::new(240, 1)), "3 items, total $24.00");
    }
}
