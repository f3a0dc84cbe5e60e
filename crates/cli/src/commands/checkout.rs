//! Checkout command.
//!
//! # Usage
//!
//! ```bash
//! cartsync checkout
//! ```
//!
//! Waits for the post-order catalog refresh before exiting so the stored
//! snapshot reflects the new stock.

use cartsync_engine::Result;

use super::CliSession;

/// Validate and submit the cart.
#[allow(clippy::print_stdout)]
pub async fn submit(session: &mut CliSession) -> Result<()> {
    session.start().await;

    let receipt = session.checkout_cart().await?;
    println!("Order placed:");
    for item in &receipt.items {
        println!("  {} x {}", item.quantity, item.product_id);
    }

    match receipt.refresh.await {
        Ok(Ok(count)) => tracing::debug!(count, "Catalog refreshed after order"),
        Ok(Err(e)) => tracing::warn!(error = %e, "Catalog refresh after order failed"),
        Err(e) => tracing::warn!(error = %e, "Catalog refresh task did not complete"),
    }
    Ok(())
}
