//! Integration tests for state surviving a restart.
//!
//! Each test opens a session on a temporary state directory, drops it, and
//! opens a second session on the same directory as a new process would.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::fs;

use cartsync_core::{Decimal, ProductId};
use cartsync_engine::{CatalogLoad, StockPolicy};
use cartsync_integration_tests::{FakeShop, open_session, product};

#[tokio::test]
async fn test_cart_and_catalog_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let shop = FakeShop::with_products(vec![
        product("a", Decimal::new(10, 0), 5),
        product("b", Decimal::new(3, 0), 2),
    ]);

    let first = open_session(dir.path(), &shop, StockPolicy::CartSnapshot);
    first.start().await;
    first.add_to_cart(&ProductId::new("b")).await.unwrap();
    first.add_to_cart(&ProductId::new("a")).await.unwrap();
    first.cart().increase(&ProductId::new("a"));
    let lines = first.cart().lines();
    drop(first);

    shop.set_catalog_offline(true);
    let second = open_session(dir.path(), &shop, StockPolicy::CartSnapshot);
    assert_eq!(second.cart().lines(), lines);
    assert_eq!(second.start().await, CatalogLoad::Restored(2));
    assert_eq!(shop.product_fetches(), 1);
    assert_eq!(second.cart().total(), Decimal::new(23, 0));
}

#[tokio::test]
async fn test_persisted_cart_uses_wire_field_names() {
    let dir = tempfile::tempdir().unwrap();
    let shop = FakeShop::with_products(vec![product("a", Decimal::new(105, 1), 5)]);

    let session = open_session(dir.path(), &shop, StockPolicy::CartSnapshot);
    session.start().await;
    session.add_to_cart(&ProductId::new("a")).await.unwrap();

    let raw = fs::read_to_string(dir.path().join("cart.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value[0]["id"], "a");
    assert_eq!(value[0]["quantity"], 1);
    assert_eq!(value[0]["stock"], 5);
}

#[tokio::test]
async fn test_corrupt_catalog_file_is_refetched_once() {
    let dir = tempfile::tempdir().unwrap();
    let shop = FakeShop::with_products(vec![product("a", Decimal::ONE, 5)]);
    fs::write(dir.path().join("products.json"), "{\"truncated\": ").unwrap();

    let session = open_session(dir.path(), &shop, StockPolicy::CartSnapshot);
    assert_eq!(session.start().await, CatalogLoad::Refreshed(1));
    assert_eq!(shop.product_fetches(), 1);

    let raw = fs::read_to_string(dir.path().join("products.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value[0]["id"], "a");
}

#[tokio::test]
async fn test_corrupt_catalog_file_removed_when_offline() {
    let dir = tempfile::tempdir().unwrap();
    let shop = FakeShop::with_products(vec![product("a", Decimal::ONE, 5)]);
    shop.set_catalog_offline(true);
    fs::write(dir.path().join("products.json"), "not json").unwrap();

    let session = open_session(dir.path(), &shop, StockPolicy::CartSnapshot);
    assert_eq!(session.start().await, CatalogLoad::Unavailable);
    assert!(!dir.path().join("products.json").exists());
    assert!(session.catalog().snapshot().is_empty());
}

#[tokio::test]
async fn test_corrupt_cart_file_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let shop = FakeShop::with_products(vec![product("a", Decimal::ONE, 5)]);
    fs::write(dir.path().join("cart.json"), "[{\"id\": \"a\", \"quantity\": ").unwrap();

    let session = open_session(dir.path(), &shop, StockPolicy::CartSnapshot);
    assert!(session.cart().is_empty());
    assert!(!dir.path().join("cart.json").exists());
}

#[tokio::test]
async fn test_successful_checkout_leaves_no_cart_for_next_session() {
    let dir = tempfile::tempdir().unwrap();
    let shop = FakeShop::with_products(vec![product("a", Decimal::new(10, 0), 5)]);

    let mut first = open_session(dir.path(), &shop, StockPolicy::CartSnapshot);
    first.start().await;
    first.add_to_cart(&ProductId::new("a")).await.unwrap();
    let receipt = first.checkout_cart().await.unwrap();
    receipt.refresh.await.unwrap().unwrap();
    drop(first);

    assert!(!dir.path().join("cart.json").exists());

    let second = open_session(dir.path(), &shop, StockPolicy::CartSnapshot);
    assert!(second.cart().is_empty());
    assert_eq!(second.start().await, CatalogLoad::Restored(1));
    assert_eq!(second.catalog().get(&ProductId::new("a")).unwrap().stock, 4);
}
