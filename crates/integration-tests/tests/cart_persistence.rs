//! Saved cart behavior across store instances.
//!
//! Each test uses its own temporary directory, standing in for a fresh page
//! load against the same browser storage.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::fs;

use rust_decimal::Decimal;
use tjs_core::{LineKey, LineKind, NewCartItem};
use tjs_integration_tests::file_store;
use tjs_storefront::cart::{CartStorage, JsonFileCartStorage};

fn wrap() -> NewCartItem {
    NewCartItem::new("p1", LineKind::Product, "Cold Therapy Wrap", Decimal::new(1000, 2))
        .with_sku("ICE-01")
}

fn kit() -> NewCartItem {
    NewCartItem::new("p1", LineKind::Bundle, "Knee Recovery Kit", Decimal::new(5000, 2))
}

#[test]
fn test_cart_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    {
        let store = file_store(dir.path());
        store.add_item(wrap(), 3);
        store.add_item(kit(), 1);
    }

    let store = file_store(dir.path());
    assert_eq!(store.item_count(), 4);
    assert_eq!(store.subtotal(), Decimal::new(8000, 2));

    let items = store.items();
    assert_eq!(items[0].key(), LineKey::product("p1"));
    assert_eq!(items[0].sku(), Some("ICE-01"));
    assert_eq!(items[1].key(), LineKey::bundle("p1"));
}

#[test]
fn test_payload_shape_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let store = file_store(dir.path());
    store.add_item(wrap(), 2);

    let storage = JsonFileCartStorage::new(dir.path());
    let raw = fs::read_to_string(storage.path()).unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();

    assert_eq!(json["version"], 0);
    let item = &json["state"]["items"][0];
    assert_eq!(item["id"], "p1");
    assert_eq!(item["type"], "product");
    assert_eq!(item["name"], "Cold Therapy Wrap");
    assert_eq!(item["quantity"], 2);
}

#[test]
fn test_corrupt_payload_restores_empty_cart() {
    let dir = tempfile::tempdir().unwrap();
    let storage = JsonFileCartStorage::new(dir.path());
    fs::write(storage.path(), "{not json").unwrap();

    let store = file_store(dir.path());
    assert!(store.is_empty());

    // The next mutation overwrites the bad payload.
    store.add_item(wrap(), 1);
    let reloaded = storage.load().unwrap().unwrap();
    assert_eq!(reloaded.len(), 1);
}

#[test]
fn test_clear_persists_empty_cart() {
    let dir = tempfile::tempdir().unwrap();
    let store = file_store(dir.path());
    store.add_item(wrap(), 1);
    store.clear_cart();

    let storage = JsonFileCartStorage::new(dir.path());
    assert_eq!(storage.load().unwrap(), Some(Vec::new()));
    assert!(file_store(dir.path()).is_empty());
}

#[test]
fn test_removing_to_zero_persists() {
    let dir = tempfile::tempdir().unwrap();
    let store = file_store(dir.path());
    store.add_item(wrap(), 3);
    store.add_item(kit(), 1);
    store.update_quantity(&LineKey::bundle("p1"), 0);

    let reopened = file_store(dir.path());
    assert_eq!(reopened.item_count(), 3);
    assert_eq!(reopened.subtotal(), Decimal::new(3000, 2));
}
