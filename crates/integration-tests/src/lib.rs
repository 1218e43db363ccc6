//! Integration tests for the TJS recovery store.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p tjs-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_persistence` - Saved cart survives restarts and bad payloads
//! - `storefront_cart_flow` - Cart HTTP API driven end to end in-process
//!
//! Everything runs in-process against temporary directories, so no server
//! or external service is needed.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::Path;
use std::sync::Arc;

use tjs_storefront::cart::{CartStore, JsonFileCartStorage};
use tjs_storefront::config::StorefrontConfig;
use tjs_storefront::state::AppState;

/// Open a cart store saved under `dir`.
#[must_use]
pub fn file_store(dir: &Path) -> CartStore {
    CartStore::open(Arc::new(JsonFileCartStorage::new(dir)))
}

/// Build storefront state whose cart is saved under `dir`.
///
/// Saves run on a background task, so call this inside a tokio runtime and
/// `flush` the cart before reading the file back.
#[must_use]
pub fn file_backed_state(dir: &Path) -> AppState {
    let config = StorefrontConfig {
        cart_dir: dir.to_path_buf(),
        ..StorefrontConfig::default()
    };
    AppState::new(config, Arc::new(JsonFileCartStorage::new(dir)))
}
