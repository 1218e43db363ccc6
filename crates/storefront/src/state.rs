//! Application state shared across handlers.

use std::sync::Arc;

use tjs_core::PricingPolicy;

use crate::cart::{CartStorage, CartStore};
use crate::config::StorefrontConfig;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// cart store, its storage backend and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    cart: CartStore,
    storage: Arc<dyn CartStorage>,
}

impl AppState {
    /// Create a new application state, opening the cart from `storage`.
    ///
    /// Cart saves run on a background task, off the request path.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    #[must_use]
    pub fn new(config: StorefrontConfig, storage: Arc<dyn CartStorage>) -> Self {
        let cart = CartStore::open_with_writer(Arc::clone(&storage));
        Self {
            inner: Arc::new(AppStateInner {
                config,
                cart,
                storage,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the shared cart store.
    #[must_use]
    pub fn cart(&self) -> &CartStore {
        &self.inner.cart
    }

    /// Get a reference to the cart storage backend.
    #[must_use]
    pub fn storage(&self) -> &dyn CartStorage {
        self.inner.storage.as_ref()
    }

    /// Shipping and tax rules for order summaries.
    #[must_use]
    pub fn pricing(&self) -> &PricingPolicy {
        &self.inner.config.pricing
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.inner.config)
            .field("cart", &self.inner.cart)
            .finish_non_exhaustive()
    }
}
