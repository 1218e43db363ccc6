//! Shared cart state container.
//!
//! [`CartStore`] owns the one [`Cart`] for the process. It is built once at
//! startup, placed in [`AppState`](crate::state::AppState) and handed to every
//! consumer explicitly.
//!
//! Each mutation is a two-step sequence:
//!
//! 1. apply the change to the in-memory cart and notify subscribers
//! 2. save the new line items through the [`CartStorage`] backend
//!
//! Step 2 only runs when step 1 changed something. A failed save is logged and
//! otherwise ignored: the in-memory cart stays the source of truth and the
//! next successful save catches storage up.
//!
//! [`CartStore::open`] saves on the calling thread, which suits the CLI.
//! [`CartStore::open_with_writer`] hands saves to a background task that runs
//! the blocking I/O off the async workers. Either way saves land in mutation
//! order.

use std::sync::{Arc, Mutex, PoisonError};

use rust_decimal::Decimal;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::instrument;

use tjs_core::{Cart, CartLineItem, CartSummary, LineKey, NewCartItem, PricingPolicy};

use super::storage::{CartStorage, MemoryCartStorage};

/// Single source of truth for the shopping cart.
pub struct CartStore {
    state: watch::Sender<Cart>,
    persistence: Persistence,
}

enum Persistence {
    Inline {
        storage: Arc<dyn CartStorage>,
        /// Serializes mutate+save pairs so saves land in mutation order.
        write_lock: Mutex<()>,
    },
    Background {
        queue: mpsc::UnboundedSender<WriteRequest>,
    },
}

enum WriteRequest {
    Save(Vec<CartLineItem>),
    Flush(oneshot::Sender<()>),
}

impl CartStore {
    /// Open the store, restoring any cart saved by a previous session.
    ///
    /// Never fails: an unreadable or corrupt payload is logged and the store
    /// starts empty. Saves run on the thread that made the change.
    pub fn open(storage: Arc<dyn CartStorage>) -> Self {
        let cart = restore(storage.as_ref());
        Self {
            state: watch::channel(cart).0,
            persistence: Persistence::Inline {
                storage,
                write_lock: Mutex::new(()),
            },
        }
    }

    /// Like [`CartStore::open`], but saves run on a background task.
    ///
    /// The task stops once the store is dropped and every queued save has
    /// been written.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn open_with_writer(storage: Arc<dyn CartStorage>) -> Self {
        let cart = restore(storage.as_ref());
        let (queue, requests) = mpsc::unbounded_channel();
        tokio::spawn(run_writer(storage, requests));
        Self {
            state: watch::channel(cart).0,
            persistence: Persistence::Background { queue },
        }
    }

    /// A store backed by [`MemoryCartStorage`].
    #[must_use]
    pub fn in_memory() -> Self {
        Self::open(Arc::new(MemoryCartStorage::new()))
    }

    /// Receive the current cart and every later change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Cart> {
        self.state.subscribe()
    }

    /// Copy of the current cart.
    #[must_use]
    pub fn snapshot(&self) -> Cart {
        self.state.borrow().clone()
    }

    /// Copy of the current line items in insertion order.
    #[must_use]
    pub fn items(&self) -> Vec<CartLineItem> {
        self.state.borrow().items().to_vec()
    }

    /// Sum of quantities across all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.state.borrow().item_count()
    }

    /// Sum of `unit_price * quantity` across all lines.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.state.borrow().subtotal()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.borrow().is_empty()
    }

    /// Order summary for the current subtotal.
    #[must_use]
    pub fn summary(&self, policy: &PricingPolicy) -> CartSummary {
        policy.summarize(self.subtotal())
    }

    /// Add `quantity` units, merging into an existing `(id, kind)` line.
    #[instrument(skip(self, entry), fields(key = %entry.key()))]
    pub fn add_item(&self, entry: NewCartItem, quantity: u32) {
        self.mutate("add_item", |cart| cart.add_item(entry, quantity));
    }

    /// Remove the line with the given key, if present.
    #[instrument(skip(self), fields(key = %key))]
    pub fn remove_item(&self, key: &LineKey) {
        self.mutate("remove_item", |cart| cart.remove_item(key));
    }

    /// Set a line's absolute quantity; zero or below removes it.
    #[instrument(skip(self), fields(key = %key))]
    pub fn update_quantity(&self, key: &LineKey, quantity: i64) {
        self.mutate("update_quantity", |cart| cart.update_quantity(key, quantity));
    }

    /// Empty the cart.
    #[instrument(skip(self))]
    pub fn clear_cart(&self) {
        self.mutate("clear_cart", Cart::clear);
    }

    /// Wait until every change made so far has been handed to storage.
    ///
    /// Returns immediately for a store opened with [`CartStore::open`].
    pub async fn flush(&self) {
        if let Persistence::Background { queue } = &self.persistence {
            let (done, finished) = oneshot::channel();
            if queue.send(WriteRequest::Flush(done)).is_ok() {
                let _ = finished.await;
            }
        }
    }

    fn mutate(&self, op: &'static str, apply: impl FnOnce(&mut Cart) -> bool) {
        match &self.persistence {
            Persistence::Inline {
                storage,
                write_lock,
            } => {
                let _guard = write_lock.lock().unwrap_or_else(PoisonError::into_inner);

                if !self.state.send_if_modified(apply) {
                    tracing::debug!(op, "Cart unchanged");
                    return;
                }

                let items = self.items();
                if let Err(e) = storage.save(&items) {
                    tracing::warn!(op, error = %e, "Failed to save cart");
                }
            }
            Persistence::Background { queue } => {
                // Queued under the channel's write lock, so queue order is
                // mutation order.
                let changed = self.state.send_if_modified(|cart| {
                    if !apply(cart) {
                        return false;
                    }
                    if queue.send(WriteRequest::Save(cart.items().to_vec())).is_err() {
                        tracing::warn!(op, "Cart writer stopped, change not saved");
                    }
                    true
                });
                if !changed {
                    tracing::debug!(op, "Cart unchanged");
                }
            }
        }
    }
}

fn restore(storage: &dyn CartStorage) -> Cart {
    match storage.load() {
        Ok(Some(items)) => {
            let cart = Cart::from_items(items);
            tracing::info!(lines = cart.len(), "Restored saved cart");
            cart
        }
        Ok(None) => Cart::new(),
        Err(e) => {
            tracing::warn!(error = %e, "Discarding unreadable saved cart");
            Cart::new()
        }
    }
}

/// Write queued snapshots one at a time on the blocking pool.
///
/// Consecutive snapshots collapse into the newest, which already contains
/// every earlier change.
async fn run_writer(
    storage: Arc<dyn CartStorage>,
    mut requests: mpsc::UnboundedReceiver<WriteRequest>,
) {
    while let Some(request) = requests.recv().await {
        let (mut items, mut flushed) = match request {
            WriteRequest::Save(items) => (items, None),
            WriteRequest::Flush(done) => {
                let _ = done.send(());
                continue;
            }
        };
        while let Ok(next) = requests.try_recv() {
            match next {
                WriteRequest::Save(newer) => items = newer,
                WriteRequest::Flush(done) => {
                    flushed = Some(done);
                    break;
                }
            }
        }

        let backend = Arc::clone(&storage);
        match tokio::task::spawn_blocking(move || backend.save(&items)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!(error = %e, "Failed to save cart"),
            Err(e) => tracing::error!(error = %e, "Cart save task failed"),
        }

        if let Some(done) = flushed {
            let _ = done.send(());
        }
    }
    tracing::debug!("Cart writer stopped");
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cart = self.state.borrow();
        f.debug_struct("CartStore")
            .field("lines", &cart.len())
            .field("item_count", &cart.item_count())
            .field("subscribers", &self.state.receiver_count())
            .field(
                "saves",
                &match self.persistence {
                    Persistence::Inline { .. } => "inline",
                    Persistence::Background { .. } => "background",
                },
            )
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use tjs_core::LineKind;

    use super::*;
    use crate::cart::storage::{decode, encode};

    fn dec(cents: i64) -> Decimal {
        Decimal::new(cents, 2)
    }

    fn product(id: &str, cents: i64) -> NewCartItem {
        NewCartItem::new(id, LineKind::Product, format!("Product {id}"), dec(cents))
    }

    fn store_with(storage: &Arc<MemoryCartStorage>) -> CartStore {
        CartStore::open(Arc::clone(storage) as Arc<dyn CartStorage>)
    }

    #[test]
    fn test_open_without_saved_cart_is_empty() {
        let store = CartStore::in_memory();
        assert!(store.is_empty());
        assert_eq!(store.item_count(), 0);
        assert_eq!(store.subtotal(), Decimal::ZERO);
    }

    #[test]
    fn test_open_with_corrupt_payload_starts_empty() {
        let storage = Arc::new(MemoryCartStorage::with_payload("{\"version\":0,"));
        let store = store_with(&storage);
        assert!(store.is_empty());
    }

    #[test]
    fn test_open_with_unknown_version_starts_empty() {
        let storage = Arc::new(MemoryCartStorage::with_payload(
            r#"{"version":3,"state":{"items":[]}}"#,
        ));
        assert!(store_with(&storage).is_empty());
    }

    #[test]
    fn test_every_effective_mutation_is_saved() {
        let storage = Arc::new(MemoryCartStorage::new());
        let store = store_with(&storage);

        store.add_item(product("p1", 1000), 2);
        let saved = decode(&storage.payload().unwrap()).unwrap();
        assert_eq!(saved, store.items());

        store.update_quantity(&LineKey::product("p1"), 5);
        let saved = decode(&storage.payload().unwrap()).unwrap();
        assert_eq!(saved[0].quantity(), 5);

        store.clear_cart();
        let saved = decode(&storage.payload().unwrap()).unwrap();
        assert!(saved.is_empty());
    }

    #[test]
    fn test_noop_mutation_does_not_save() {
        let storage = Arc::new(MemoryCartStorage::new());
        let store = store_with(&storage);

        store.remove_item(&LineKey::product("missing"));
        store.update_quantity(&LineKey::product("missing"), 3);
        store.clear_cart();
        assert!(storage.payload().is_none());
    }

    #[test]
    fn test_failed_save_keeps_memory_state() {
        let storage = Arc::new(MemoryCartStorage::new());
        let store = store_with(&storage);
        storage.set_fail_saves(true);

        store.add_item(product("p1", 1000), 1);
        assert_eq!(store.item_count(), 1);
        assert!(storage.payload().is_none());

        storage.set_fail_saves(false);
        store.add_item(product("p1", 1000), 1);
        let saved = decode(&storage.payload().unwrap()).unwrap();
        assert_eq!(saved[0].quantity(), 2);
    }

    #[test]
    fn test_restore_into_fresh_store_is_identical() {
        let storage = Arc::new(MemoryCartStorage::new());
        let store = store_with(&storage);
        store.add_item(product("p1", 1000).with_sku("ICE-01"), 3);
        store.add_item(
            NewCartItem::new("p1", LineKind::Bundle, "Knee Kit", dec(5000))
                .with_image_url("/img/knee.png"),
            1,
        );
        store.add_item(product("p2", 250), 4);
        store.remove_item(&LineKey::product("p2"));

        let payload = encode(&store.items()).unwrap();
        let restored = CartStore::open(Arc::new(MemoryCartStorage::with_payload(payload)));

        assert_eq!(restored.items(), store.items());
        assert_eq!(restored.subtotal(), dec(8000));
    }

    #[tokio::test]
    async fn test_subscribers_see_changes() {
        let store = CartStore::in_memory();
        let mut badge = store.subscribe();
        let mut page = store.subscribe();

        store.add_item(product("p1", 1000), 2);

        badge.changed().await.unwrap();
        assert_eq!(badge.borrow_and_update().item_count(), 2);
        page.changed().await.unwrap();
        assert_eq!(page.borrow_and_update().subtotal(), dec(2000));
    }

    #[tokio::test]
    async fn test_noop_does_not_notify() {
        let store = CartStore::in_memory();
        let rx = store.subscribe();

        store.remove_item(&LineKey::product("missing"));
        assert!(!rx.has_changed().unwrap());

        store.add_item(product("p1", 1000), 1);
        assert!(rx.has_changed().unwrap());
    }

    fn writer_store_with(storage: &Arc<MemoryCartStorage>) -> CartStore {
        CartStore::open_with_writer(Arc::clone(storage) as Arc<dyn CartStorage>)
    }

    #[tokio::test]
    async fn test_writer_saves_final_state_after_flush() {
        let storage = Arc::new(MemoryCartStorage::new());
        let store = writer_store_with(&storage);

        store.add_item(product("p1", 1000), 2);
        store.add_item(product("p2", 500), 1);
        store.update_quantity(&LineKey::product("p1"), 5);
        store.remove_item(&LineKey::product("p2"));
        store.flush().await;

        let saved = decode(&storage.payload().unwrap()).unwrap();
        assert_eq!(saved, store.items());
        assert_eq!(saved[0].quantity(), 5);
    }

    #[tokio::test]
    async fn test_writer_restores_saved_cart() {
        let storage = Arc::new(MemoryCartStorage::with_payload(
            encode(&[]).unwrap(),
        ));
        let store = writer_store_with(&storage);
        assert!(store.is_empty());

        store.add_item(product("p1", 1000), 1);
        store.flush().await;
        drop(store);

        let reopened = writer_store_with(&storage);
        assert_eq!(reopened.item_count(), 1);
    }

    #[tokio::test]
    async fn test_writer_failed_save_keeps_memory_state() {
        let storage = Arc::new(MemoryCartStorage::new());
        let store = writer_store_with(&storage);
        storage.set_fail_saves(true);

        store.add_item(product("p1", 1000), 1);
        store.flush().await;
        assert_eq!(store.item_count(), 1);
        assert!(storage.payload().is_none());

        storage.set_fail_saves(false);
        store.add_item(product("p1", 1000), 1);
        store.flush().await;
        let saved = decode(&storage.payload().unwrap()).unwrap();
        assert_eq!(saved[0].quantity(), 2);
    }

    #[tokio::test]
    async fn test_writer_skips_noop_mutations() {
        let storage = Arc::new(MemoryCartStorage::new());
        let store = writer_store_with(&storage);

        store.clear_cart();
        store.remove_item(&LineKey::product("missing"));
        store.flush().await;
        assert!(storage.payload().is_none());
    }

    #[test]
    fn test_inline_flush_returns_immediately() {
        let store = CartStore::in_memory();
        store.add_item(product("p1", 1000), 1);
        tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
            .block_on(store.flush());
        assert_eq!(store.item_count(), 1);
    }

    #[test]
    fn test_summary_uses_policy() {
        let store = CartStore::in_memory();
        store.add_item(product("p1", 1000), 3);
        let summary = store.summary(&PricingPolicy::default());
        assert_eq!(summary.subtotal, dec(3000));
        assert_eq!(summary.shipping, dec(999));
    }

    #[test]
    fn test_debug_reports_counts() {
        let store = CartStore::in_memory();
        store.add_item(product("p1", 1000), 3);
        let debug = format!("{store:?}");
        assert!(debug.contains("item_count: 3"));
    }

    #[test]
    fn test_concurrent_adds_are_not_lost() {
        let store = Arc::new(CartStore::in_memory());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        store.add_item(product("p1", 100), 1);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(store.item_count(), 400);
    }
}
