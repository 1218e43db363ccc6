//! Shopping cart state for the storefront.
//!
//! - [`store`] - shared, subscribable [`CartStore`]
//! - [`storage`] - persistence backends behind the [`CartStorage`] trait

pub mod storage;
pub mod store;

pub use storage::{CartStorage, JsonFileCartStorage, MemoryCartStorage, StorageError};
pub use store::CartStore;
