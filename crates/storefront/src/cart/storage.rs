//! Durable storage for the cart.
//!
//! The whole line-item sequence is saved under a single key after every
//! effective mutation and read back once when the store opens.
//!
//! # Payload
//!
//! ```json
//! {"version": 0, "state": {"items": [{"id": "p1", "type": "product", ...}]}}
//! ```
//!
//! Any payload that cannot be read, or carries an unknown version, is treated
//! by the store as "no saved cart".

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use tjs_core::CartLineItem;

/// Name under which the cart is stored.
pub const STORAGE_KEY: &str = "tjs-cart-storage";

/// Version written into every payload.
pub const PAYLOAD_VERSION: u32 = 0;

/// Errors from reading or writing the saved cart.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem read or write failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Payload could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Payload was written by an unknown format version.
    #[error("unsupported payload version: {0}")]
    UnsupportedVersion(u32),

    /// Backend refused the operation.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Where the cart is kept between sessions.
///
/// Implementations must be safe to share across handler tasks.
pub trait CartStorage: Send + Sync {
    /// Read the saved line items, or `None` if nothing has been saved yet.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the payload exists but cannot be read.
    fn load(&self) -> Result<Option<Vec<CartLineItem>>, StorageError>;

    /// Replace the saved line items.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the payload cannot be written.
    fn save(&self, items: &[CartLineItem]) -> Result<(), StorageError>;
}

#[derive(Serialize, Deserialize)]
struct Envelope<T> {
    version: u32,
    state: EnvelopeState<T>,
}

#[derive(Serialize, Deserialize)]
struct EnvelopeState<T> {
    items: T,
}

/// Encode line items into the persisted payload.
///
/// # Errors
///
/// Returns `StorageError::Serialization` if encoding fails.
pub fn encode(items: &[CartLineItem]) -> Result<String, StorageError> {
    let envelope = Envelope {
        version: PAYLOAD_VERSION,
        state: EnvelopeState { items },
    };
    Ok(serde_json::to_string(&envelope)?)
}

/// Decode a persisted payload.
///
/// # Errors
///
/// Returns `StorageError` if the payload is malformed or has an unknown version.
pub fn decode(payload: &str) -> Result<Vec<CartLineItem>, StorageError> {
    let envelope: Envelope<Vec<CartLineItem>> = serde_json::from_str(payload)?;
    if envelope.version != PAYLOAD_VERSION {
        return Err(StorageError::UnsupportedVersion(envelope.version));
    }
    Ok(envelope.state.items)
}

// =============================================================================
// In-memory storage
// =============================================================================

/// Process-local storage, used by tests and as a fallback.
///
/// Payloads go through the same encoding as the file backend so round-trip
/// behaviour is identical.
#[derive(Debug, Default)]
pub struct MemoryCartStorage {
    payload: Mutex<Option<String>>,
    fail_saves: AtomicBool,
}

impl MemoryCartStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a raw payload, as if a previous session had saved it.
    #[must_use]
    pub fn with_payload(payload: impl Into<String>) -> Self {
        Self {
            payload: Mutex::new(Some(payload.into())),
            fail_saves: AtomicBool::new(false),
        }
    }

    /// The raw payload currently saved.
    #[must_use]
    pub fn payload(&self) -> Option<String> {
        self.payload
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Make subsequent saves fail with `StorageError::Unavailable`.
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }
}

impl CartStorage for MemoryCartStorage {
    fn load(&self) -> Result<Option<Vec<CartLineItem>>, StorageError> {
        self.payload().as_deref().map(decode).transpose()
    }

    fn save(&self, items: &[CartLineItem]) -> Result<(), StorageError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("saves disabled".to_string()));
        }
        let encoded = encode(items)?;
        *self.payload.lock().unwrap_or_else(PoisonError::into_inner) = Some(encoded);
        Ok(())
    }
}

// =============================================================================
// File storage
// =============================================================================

static TEMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// Saves the cart as `<dir>/tjs-cart-storage.json`.
///
/// Writes go to a temporary sibling file that is then renamed over the
/// target, so a crash mid-write leaves the previous payload intact.
///
/// The file is read only when a store opens. One process should own a cart
/// file at a time: a second writer's changes are replaced by the owner's next
/// save.
#[derive(Debug, Clone)]
pub struct JsonFileCartStorage {
    path: PathBuf,
}

impl JsonFileCartStorage {
    /// Storage rooted in `dir`. The directory is created on first save.
    #[must_use]
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(format!("{STORAGE_KEY}.json")),
        }
    }

    /// Full path of the payload file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A temporary sibling unique to this process and save, so concurrent
    /// writers never share a partially written file.
    fn temp_path(&self) -> PathBuf {
        let seq = TEMP_SEQ.fetch_add(1, Ordering::Relaxed);
        self.path
            .with_extension(format!("json.{}.{seq}.tmp", std::process::id()))
    }
}

impl CartStorage for JsonFileCartStorage {
    fn load(&self) -> Result<Option<Vec<CartLineItem>>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(payload) => decode(&payload).map(Some),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, items: &[CartLineItem]) -> Result<(), StorageError> {
        let encoded = encode(items)?;
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }

        let temp = self.temp_path();
        {
            let mut file = fs::File::create(&temp)?;
            file.write_all(encoded.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&temp, &self.path)?;

        tracing::debug!(path = %self.path.display(), lines = items.len(), "Cart saved");
        Ok(())
    }
}
