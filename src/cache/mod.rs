//! Expiring key/value cache
//!
//! The repository depends only on [`CacheStore`]: string keys mapped to opaque
//! byte payloads with an optional time-to-live. A zero TTL means the entry
//! never expires. Expired entries are dropped lazily when read; there is no
//! background sweep, and callers cannot tell "never cached" from "expired".
//!
//! [`CacheStoreExt`] layers JSON encoding on top for typed payloads.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

pub mod memory;

pub use memory::{Clock, ExpiringCache, ManualClock, SystemClock};

/// Cache errors
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Payload could not be encoded or decoded
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Backing store failure (disk, keychain, ...)
    #[error("backend error: {0}")]
    Backend(String),
}

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;

/// Byte-payload store with per-entry TTL.
///
/// Implementations must be safe to share between tasks.
pub trait CacheStore: Send + Sync {
    /// Store `payload` under `key`, replacing any previous entry.
    /// `ttl == Duration::ZERO` stores an entry that never expires.
    fn put(&self, key: &str, payload: Vec<u8>, ttl: Duration) -> CacheResult<()>;

    /// Fetch the payload for `key`; expired entries are removed and reported absent.
    fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>>;

    /// Remove `key` if present.
    fn remove(&self, key: &str);

    /// Remove every entry.
    fn clear(&self);
}

/// JSON helpers over any [`CacheStore`].
pub trait CacheStoreExt: CacheStore {
    /// Encode `value` as JSON and store it.
    fn put_json<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Duration) -> CacheResult<()> {
        let payload = serde_json::to_vec(value)?;
        self.put(key, payload, ttl)
    }

    /// Fetch and decode a JSON payload.
    fn get_json<T: DeserializeOwned>(&self, key: &str) -> CacheResult<Option<T>> {
        match self.get(key)? {
            Some(payload) => Ok(Some(serde_json::from_slice(&payload)?)),
            None => Ok(None),
        }
    }
}

impl<C: CacheStore + ?Sized> CacheStoreExt for C {}
