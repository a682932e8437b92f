//! In-memory [`CacheStore`] with lazy expiry.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::trace;

use super::{CacheResult, CacheStore};

/// Time source for expiry checks.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Current instant
    fn now(&self) -> Instant;
}

/// Wall-clock [`Clock`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Manually advanced [`Clock`] for deterministic expiry tests.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    offset: Mutex<Duration>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }
}

impl ManualClock {
    /// Create a clock frozen at the current instant.
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(|e| e.into_inner());
        *offset += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let offset = *self.offset.lock().unwrap_or_else(|e| e.into_inner());
        self.origin + offset
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    payload: Vec<u8>,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Thread-safe in-memory cache.
///
/// A single mutex guards the table; critical sections only touch the map.
#[derive(Debug)]
pub struct ExpiringCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    clock: Arc<dyn Clock>,
}

impl Default for ExpiringCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ExpiringCache {
    /// Create an empty cache on the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create an empty cache on a custom clock.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Number of stored entries, expired-but-unread ones included.
    pub fn len(&self) -> usize {
        self.table().len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.table().is_empty()
    }

    // Entries are plain data, so a panic elsewhere cannot leave them half-written.
    fn table(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl CacheStore for ExpiringCache {
    fn put(&self, key: &str, payload: Vec<u8>, ttl: Duration) -> CacheResult<()> {
        let expires_at = if ttl.is_zero() {
            None
        } else {
            self.clock.now().checked_add(ttl)
        };

        trace!(key, bytes = payload.len(), ?ttl, "cache put");
        self.table()
            .insert(key.to_string(), CacheEntry { payload, expires_at });
        Ok(())
    }

    fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        let now = self.clock.now();
        let mut table = self.table();

        match table.get(key) {
            None => return Ok(None),
            Some(entry) if !entry.is_expired(now) => return Ok(Some(entry.payload.clone())),
            Some(_) => {}
        }

        table.remove(key);
        trace!(key, "cache entry expired");
        Ok(None)
    }

    fn remove(&self, key: &str) {
        self.table().remove(key);
    }

    fn clear(&self) {
        self.table().clear();
    }
}
