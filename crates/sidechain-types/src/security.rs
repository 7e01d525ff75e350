//! # Replay protection primitives
//!
//! The handshake hands out a fresh random `authToken` per
//! challenge and the round-proposal protocol is driven by a 3-second tick;
//! both need a bounded, thread-safe "have I seen this before" cache. This
//! module is the one place that logic lives, reused by both the handshake
//! authenticator and the bus's duplicate-delivery guard.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// How long a seen nonce/authToken is remembered before it can be reused.
pub const NONCE_CACHE_TTL: Duration = Duration::from_secs(120);

/// Forced cleanup threshold to bound memory under a replay flood.
pub const MAX_NONCE_CACHE_SIZE: usize = 100_000;

/// Thread-safe cache of recently-seen nonces, for replay prevention.
///
/// Used both for the handshake's `authToken`  and for
/// de-duplicating round-proposal messages arriving more than once from the
/// same peer.
#[derive(Debug)]
pub struct NonceCache {
    cache: RwLock<HashMap<Uuid, Instant>>,
}

impl NonceCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Create a cache wrapped for shared ownership across tasks.
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Returns `true` if `nonce` is fresh (and records it); `false` if it is
    /// a replay of something still within its TTL.
    pub fn check_and_insert(&self, nonce: Uuid) -> bool {
        let now = Instant::now();
        let expiry = now + NONCE_CACHE_TTL;

        let mut cache = match self.cache.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if cache.len() >= MAX_NONCE_CACHE_SIZE {
            cache.retain(|_, exp| *exp > now);
        }

        if let Some(&exp) = cache.get(&nonce) {
            if exp > now {
                return false;
            }
        }

        cache.insert(nonce, expiry);
        true
    }

    /// Clears all cached nonces. Tests only.
    pub fn clear(&self) {
        if let Ok(mut cache) = self.cache.write() {
            cache.clear();
        }
    }

    /// Number of cached nonces.
    pub fn len(&self) -> usize {
        self.cache.read().map(|c| c.len()).unwrap_or(0)
    }

    /// `true` if no nonces are cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for NonceCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Current Unix timestamp in seconds. Never panics: returns 0 if the system
/// clock is somehow before the epoch.
pub fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
