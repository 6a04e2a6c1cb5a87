// ABOUTME: Bounded in-memory cache with LRU eviction and per-entry TTL
// ABOUTME: Time is read through an injected Clock; a background task sweeps expired entries
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Exercise Metadata Cache
//!
//! [`TtlLruCache`] replaces a process-global map with an explicit object owned
//! by [`crate::resources::ServerResources`]. Entries expire lazily on read and
//! are swept periodically by a background task when a cleanup interval is
//! configured. Capacity overflow evicts the least recently used entry.

/// Injectable time source
pub mod clock;

use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use lru::LruCache;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, warn};

use crate::constants::cache::MAX_CACHE_TTL_SECS;

pub use clock::{Clock, ManualClock, SystemClock};

/// Cache entry with expiration
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Tuning for a [`TtlLruCache`]
#[derive(Debug, Clone, Copy)]
pub struct CacheConfig {
    /// Maximum live entries before LRU eviction
    pub max_entries: usize,
    /// Lifetime of each entry, capped at [`MAX_CACHE_TTL_SECS`]
    pub ttl: Duration,
    /// Period of the background expiry sweep; `None` disables it
    pub cleanup_interval: Option<Duration>,
}

type Store<K, V> = Arc<RwLock<LruCache<K, CacheEntry<V>>>>;

/// LRU cache whose entries expire after a fixed TTL
///
/// Cloning shares the underlying store. The sweep task exits once every
/// clone has been dropped.
#[derive(Clone)]
pub struct TtlLruCache<K: Hash + Eq, V> {
    store: Store<K, V>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
    shutdown_tx: Option<Arc<mpsc::Sender<()>>>,
}

impl<K, V> TtlLruCache<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Fallback capacity when configured with zero entries
    const DEFAULT_CAPACITY: NonZeroUsize = match NonZeroUsize::new(1000) {
        Some(n) => n,
        None => unreachable!(),
    };

    /// Create a cache reading time from `clock`
    ///
    /// The sweep task is only spawned when called inside a tokio runtime.
    #[must_use]
    pub fn new(config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        let capacity = NonZeroUsize::new(config.max_entries).unwrap_or(Self::DEFAULT_CAPACITY);
        let store: Store<K, V> = Arc::new(RwLock::new(LruCache::new(capacity)));

        let shutdown_tx = config
            .cleanup_interval
            .filter(|period| !period.is_zero())
            .and_then(|period| Self::spawn_cleanup(&store, &clock, period));

        Self {
            store,
            ttl: config.ttl.min(Duration::from_secs(MAX_CACHE_TTL_SECS)),
            clock,
            shutdown_tx,
        }
    }

    fn spawn_cleanup(
        store: &Store<K, V>,
        clock: &Arc<dyn Clock>,
        period: Duration,
    ) -> Option<Arc<mpsc::Sender<()>>> {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("No tokio runtime; cache cleanup task not started");
            return None;
        };

        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let store = store.clone();
        let clock = clock.clone();

        runtime.spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        Self::sweep(&store, clock.now()).await;
                    }
                    _ = shutdown_rx.recv() => {
                        debug!("Cache cleanup task stopped");
                        break;
                    }
                }
            }
        });

        Some(Arc::new(shutdown_tx))
    }

    async fn sweep(store: &Store<K, V>, now: Instant) -> usize {
        let mut guard = store.write().await;

        let expired_keys: Vec<K> = guard
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(k, _)| k.clone())
            .collect();

        for key in &expired_keys {
            guard.pop(key);
        }
        drop(guard);

        if !expired_keys.is_empty() {
            debug!("Purged {} expired cache entries", expired_keys.len());
        }
        expired_keys.len()
    }

    /// Fetch a live entry, dropping it if it has expired
    pub async fn get(&self, key: &K) -> Option<V> {
        let now = self.clock.now();
        let mut store = self.store.write().await;

        let expired = match store.get(key) {
            Some(entry) if !entry.is_expired(now) => return Some(entry.value.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            store.pop(key);
        }
        None
    }

    /// Insert or replace an entry with a fresh TTL
    pub async fn insert(&self, key: K, value: V) {
        let now = self.clock.now();
        let entry = CacheEntry {
            value,
            expires_at: now.checked_add(self.ttl).unwrap_or(now),
        };
        self.store.write().await.push(key, entry);
    }

    /// Remove one entry
    pub async fn invalidate(&self, key: &K) -> bool {
        self.store.write().await.pop(key).is_some()
    }

    /// Remove every entry, returning how many were dropped
    pub async fn invalidate_all(&self) -> usize {
        let mut store = self.store.write().await;
        let removed = store.len();
        store.clear();
        removed
    }

    /// Sweep expired entries now
    pub async fn purge_expired(&self) -> usize {
        Self::sweep(&self.store, self.clock.now()).await
    }

    /// Whether the background sweep is running
    #[must_use]
    pub fn has_cleanup_task(&self) -> bool {
        self.shutdown_tx.as_ref().is_some_and(|tx| !tx.is_closed())
    }

    /// Number of entries currently held, expired or not
    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    /// Whether the cache holds no entries
    pub async fn is_empty(&self) -> bool {
        self.store.read().await.is_empty()
    }
}
