use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use deadpool_redis::Pool;
use deadpool_redis::redis::AsyncCommands;
use tracing::warn;

use crate::domain::repository::EntityCache;
use crate::domain::types::CacheGroup;

fn cache_key(group: CacheGroup, key: &str) -> String {
    format!("botaskaf:{}:{}", group.as_str(), key)
}

// ── Redis ────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct RedisEntityCache {
    pub pool: Pool,
}

impl EntityCache for RedisEntityCache {
    async fn get_by_key(&self, group: CacheGroup, key: &str) -> Option<Vec<u8>> {
        let mut conn = match self.pool.get().await {
            Ok(conn) => conn,
            Err(e) => {
                warn!(error = %e, group = group.as_str(), "cache unavailable");
                return None;
            }
        };
        let value: Result<Option<Vec<u8>>, _> = conn.get(cache_key(group, key)).await;
        value
            .inspect_err(|e| warn!(error = %e, group = group.as_str(), key, "cache read failed"))
            .ok()
            .flatten()
    }

    async fn set_by_key(&self, group: CacheGroup, key: &str, value: Vec<u8>, ttl: Duration) {
        let mut conn = match self.pool.get().await {
            Ok(conn) => conn,
            Err(e) => {
                warn!(error = %e, group = group.as_str(), "cache unavailable");
                return;
            }
        };
        let result: Result<(), deadpool_redis::redis::RedisError> = conn
            .set_ex(cache_key(group, key), value, ttl.as_secs().max(1))
            .await;
        if let Err(e) = result {
            warn!(error = %e, group = group.as_str(), key, "cache write failed");
        }
    }
}

// ── In-process ───────────────────────────────────────────────────────────────

/// Inserts between sweeps of expired entries.
pub const SWEEP_EVERY: usize = 64;

/// Process-local cache for single-instance deployments.
#[derive(Clone, Default)]
pub struct MemoryEntityCache {
    entries: Arc<DashMap<String, (Instant, Vec<u8>)>>,
    inserts: Arc<AtomicUsize>,
}

impl MemoryEntityCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every expired entry, read or not.
    pub fn purge_expired(&self) {
        let now = Instant::now();
        self.entries.retain(|_, (expires, _)| *expires > now);
    }
}

impl EntityCache for MemoryEntityCache {
    async fn get_by_key(&self, group: CacheGroup, key: &str) -> Option<Vec<u8>> {
        let key = cache_key(group, key);
        let now = Instant::now();
        match self.entries.get(&key) {
            None => return None,
            Some(entry) if entry.0 > now => return Some(entry.1.clone()),
            Some(_) => {}
        }
        // Expired. The read guard must be gone before removing.
        self.entries.remove_if(&key, |_, (expires, _)| *expires <= now);
        None
    }

    async fn set_by_key(&self, group: CacheGroup, key: &str, value: Vec<u8>, ttl: Duration) {
        self.entries
            .insert(cache_key(group, key), (Instant::now() + ttl, value));
        if (self.inserts.fetch_add(1, Ordering::Relaxed) + 1) % SWEEP_EVERY == 0 {
            self.purge_expired();
        }
    }
}

// ── Selection ────────────────────────────────────────────────────────────────

/// Cache backend chosen at startup.
#[derive(Clone)]
pub enum AppCache {
    None,
    Memory(MemoryEntityCache),
    Redis(RedisEntityCache),
}

impl EntityCache for AppCache {
    async fn get_by_key(&self, group: CacheGroup, key: &str) -> Option<Vec<u8>> {
        match self {
            Self::None => None,
            Self::Memory(cache) => cache.get_by_key(group, key).await,
            Self::Redis(cache) => cache.get_by_key(group, key).await,
        }
    }

    async fn set_by_key(&self, group: CacheGroup, key: &str, value: Vec<u8>, ttl: Duration) {
        match self {
            Self::None => {}
            Self::Memory(cache) => cache.set_by_key(group, key, value, ttl).await,
            Self::Redis(cache) => cache.set_by_key(group, key, value, ttl).await,
        }
    }
}
