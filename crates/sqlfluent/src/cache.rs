//! Read-result caching.
//!
//! [`CacheStore`] is the contract of an external key-value store. [`CacheGate`]
//! sits in front of read terminals: a fresh entry for the statement's key
//! short-circuits execution, a miss executes and stores the rows.

use crate::error::{SqlError, SqlResult};
use crate::log;
use crate::row::Row;
use crate::statement::Compiled;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Key-value store used to memoize read results.
pub trait CacheStore {
    fn has_item(&self, key: &str) -> bool;

    /// Whether an existing entry is past its TTL.
    fn has_expired(&self, key: &str) -> bool;

    fn get_item(&self, key: &str) -> Option<serde_json::Value>;

    /// Store `value`; `None` TTL means no expiry.
    fn set(&self, key: &str, value: serde_json::Value, ttl: Option<Duration>) -> SqlResult<()>;

    fn delete_item(&self, key: &str) -> bool;

    fn flush(&self);
}

/// A store that never holds anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCache;

impl CacheStore for NoCache {
    fn has_item(&self, _key: &str) -> bool {
        false
    }

    fn has_expired(&self, _key: &str) -> bool {
        false
    }

    fn get_item(&self, _key: &str) -> Option<serde_json::Value> {
        None
    }

    fn set(&self, _key: &str, _value: serde_json::Value, _ttl: Option<Duration>) -> SqlResult<()> {
        Ok(())
    }

    fn delete_item(&self, _key: &str) -> bool {
        false
    }

    fn flush(&self) {}
}

#[derive(Debug)]
struct Entry {
    value: serde_json::Value,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// In-process LRU store with per-entry expiry.
#[derive(Debug)]
pub struct MemoryCache {
    inner: Mutex<MemoryCacheInner>,
}

#[derive(Debug)]
struct MemoryCacheInner {
    capacity: usize,
    map: HashMap<String, Entry>,
    order: VecDeque<String>,
}

impl MemoryCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(MemoryCacheInner {
                capacity,
                map: HashMap::new(),
                order: VecDeque::new(),
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.lock().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryCacheInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new(256)
    }
}

impl MemoryCacheInner {
    fn touch(&mut self, key: &str) {
        if let Some(pos) = self.order.iter().position(|k| k.as_str() == key)
            && let Some(k) = self.order.remove(pos)
        {
            self.order.push_back(k);
        }
    }

    fn remove_from_order(&mut self, key: &str) {
        if let Some(pos) = self.order.iter().position(|k| k.as_str() == key) {
            let _ = self.order.remove(pos);
        }
    }

    fn evict_if_needed(&mut self) {
        if self.capacity == 0 {
            self.map.clear();
            self.order.clear();
            return;
        }

        while self.map.len() > self.capacity {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            let _ = self.map.remove(&oldest);
        }
    }
}

impl CacheStore for MemoryCache {
    fn has_item(&self, key: &str) -> bool {
        self.lock().map.contains_key(key)
    }

    fn has_expired(&self, key: &str) -> bool {
        self.lock()
            .map
            .get(key)
            .is_some_and(|e| e.is_expired(Instant::now()))
    }

    fn get_item(&self, key: &str) -> Option<serde_json::Value> {
        let mut inner = self.lock();
        let entry = inner.map.get(key)?;
        if entry.is_expired(Instant::now()) {
            return None;
        }
        let value = entry.value.clone();
        inner.touch(key);
        Some(value)
    }

    fn set(&self, key: &str, value: serde_json::Value, ttl: Option<Duration>) -> SqlResult<()> {
        let expires_at = match ttl {
            Some(ttl) => Some(
                Instant::now()
                    .checked_add(ttl)
                    .ok_or_else(|| SqlError::Cache(format!("ttl {ttl:?} is out of range")))?,
            ),
            None => None,
        };
        let mut inner = self.lock();
        if inner
            .map
            .insert(key.to_string(), Entry { value, expires_at })
            .is_some()
        {
            inner.touch(key);
        } else {
            inner.order.push_back(key.to_string());
        }
        inner.evict_if_needed();
        Ok(())
    }

    fn delete_item(&self, key: &str) -> bool {
        let mut inner = self.lock();
        let removed = inner.map.remove(key).is_some();
        if removed {
            inner.remove_from_order(key);
        }
        removed
    }

    fn flush(&self) {
        let mut inner = self.lock();
        inner.map.clear();
        inner.order.clear();
    }
}

/// Derive the cache key of a compiled read: `{prefix}:{hash}`.
///
/// The hash is BLAKE3 over the SQL text and the JSON encoding of each bind, so
/// keys stay valid across processes and toolchains sharing one store.
pub fn cache_key(prefix: &str, compiled: &Compiled) -> SqlResult<String> {
    let mut hasher = blake3::Hasher::new();
    hasher.update(compiled.sql.as_bytes());
    for (name, value) in compiled.binds.iter() {
        hasher.update(&[0]);
        hasher.update(name.as_bytes());
        hasher.update(&[0]);
        hasher.update(&serde_json::to_vec(value)?);
    }
    let hex = hasher.finalize().to_hex();
    Ok(format!("{prefix}:{}", &hex[..32]))
}

/// The cache check in front of read terminals.
pub struct CacheGate<'a, C: CacheStore + ?Sized> {
    store: &'a C,
}

impl<'a, C: CacheStore + ?Sized> CacheGate<'a, C> {
    pub fn new(store: &'a C) -> Self {
        Self { store }
    }

    /// Fresh cached rows for `key`, if any. Expired or undecodable entries are
    /// deleted and reported as misses.
    pub fn lookup(&self, key: &str) -> Option<Vec<Row>> {
        if !self.store.has_item(key) {
            log::cache_miss(key, false);
            return None;
        }
        if self.store.has_expired(key) {
            self.store.delete_item(key);
            log::cache_miss(key, true);
            return None;
        }
        let rows = self
            .store
            .get_item(key)
            .and_then(|value| serde_json::from_value::<Vec<Row>>(value).ok());
        match rows {
            Some(rows) => {
                log::cache_hit(key);
                Some(rows)
            }
            None => {
                self.store.delete_item(key);
                log::cache_miss(key, false);
                None
            }
        }
    }

    pub fn store(&self, key: &str, rows: &[Row], ttl: Option<Duration>) -> SqlResult<()> {
        self.store.set(key, serde_json::to_value(rows)?, ttl)
    }
}
