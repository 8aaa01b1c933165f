//! Bounded memoization for pipeline stages.
//!
//! Keys are blake3 hashes of a stage name plus the stage inputs. Entries are
//! evicted oldest-first once the capacity is reached, and expire after the
//! optional time-to-live.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Hash of a stage invocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey([u8; 32]);

impl CacheKey {
    /// Hash `stage` and every part, length-prefixed so part boundaries count.
    pub fn new<S: AsRef<str>>(stage: &str, parts: &[S]) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&(stage.len() as u64).to_le_bytes());
        hasher.update(stage.as_bytes());
        for part in parts {
            let bytes = part.as_ref().as_bytes();
            hasher.update(&(bytes.len() as u64).to_le_bytes());
            hasher.update(bytes);
        }
        CacheKey(*hasher.finalize().as_bytes())
    }
}

struct Entry<V> {
    value: V,
    inserted: Instant,
}

struct Inner<V> {
    map: HashMap<CacheKey, Entry<V>>,
    order: VecDeque<CacheKey>,
}

pub struct MemoCache<V> {
    capacity: usize,
    ttl: Option<Duration>,
    inner: Mutex<Inner<V>>,
}

impl<V: Clone> MemoCache<V> {
    /// A capacity of zero disables caching.
    pub fn new(capacity: usize, ttl: Option<Duration>) -> Self {
        MemoCache {
            capacity,
            ttl,
            inner: Mutex::new(Inner {
                map: HashMap::new(),
                order: VecDeque::new(),
            }),
        }
    }

    pub fn get(&self, key: &CacheKey) -> Option<V> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let expired = match inner.map.get(key) {
            None => return None,
            Some(entry) => self.ttl.is_some_and(|ttl| entry.inserted.elapsed() > ttl),
        };
        if expired {
            inner.map.remove(key);
            inner.order.retain(|k| k != key);
            return None;
        }
        inner.map.get(key).map(|e| e.value.clone())
    }

    pub fn insert(&self, key: CacheKey, value: V) {
        if self.capacity == 0 {
            return;
        }
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let entry = Entry {
            value,
            inserted: Instant::now(),
        };
        if inner.map.insert(key, entry).is_none() {
            inner.order.push_back(key);
        }
        while inner.map.len() > self.capacity {
            match inner.order.pop_front() {
                Some(oldest) => {
                    inner.map.remove(&oldest);
                }
                None => break,
            }
        }
    }

    /// Return the cached value or compute, store and return it.
    pub fn get_or_try_insert<E>(
        &self,
        key: CacheKey,
        compute: impl FnOnce() -> Result<V, E>,
    ) -> Result<V, E> {
        if let Some(hit) = self.get(&key) {
            log::trace!("cache hit");
            return Ok(hit);
        }
        let value = compute()?;
        self.insert(key, value.clone());
        Ok(value)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
