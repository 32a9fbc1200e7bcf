//! Bounded least-recently-used cache of compiled plugin sets.
//!
//! Entries are keyed by a hash of the plugin's normalized source, so
//! reformatting a plugin or editing its comments never triggers a
//! recompile. Lookups and inserts both count as use; inserting past
//! capacity evicts the entry touched longest ago.

use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Default number of cached plugin sets.
pub const DEFAULT_CAPACITY: usize = 10;

/// Hash of a plugin's normalized source.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey([u8; 32]);

impl CacheKey {
    /// Key for plugin source text.
    pub fn from_source(source: &str) -> Self {
        let normalized = genplay_syntax::normalize_key(source);
        let mut hasher = Sha256::new();
        hasher.update(normalized.as_bytes());
        Self(hasher.finalize().into())
    }

    /// Raw digest.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0[..6] {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CacheKey({self})")
    }
}

#[derive(Debug)]
struct State<V> {
    entries: HashMap<CacheKey, Arc<V>>,
    /// Least recently used first.
    order: VecDeque<CacheKey>,
}

impl<V> State<V> {
    fn touch(&mut self, key: &CacheKey) {
        if let Some(position) = self.order.iter().position(|k| k == key) {
            self.order.remove(position);
        }
        self.order.push_back(*key);
    }
}

/// Thread-safe LRU map from [`CacheKey`] to shared values.
#[derive(Debug)]
pub struct PluginCache<V> {
    capacity: usize,
    state: Mutex<State<V>>,
}

impl<V> PluginCache<V> {
    /// Cache holding at most `capacity` entries. A capacity of zero
    /// disables caching.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            state: Mutex::new(State {
                entries: HashMap::new(),
                order: VecDeque::new(),
            }),
        }
    }

    /// Maximum number of entries.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Look up `key`, marking it most recently used.
    pub fn get(&self, key: &CacheKey) -> Option<Arc<V>> {
        let mut state = self.state.lock();
        let value = state.entries.get(key).cloned()?;
        state.touch(key);
        Some(value)
    }

    /// Whether `key` is cached, without touching it.
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.state.lock().entries.contains_key(key)
    }

    /// Insert or replace `key`, evicting least recently used entries past
    /// capacity. Returns the evicted keys.
    pub fn insert(&self, key: CacheKey, value: Arc<V>) -> Vec<CacheKey> {
        if self.capacity == 0 {
            return Vec::new();
        }
        let mut state = self.state.lock();
        state.entries.insert(key, value);
        state.touch(&key);

        let mut evicted = Vec::new();
        while state.order.len() > self.capacity {
            let Some(oldest) = state.order.pop_front() else {
                break;
            };
            state.entries.remove(&oldest);
            info!(key = %oldest, "evicted plugin set");
            evicted.push(oldest);
        }
        debug!(key = %key, entries = state.entries.len(), "cached plugin set");
        evicted
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    /// True if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keys from least to most recently used.
    pub fn keys(&self) -> Vec<CacheKey> {
        self.state.lock().order.iter().copied().collect()
    }

    /// Drop every entry.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.entries.clear();
        state.order.clear();
    }
}

impl<V> Default for PluginCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
