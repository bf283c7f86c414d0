//! Expiring key-value storage for read bookkeeping
//!
//! The engine stores the newest timestamp seen in a log and the number of
//! entries newer than the last viewed one. Values are advisory and expire
//! after a TTL (600 seconds by default).

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::warn;

/// Default TTL for cached values (10 minutes)
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(600);

/// Generic expiring key-value store
pub trait ExpiringCache {
    fn get(&self, key: &str) -> Option<Value>;
    fn set(&self, key: &str, value: Value, ttl: Duration);
    fn remove(&self, key: &str);

    /// Read a timestamp stored with [`ExpiringCache::set_timestamp`]
    fn get_timestamp(&self, key: &str) -> Option<DateTime<Utc>> {
        self.get(key)
            .and_then(|value| serde_json::from_value(value).ok())
    }

    fn set_timestamp(&self, key: &str, ts: DateTime<Utc>, ttl: Duration) {
        self.set(key, Value::String(ts.to_rfc3339()), ttl);
    }
}

/// Cached value with its expiry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedValue {
    pub value: Value,
    pub expiration_timestamp: u64,
}

impl CachedValue {
    fn new(value: Value, ttl: Duration) -> Self {
        Self {
            value,
            expiration_timestamp: now_secs() + ttl.as_secs(),
        }
    }

    /// Check if the value is still valid (not expired)
    pub fn is_valid(&self) -> bool {
        self.expiration_timestamp > now_secs()
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// In-process cache
#[derive(Debug, Default)]
pub struct MemoryCache {
    values: RwLock<HashMap<String, CachedValue>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ExpiringCache for MemoryCache {
    fn get(&self, key: &str) -> Option<Value> {
        self.values
            .read()
            .get(key)
            .filter(|v| v.is_valid())
            .map(|v| v.value.clone())
    }

    fn set(&self, key: &str, value: Value, ttl: Duration) {
        let mut values = self.values.write();
        values.retain(|_, v| v.is_valid());
        values.insert(key.to_string(), CachedValue::new(value, ttl));
    }

    fn remove(&self, key: &str) {
        self.values.write().remove(key);
    }
}

/// Contents of the cache file
#[derive(Debug, Default, Serialize, Deserialize)]
struct CacheFile {
    values: HashMap<String, CachedValue>,
}

/// Cache persisted as JSON, so bookkeeping survives between CLI runs
#[derive(Debug)]
pub struct FileCache {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Load the cache file; a missing or corrupt file is an empty cache
    fn load(&self) -> CacheFile {
        fs::read_to_string(&self.path)
            .ok()
            .and_then(|content| serde_json::from_str(&content).ok())
            .unwrap_or_default()
    }

    fn save(&self, cache: &CacheFile) {
        if let Some(parent) = self.path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        let result = serde_json::to_string_pretty(cache)
            .map_err(std::io::Error::from)
            .and_then(|content| fs::write(&self.path, content));
        if let Err(err) = result {
            warn!(path = %self.path.display(), error = %err, "failed to write cache file");
        }
    }
}

impl ExpiringCache for FileCache {
    fn get(&self, key: &str) -> Option<Value> {
        let _guard = self.lock.lock();
        self.load()
            .values
            .remove(key)
            .filter(|v| v.is_valid())
            .map(|v| v.value)
    }

    fn set(&self, key: &str, value: Value, ttl: Duration) {
        let _guard = self.lock.lock();
        let mut cache = self.load();
        cache.values.retain(|_, v| v.is_valid());
        cache
            .values
            .insert(key.to_string(), CachedValue::new(value, ttl));
        self.save(&cache);
    }

    fn remove(&self, key: &str) {
        let _guard = self.lock.lock();
        let mut cache = self.load();
        if cache.values.remove(key).is_some() {
            self.save(&cache);
        }
    }
}

/// Cache key for a per-file value
pub fn cache_key(kind: &str, path: &Path) -> String {
    format!("{}:{}", kind, path.display())
}
