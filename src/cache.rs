//! Two-tier document cache.
//!
//! A bounded process-local tier backed by `moka` sits in front of a
//! shared TTL store that outlives the process and is visible to other
//! instances. The local tier is authoritative within a process: any
//! create/update overwrites it synchronously, so a subsequent `get` in
//! the same process observes the new value immediately. Cross-process
//! visibility is only as fresh as the shared tier's entry, so it is
//! eventual rather than linearizable. The shared tier is never
//! authoritative and all of its failures degrade silently to a miss.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::sync::Cache;
use parking_lot::RwLock;
use serde_json::Value;
use tracing::warn;

use crate::config::CacheConfig;
use crate::error::CacheError;

/// Shared cache store: string key/value with per-entry TTL.
#[async_trait]
pub trait SharedCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    async fn flush(&self) -> Result<(), CacheError>;
}

/// In-memory shared-tier implementation for tests and single-process
/// deployments.
pub struct MemorySharedCache {
    entries: RwLock<HashMap<String, (String, Instant)>>,
}

impl MemorySharedCache {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemorySharedCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SharedCache for MemorySharedCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let expired = {
            let entries = self.entries.read();
            match entries.get(key) {
                Some((value, expires_at)) if *expires_at > Instant::now() => {
                    return Ok(Some(value.clone()));
                }
                Some(_) => true,
                None => false,
            }
        };
        if expired {
            self.entries.write().remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        self.entries
            .write()
            .insert(key.to_string(), (value.to_string(), Instant::now() + ttl));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.entries.write().remove(key);
        Ok(())
    }

    async fn flush(&self) -> Result<(), CacheError> {
        self.entries.write().clear();
        Ok(())
    }
}

/// The two-tier cache used by every access layer.
pub struct TieredCache {
    local: Cache<String, Value>,
    shared: Arc<dyn SharedCache>,
    default_ttl: Duration,
}

impl TieredCache {
    pub fn new(config: &CacheConfig, shared: Arc<dyn SharedCache>) -> Self {
        Self {
            local: Cache::builder().max_capacity(config.local_capacity).build(),
            shared,
            default_ttl: Duration::from_secs(config.shared_ttl_secs),
        }
    }

    /// Look up a key: local tier first, then the shared tier. A shared
    /// hit is decoded (undecodable values pass through as raw strings)
    /// and promoted into the local tier.
    pub async fn get(&self, key: &str) -> Option<Value> {
        if let Some(value) = self.local.get(key) {
            return Some(value);
        }

        match self.shared.get(key).await {
            Ok(Some(raw)) => {
                let value =
                    serde_json::from_str(&raw).unwrap_or_else(|_| Value::String(raw.clone()));
                self.local.insert(key.to_string(), value.clone());
                Some(value)
            }
            Ok(None) => None,
            Err(e) => {
                warn!(key = %key, error = %e, "shared cache read failed; treating as miss");
                None
            }
        }
    }

    /// Write a value through both tiers with the default TTL.
    pub async fn set(&self, key: &str, value: Value) {
        self.set_with_ttl(key, value, self.default_ttl).await;
    }

    /// Write a value through both tiers. The local tier is updated
    /// unconditionally before the shared write, so readers in this
    /// process observe the new value immediately; the shared write is
    /// best-effort.
    pub async fn set_with_ttl(&self, key: &str, value: Value, ttl: Duration) {
        self.local.insert(key.to_string(), value.clone());

        let encoded = match &value {
            Value::String(s) => s.clone(),
            other => match serde_json::to_string(other) {
                Ok(s) => s,
                Err(e) => {
                    warn!(key = %key, error = %e, "failed to encode value for shared cache");
                    return;
                }
            },
        };
        if let Err(e) = self.shared.set(key, &encoded, ttl).await {
            warn!(key = %key, error = %e, "shared cache write failed");
        }
    }

    /// Remove a key from both tiers. This is the only invalidation path:
    /// updates overwrite entries instead of expelling them, so no entry
    /// is ever left holed.
    pub async fn expel(&self, key: &str) {
        self.local.invalidate(key);
        if let Err(e) = self.shared.delete(key).await {
            warn!(key = %key, error = %e, "shared cache delete failed");
        }
    }

    /// Drop every local-tier entry. Shared-tier entries survive.
    pub fn clear_local(&self) {
        self.local.invalidate_all();
    }

    /// Flush the shared tier, best-effort.
    pub async fn flush_shared(&self) {
        if let Err(e) = self.shared.flush().await {
            warn!(error = %e, "shared cache flush failed");
        }
    }
}
