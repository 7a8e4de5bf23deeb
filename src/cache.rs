use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

struct Entry {
    value: String,
    expires_at: Instant,
}

/// In-process key/value cache with a fixed TTL.
///
/// Built once at startup and handed to whoever needs it. Reads miss and
/// writes are dropped while the cache is disconnected or the TTL is zero.
pub struct TranscriptCache {
    ttl: Duration,
    capacity: usize,
    connected: AtomicBool,
    entries: RwLock<HashMap<String, Entry>>,
}

impl TranscriptCache {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            ttl,
            capacity,
            connected: AtomicBool::new(false),
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.ttl.is_zero() && self.capacity > 0 && self.connected.load(Ordering::Acquire)
    }

    pub async fn connect(&self) {
        self.connected.store(true, Ordering::Release);
        if self.ttl.is_zero() {
            info!("transcript cache disabled (ttl is zero)");
        } else {
            info!(ttl = ?self.ttl, capacity = self.capacity, "transcript cache ready");
        }
    }

    pub async fn disconnect(&self) {
        self.connected.store(false, Ordering::Release);
        let mut entries = self.entries.write().await;
        let dropped = entries.len();
        entries.clear();
        info!(dropped, "transcript cache disconnected");
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        if !self.is_enabled() {
            return None;
        }
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if entry.expires_at > Instant::now() => {
                    debug!(key, "cache hit");
                    return Some(entry.value.clone());
                }
                Some(_) => {}
                None => return None,
            }
        }
        let mut entries = self.entries.write().await;
        if entries.get(key).map_or(false, |e| e.expires_at <= Instant::now()) {
            entries.remove(key);
        }
        None
    }

    pub async fn set(&self, key: &str, value: String) {
        if !self.is_enabled() {
            return;
        }
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        if !entries.contains_key(key) && entries.len() >= self.capacity {
            entries.retain(|_, e| e.expires_at > now);
            if entries.len() >= self.capacity {
                let soonest = entries
                    .iter()
                    .min_by_key(|(_, e)| e.expires_at)
                    .map(|(k, _)| k.clone());
                if let Some(k) = soonest {
                    entries.remove(&k);
                }
            }
        }
        entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: now + self.ttl,
            },
        );
    }

    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.get(key).await?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "discarding undecodable cache entry");
                None
            }
        }
    }

    pub async fn set_json<T: Serialize>(&self, key: &str, value: &T) {
        match serde_json::to_string(value) {
            Ok(raw) => self.set(key, raw).await,
            Err(e) => warn!(key, error = %e, "could not encode cache entry"),
        }
    }
}
