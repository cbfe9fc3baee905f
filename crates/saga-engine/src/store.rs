use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::Instant;

use crate::error::StoreError;

/// Durable key-value store that receives terminal execution records.
#[async_trait]
pub trait ExecutionStore: Send + Sync {
    /// Write `value` under `key`, expiring after `ttl`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the write.
    async fn put(&self, key: &str, value: String, ttl: Duration) -> Result<(), StoreError>;

    /// Read the value under `key`, if present and not expired.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
}

#[derive(Debug)]
struct Entry {
    value: String,
    ttl: Duration,
    expires_at: Instant,
}

/// In-process store with per-entry expiry.
///
/// Expiry follows the tokio clock, so paused-time tests can advance past it.
/// Expired entries are dropped on every write and by
/// [`purge_expired`](Self::purge_expired).
#[derive(Debug, Default)]
pub struct InMemoryExecutionStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl InMemoryExecutionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// TTL the entry was written with, if it is still live.
    #[must_use]
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        let entries = self.entries.lock();
        entries
            .get(key)
            .filter(|entry| entry.expires_at > Instant::now())
            .map(|entry| entry.ttl)
    }

    /// Keys of all live entries, sorted.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let now = Instant::now();
        let entries = self.entries.lock();
        let mut keys: Vec<String> = entries
            .iter()
            .filter(|(_, entry)| entry.expires_at > now)
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        keys
    }

    /// Drop expired entries, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        before - entries.len()
    }
}

#[async_trait]
impl ExecutionStore for InMemoryExecutionStore {
    async fn put(&self, key: &str, value: String, ttl: Duration) -> Result<(), StoreError> {
        let expires_at = Instant::now()
            .checked_add(ttl)
            .ok_or_else(|| StoreError::Backend {
                key: key.to_string(),
                message: format!("ttl {ttl:?} is out of range"),
            })?;
        let mut entries = self.entries.lock();
        let now = Instant::now();
        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(
            key.to_string(),
            Entry {
                value,
                ttl,
                expires_at,
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.lock();
        Ok(entries
            .get(key)
            .filter(|entry| entry.expires_at > Instant::now())
            .map(|entry| entry.value.clone()))
    }
}
