//! TTL Cache Module
//!
//! Cache-aside get-or-set over the persistent store. Freshness windows are
//! applied at read time, so the same key can be read with different
//! tolerances by different call sites; stale entries are never deleted,
//! only overwritten.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use prost::Message;
use tracing::warn;

use super::codec::{decode_i32, decode_text, encode_i32, CodecRegistry};
use super::locks::KeyLocks;
use super::stats::{CacheStats, StatsSnapshot};
use crate::error::{CacheError, Result};
use crate::store::CacheStore;

// == TTL Cache ==
/// Cache-aside layer over the general collection of a [`CacheStore`].
pub struct TtlCache {
    store: Arc<CacheStore>,
    registry: CodecRegistry,
    locks: KeyLocks<String>,
    stats: CacheStats,
}

impl TtlCache {
    /// Creates a cache over `store` using `registry` for message decoding.
    pub fn new(store: Arc<CacheStore>, registry: CodecRegistry) -> Self {
        Self {
            store,
            registry,
            locks: KeyLocks::new(),
            stats: CacheStats::new(),
        }
    }

    // == Raw Bytes ==
    /// Returns the cached bytes for `key` if fresh and non-empty, otherwise
    /// fetches, stores and returns the new value.
    ///
    /// The lookup/fetch/write sequence holds a per-key lock, so concurrent
    /// misses on one key run `fetch` at most once. A failed or empty fetch
    /// yields an empty byte sequence and writes nothing; a previously
    /// stored value stays in place for later reads.
    pub async fn get_or_set<F, Fut>(&self, key: &str, fetch: F, window: Duration) -> Result<Vec<u8>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<Vec<u8>>>,
    {
        let owned_key = key.to_string();
        let guard = self.locks.acquire(&owned_key).await;
        let result = self.get_or_set_locked(key, fetch, window).await;
        drop(guard);
        self.locks.release(&owned_key).await;
        result
    }

    async fn get_or_set_locked<F, Fut>(
        &self,
        key: &str,
        fetch: F,
        window: Duration,
    ) -> Result<Vec<u8>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<Vec<u8>>>,
    {
        if let Some(entry) = self.store.lookup(key)? {
            if !entry.value.is_empty() && entry.is_fresh(window) {
                self.stats.record_hit();
                return Ok(entry.value);
            }
        }
        self.stats.record_miss();

        let fetched = match fetch().await {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "fetch failed, treating value as unavailable");
                Vec::new()
            }
        };

        if !fetched.is_empty() && self.set(key, &fetched).await? {
            return Ok(fetched);
        }
        Ok(Vec::new())
    }

    /// Force-writes `value` under `key`, ignoring freshness.
    ///
    /// Returns false when the guard rejects the write (empty or whitespace
    /// key, or empty value).
    pub async fn set(&self, key: &str, value: &[u8]) -> Result<bool> {
        let stored = self.store.upsert(key, value, Utc::now())?;
        if stored {
            self.stats.record_write();
        } else {
            self.stats.record_rejected_write();
        }
        Ok(stored)
    }

    // == Text Codec ==
    /// Text variant of [`Self::get_or_set`]; an unavailable value is the
    /// empty string. A stored non-empty value that is not valid UTF-8 is a
    /// decode error.
    pub async fn get_or_set_text<F, Fut>(
        &self,
        key: &str,
        fetch: F,
        window: Duration,
    ) -> Result<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<String>>,
    {
        let bytes = self
            .get_or_set(key, || async move { Ok(fetch().await?.into_bytes()) }, window)
            .await?;
        if bytes.is_empty() {
            return Ok(String::new());
        }
        decode_text(key, bytes)
    }

    /// Force-writes a text value. Whitespace-only text is rejected like an
    /// empty value.
    pub async fn set_text(&self, key: &str, value: &str) -> Result<bool> {
        if value.trim().is_empty() {
            self.stats.record_rejected_write();
            return Ok(false);
        }
        self.set(key, value.as_bytes()).await
    }

    // == Integer Codec ==
    /// i32 variant of [`Self::get_or_set`]; an unavailable value is `None`.
    /// A stored value that is not exactly 4 bytes is a decode error.
    pub async fn get_or_set_i32<F, Fut>(
        &self,
        key: &str,
        fetch: F,
        window: Duration,
    ) -> Result<Option<i32>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<Option<i32>>>,
    {
        let bytes = self
            .get_or_set(
                key,
                || async move {
                    Ok(match fetch().await? {
                        Some(value) => encode_i32(value),
                        None => Vec::new(),
                    })
                },
                window,
            )
            .await?;
        if bytes.is_empty() {
            return Ok(None);
        }
        decode_i32(key, &bytes).map(Some)
    }

    /// Force-writes an i32 value.
    pub async fn set_i32(&self, key: &str, value: i32) -> Result<bool> {
        self.set(key, &encode_i32(value)).await
    }

    // == Message Codec ==
    /// Message variant of [`Self::get_or_set`]; an unavailable value is
    /// `None`.
    ///
    /// The decoder for `T` is resolved from the registry before any store
    /// access, so an unregistered type fails fast even on a would-be hit.
    pub async fn get_or_set_message<T, F, Fut>(
        &self,
        key: &str,
        fetch: F,
        window: Duration,
    ) -> Result<Option<T>>
    where
        T: Message + Default + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<Option<T>>>,
    {
        let decode = self.registry.decoder::<T>()?;

        let bytes = self
            .get_or_set(
                key,
                || async move {
                    Ok(match fetch().await? {
                        Some(message) => message.encode_to_vec(),
                        None => Vec::new(),
                    })
                },
                window,
            )
            .await?;
        if bytes.is_empty() {
            return Ok(None);
        }
        decode(&bytes)
            .map(Some)
            .map_err(|e| CacheError::Decode(format!("key '{}': {}", key, e)))
    }

    /// Force-writes an encoded message.
    ///
    /// A message that encodes to zero bytes (every field at its default) is
    /// rejected like an empty value.
    pub async fn set_message<T: Message>(&self, key: &str, value: &T) -> Result<bool> {
        self.set(key, &value.encode_to_vec()).await
    }

    // == Stats ==
    /// Returns a snapshot of the hit/miss/write counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }
}
