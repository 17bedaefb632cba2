//! Media Cache Module
//!
//! Specialized cache for remote media resources: page listings with a
//! stale-fallback policy, and large binary attachments keyed by content id.
//! Both sides share the persistent store but are policied independently of
//! the generic cache.

use std::future::Future;
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use prost::Message;
use tracing::{debug, warn};

use crate::cache::KeyLocks;
use crate::error::{CacheError, Result};
use crate::models::PageList;
use crate::store::CacheStore;

// == Media Cache ==
/// Cache for page listings and binary attachments.
///
/// Page listings decode as [`PageList`] and fall back to the previously
/// stored listing when a refetch produces nothing usable. Attachments hand
/// out a fresh in-memory copy on every hit, so a caller can never mutate
/// the persisted payload through a shared handle.
pub struct MediaCache {
    store: Arc<CacheStore>,
    page_locks: KeyLocks<String>,
    attachment_locks: KeyLocks<u32>,
}

impl MediaCache {
    /// Creates a media cache over `store`.
    pub fn new(store: Arc<CacheStore>) -> Self {
        Self {
            store,
            page_locks: KeyLocks::new(),
            attachment_locks: KeyLocks::new(),
        }
    }

    // == Page Listings ==
    /// Returns the cached listing for `key` if fresh, otherwise refetches.
    ///
    /// A fetched listing with at least one item replaces the stored one.
    /// When the fetch fails or comes back empty, the previously stored
    /// listing is served even if stale; only when nothing was ever stored
    /// does the result become `None`.
    pub async fn pages_get_or_set<F, Fut>(
        &self,
        key: &str,
        fetch: F,
        window: Duration,
    ) -> Result<Option<PageList>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<PageList>>,
    {
        let owned_key = key.to_string();
        let guard = self.page_locks.acquire(&owned_key).await;
        let result = self.pages_locked(key, fetch, window).await;
        drop(guard);
        self.page_locks.release(&owned_key).await;
        result
    }

    async fn pages_locked<F, Fut>(
        &self,
        key: &str,
        fetch: F,
        window: Duration,
    ) -> Result<Option<PageList>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<PageList>>,
    {
        let prior = self.store.pages_lookup(key)?;

        if let Some(entry) = &prior {
            if !entry.value.is_empty() && entry.is_fresh(window) {
                return decode_pages(key, &entry.value).map(Some);
            }
        }

        match fetch().await {
            Ok(list) if !list.items.is_empty() => {
                if !self.store.pages_upsert(key, &list.encode_to_vec(), Utc::now())? {
                    debug!(key, "pages upsert rejected by guard");
                }
                return Ok(Some(list));
            }
            Ok(_) => debug!(key, "pages fetch returned an empty listing"),
            Err(e) => warn!(key, error = %e, "pages fetch failed"),
        }

        // The fetch produced nothing usable; serve the stored listing even
        // when it is stale
        match prior {
            Some(entry) if !entry.value.is_empty() => decode_pages(key, &entry.value).map(Some),
            _ => Ok(None),
        }
    }

    // == Attachments ==
    /// Returns the attachment payload for `id` as a readable stream.
    ///
    /// A fresh hit is answered from the store with a copied payload. On a
    /// miss or stale entry the fetch runs; a present result is rewound,
    /// persisted under `id` and returned. An absent or failed fetch leaves
    /// the store untouched and yields `None`.
    pub async fn attachment_get_or_set<F, Fut>(
        &self,
        id: u32,
        fetch: F,
        window: Duration,
    ) -> Result<Option<Cursor<Vec<u8>>>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<Option<Cursor<Vec<u8>>>>>,
    {
        let guard = self.attachment_locks.acquire(&id).await;
        let result = self.attachment_locked(id, fetch, window).await;
        drop(guard);
        self.attachment_locks.release(&id).await;
        result
    }

    async fn attachment_locked<F, Fut>(
        &self,
        id: u32,
        fetch: F,
        window: Duration,
    ) -> Result<Option<Cursor<Vec<u8>>>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<Option<Cursor<Vec<u8>>>>>,
    {
        // One lookup covers both the freshness check and the payload read
        if let Some(entry) = self.store.attachment_lookup(id)? {
            if entry.is_fresh(window) {
                return Ok(Some(Cursor::new(entry.value)));
            }
        }

        match fetch().await {
            Ok(Some(mut stream)) => {
                stream.set_position(0);
                self.store
                    .attachment_upsert(id, stream.get_ref(), Utc::now())?;
                Ok(Some(stream))
            }
            Ok(None) => Ok(None),
            Err(e) => {
                warn!(id, error = %e, "attachment fetch failed");
                Ok(None)
            }
        }
    }
}

fn decode_pages(key: &str, raw: &[u8]) -> Result<PageList> {
    PageList::decode(raw).map_err(|e| CacheError::Decode(format!("key '{}': {}", key, e)))
}
