//! Cache Store Module
//!
//! LMDB-backed persistent store holding the three named collections used by
//! the service: general entries, page metadata, and binary attachments.
//! Values are framed by [`StoredEntry`] so every record carries its write
//! time.

use std::path::Path;

use chrono::{DateTime, Utc};
use heed::byteorder::BigEndian;
use heed::types::{Bytes, Str, U32};
use heed::{Database, Env, EnvOpenOptions};
use tracing::debug;

use super::entry::StoredEntry;
use crate::error::Result;

// == Collection Names ==
const DEFAULT_DB: &str = "default";
const PAGES_DB: &str = "pages";
const ATTACHMENTS_DB: &str = "attachments";

const MAX_DBS: u32 = 3;

// == Cache Store ==
/// Persistent byte store with guarded upserts.
///
/// All operations are synchronous and a transaction never outlives a call,
/// so the store can safely sit behind an `Arc` shared between async tasks.
/// The environment is released when the store is dropped.
pub struct CacheStore {
    env: Env,
    default_db: Database<Str, Bytes>,
    pages_db: Database<Str, Bytes>,
    attachments_db: Database<U32<BigEndian>, Bytes>,
}

impl CacheStore {
    /// Opens (or creates) the store environment at `dir`.
    ///
    /// # Arguments
    /// * `dir` - Directory where the environment files live
    /// * `map_size_mb` - Maximum size of the environment in megabytes
    pub fn open<P: AsRef<Path>>(dir: P, map_size_mb: usize) -> Result<Self> {
        std::fs::create_dir_all(&dir)?;

        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size_mb * 1024 * 1024)
                .max_dbs(MAX_DBS)
                .open(dir.as_ref())
        }?;

        let mut wtxn = env.write_txn()?;
        let default_db: Database<Str, Bytes> = env.create_database(&mut wtxn, Some(DEFAULT_DB))?;
        let pages_db: Database<Str, Bytes> = env.create_database(&mut wtxn, Some(PAGES_DB))?;
        let attachments_db: Database<U32<BigEndian>, Bytes> =
            env.create_database(&mut wtxn, Some(ATTACHMENTS_DB))?;
        wtxn.commit()?;

        Ok(Self {
            env,
            default_db,
            pages_db,
            attachments_db,
        })
    }

    // == General Collection ==
    /// Looks up an entry in the general collection.
    ///
    /// An empty key is reported as absent; LMDB itself rejects zero-length
    /// keys.
    pub fn lookup(&self, key: &str) -> Result<Option<StoredEntry>> {
        if key.is_empty() {
            return Ok(None);
        }
        let rtxn = self.env.read_txn()?;
        let raw = self.default_db.get(&rtxn, key)?;
        Ok(raw.and_then(StoredEntry::from_bytes))
    }

    /// Writes an entry to the general collection.
    ///
    /// Guarded: returns `Ok(false)` without touching the store when the key
    /// is empty or whitespace-only, or the value is empty.
    pub fn upsert(&self, key: &str, value: &[u8], written_at: DateTime<Utc>) -> Result<bool> {
        if key.trim().is_empty() || value.is_empty() {
            debug!(key, "upsert rejected by guard");
            return Ok(false);
        }

        let raw = StoredEntry::new(value.to_vec(), written_at).to_bytes();
        let mut wtxn = self.env.write_txn()?;
        self.default_db.put(&mut wtxn, key, &raw)?;
        wtxn.commit()?;
        Ok(true)
    }

    // == Pages Collection ==
    /// Looks up a page metadata record. Empty keys are absent, as in
    /// [`Self::lookup`].
    pub fn pages_lookup(&self, key: &str) -> Result<Option<StoredEntry>> {
        if key.is_empty() {
            return Ok(None);
        }
        let rtxn = self.env.read_txn()?;
        let raw = self.pages_db.get(&rtxn, key)?;
        Ok(raw.and_then(StoredEntry::from_bytes))
    }

    /// Writes a page metadata record, with the same guard as [`Self::upsert`].
    pub fn pages_upsert(&self, key: &str, value: &[u8], written_at: DateTime<Utc>) -> Result<bool> {
        if key.trim().is_empty() || value.is_empty() {
            debug!(key, "pages upsert rejected by guard");
            return Ok(false);
        }

        let raw = StoredEntry::new(value.to_vec(), written_at).to_bytes();
        let mut wtxn = self.env.write_txn()?;
        self.pages_db.put(&mut wtxn, key, &raw)?;
        wtxn.commit()?;
        Ok(true)
    }

    // == Attachments Collection ==
    /// Looks up a binary attachment by id.
    pub fn attachment_lookup(&self, id: u32) -> Result<Option<StoredEntry>> {
        let rtxn = self.env.read_txn()?;
        let raw = self.attachments_db.get(&rtxn, &id)?;
        Ok(raw.and_then(StoredEntry::from_bytes))
    }

    /// Writes a binary attachment. The blob collection carries no emptiness
    /// guard; whatever payload the caller hands over is persisted.
    pub fn attachment_upsert(
        &self,
        id: u32,
        payload: &[u8],
        written_at: DateTime<Utc>,
    ) -> Result<()> {
        let raw = StoredEntry::new(payload.to_vec(), written_at).to_bytes();
        let mut wtxn = self.env.write_txn()?;
        self.attachments_db.put(&mut wtxn, &id, &raw)?;
        wtxn.commit()?;
        Ok(())
    }
}
