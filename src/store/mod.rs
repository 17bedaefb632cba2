//! Store Module
//!
//! Persistent LMDB-backed byte store with timestamped, guarded entries.

mod db;
mod entry;

// Re-export public types
pub use db::CacheStore;
pub use entry::StoredEntry;
