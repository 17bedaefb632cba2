//! Stored Entry Module
//!
//! On-disk framing for cached values: an 8-byte little-endian write
//! timestamp (unix milliseconds) followed by the payload bytes.

use std::time::Duration;

use chrono::{DateTime, Utc};

// == Stored Entry ==
/// A value read from or written to the store, together with its write time.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredEntry {
    /// The stored payload
    pub value: Vec<u8>,
    /// When the payload was written
    pub written_at: DateTime<Utc>,
}

impl StoredEntry {
    /// Creates an entry from a payload and its write time.
    pub fn new(value: Vec<u8>, written_at: DateTime<Utc>) -> Self {
        Self { value, written_at }
    }

    // == Freshness ==
    /// Whether this entry is still fresh for the given window.
    ///
    /// Freshness is strict: an entry exactly `window` old is stale, and a
    /// zero window never matches. Entries written in the future (clock skew)
    /// count as age zero.
    pub fn is_fresh(&self, window: Duration) -> bool {
        self.age() < window
    }

    /// Age of the entry, clamped at zero for future write times.
    pub fn age(&self) -> Duration {
        let now = Utc::now();
        if now > self.written_at {
            (now - self.written_at).to_std().unwrap_or(Duration::ZERO)
        } else {
            Duration::ZERO
        }
    }

    // == Framing ==
    /// Encodes the entry as `[timestamp millis: 8 bytes LE][payload]`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let timestamp_bytes = self.written_at.timestamp_millis().to_le_bytes();
        let mut raw = Vec::with_capacity(8 + self.value.len());
        raw.extend_from_slice(&timestamp_bytes);
        raw.extend_from_slice(&self.value);
        raw
    }

    /// Decodes a raw record.
    ///
    /// Records too short to carry a timestamp decode as absent rather than
    /// as an error, so a corrupt record behaves like a miss.
    pub fn from_bytes(raw: &[u8]) -> Option<Self> {
        if raw.len() < 8 {
            return None;
        }
        let timestamp_bytes: [u8; 8] = raw[0..8].try_into().ok()?;
        let timestamp_millis = i64::from_le_bytes(timestamp_bytes);
        let written_at = DateTime::from_timestamp_millis(timestamp_millis).unwrap_or_else(Utc::now);
        Some(Self {
            value: raw[8..].to_vec(),
            written_at,
        })
    }
}
