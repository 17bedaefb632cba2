//! Cache Module
//!
//! Cache-aside layer over the persistent store: per-key locking, codec
//! adapters for text, integers and protobuf messages, and hit/miss
//! statistics.

mod codec;
mod locks;
mod stats;
mod ttl;


pub use codec::{CodecRegistry, DecodeFn};
pub use locks::KeyLocks;
pub use stats::{CacheStats, StatsSnapshot};
pub use ttl::TtlCache;
