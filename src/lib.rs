//! ShareCache - a cache-aside persistence layer for WeChat share signatures
//!
//! Provides a persistent TTL cache with typed codec adapters, a media
//! metadata and attachment cache, and the credential refresh workflow
//! behind the WeChat JS-SDK share API.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod media;
pub mod models;
pub mod store;
pub mod tasks;
pub mod wx;

pub use api::AppState;
pub use cache::{CodecRegistry, TtlCache};
pub use config::Config;
pub use media::MediaCache;
pub use store::CacheStore;
pub use tasks::spawn_refresh_task;
pub use wx::{WxClient, WxJsSdk};
