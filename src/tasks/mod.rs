//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Credential refresh: keeps the WeChat token and ticket written into the
//!   cache on a fixed interval

mod refresh;

pub use refresh::{run_refresh, spawn_refresh_task};
