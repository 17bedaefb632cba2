//! Request, response and stored-message models for the share service
//!
//! This module defines the DTOs (Data Transfer Objects) used for HTTP
//! request/response bodies and the protobuf messages persisted through
//! the cache.

pub mod messages;
pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use messages::{PageItem, PageList, SignPackage};
pub use requests::{RedirectParams, SignatureRequest};
pub use responses::{ErrorResponse, HealthResponse, StatsResponse};
