//! API Module
//!
//! HTTP handlers and routing for the share service REST API.
//!
//! # Endpoints
//! - `POST /api/share/signature` - Issue a JS-SDK signature package
//! - `GET /api/share/redirect` - Redirect to a whitelisted URL
//! - `GET /stats` - Get cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
