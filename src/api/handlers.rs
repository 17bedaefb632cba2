//! API Handlers
//!
//! HTTP request handlers for each share service endpoint.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::Redirect,
    Json,
};
use regex::Regex;
use tracing::warn;

use crate::cache::TtlCache;
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{HealthResponse, RedirectParams, SignPackage, SignatureRequest, StatsResponse};
use crate::wx::WxJsSdk;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Generic cache, exposed here for the stats endpoint
    pub cache: Arc<TtlCache>,
    /// Signature provider
    pub sdk: Arc<WxJsSdk>,
    /// Compiled whitelist patterns matched against request hosts
    whitelist: Arc<Vec<Regex>>,
}

impl AppState {
    /// Creates a new AppState.
    ///
    /// Whitelist patterns that do not compile are skipped with a warning; a
    /// host is allowed when any remaining pattern matches it.
    pub fn new(cache: Arc<TtlCache>, sdk: Arc<WxJsSdk>, config: &Config) -> Self {
        let whitelist = config
            .whitelist_domains
            .iter()
            .filter_map(|pattern| match Regex::new(pattern) {
                Ok(regex) => Some(regex),
                Err(e) => {
                    warn!(pattern, error = %e, "skipping unparseable whitelist pattern");
                    None
                }
            })
            .collect();

        Self {
            cache,
            sdk,
            whitelist: Arc::new(whitelist),
        }
    }

    /// Returns whether `host` matches any whitelist pattern.
    fn is_whitelisted(&self, host: &str) -> bool {
        self.whitelist.iter().any(|regex| regex.is_match(host))
    }
}

/// Extracts the host of `url`, if it parses as an absolute URL.
fn host_of(url: &str) -> Option<String> {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_string))
}

/// Handler for POST /api/share/signature
///
/// Issues a JS-SDK signature package for a page URL whose host is
/// whitelisted. The URL is signed as the page reported it, minus any
/// surrounding whitespace.
pub async fn signature_handler(
    State(state): State<AppState>,
    Json(req): Json<SignatureRequest>,
) -> Result<Json<SignPackage>> {
    // Validate request
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let url = req.url.trim();
    let host = host_of(url)
        .ok_or_else(|| CacheError::InvalidRequest(format!("Not an absolute URL: {}", url)))?;
    if !state.is_whitelisted(&host) {
        return Err(CacheError::NotFound(format!("Host not allowed: {}", host)));
    }

    match state.sdk.sign_package(url).await? {
        Some(package) => Ok(Json(package)),
        None => Err(CacheError::NotFound("Signature unavailable".to_string())),
    }
}

/// Handler for GET /api/share/redirect
///
/// Redirects to a whitelisted target URL; anything else is not found.
pub async fn redirect_handler(
    State(state): State<AppState>,
    Query(params): Query<RedirectParams>,
) -> Result<Redirect> {
    let url = params.url.unwrap_or_default();
    let url = url.trim();

    match host_of(url) {
        Some(host) if state.is_whitelisted(&host) => Ok(Redirect::temporary(url)),
        _ => Err(CacheError::NotFound(format!(
            "Not a redirect target: {}",
            url
        ))),
    }
}

/// Handler for GET /stats
///
/// Returns current cache statistics.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::new(state.cache.stats()))
}

/// Handler for GET /health
///
/// Returns health status of the server.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
