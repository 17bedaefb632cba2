//! Request DTOs for the share API
//!
//! Defines the structure of incoming HTTP request bodies and query strings.

use serde::Deserialize;

/// Request body for the signature operation (POST /api/share/signature)
///
/// # Fields
/// - `url`: The page URL the JS-SDK signature must cover
#[derive(Debug, Clone, Deserialize)]
pub struct SignatureRequest {
    /// The URL to sign, exactly as the page reports it
    pub url: String,
}

impl SignatureRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.url.trim().is_empty() {
            return Some("Url cannot be empty".to_string());
        }
        None
    }
}

/// Query parameters for the redirect operation (GET /api/share/redirect)
#[derive(Debug, Clone, Deserialize)]
pub struct RedirectParams {
    /// Target URL, redirected to only when its host is whitelisted
    #[serde(default)]
    pub url: Option<String>,
}
