//! WeChat JS-SDK Module
//!
//! Signature packages and credential refresh for the WeChat JS-SDK. All
//! credential state lives in the generic cache: the access token and the
//! ticket derived from it are cached with a safety margin under their
//! well-known keys, and signature packages are cached per URL for a few
//! minutes.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use sha1::{Digest, Sha1};
use tracing::warn;

use super::client::CredentialSource;
use crate::cache::TtlCache;
use crate::error::Result;
use crate::models::SignPackage;

// == Cache Keys ==
/// Cache key of the current access token
pub const ACCESS_TOKEN_KEY: &str = "WxAccessToken";

/// Cache key of the current JS-API ticket
pub const JSAPI_TICKET_KEY: &str = "WxJsApiTicket";

/// Sign packages are cached under this prefix followed by the signed URL
const SIGN_PACKAGE_PREFIX: &str = "sp";

// == Freshness Windows ==
/// Upstream credentials live 7200 seconds; 3500 keeps a full refresh cycle
/// of margin below half that
const CREDENTIAL_WINDOW: Duration = Duration::from_secs(3500);

/// Sign packages are valid briefly so a stolen one ages out fast
const SIGN_PACKAGE_WINDOW: Duration = Duration::from_secs(300);

const NONCE_MIN_LEN: usize = 6;
const NONCE_MAX_LEN: usize = 10;

// == JS-SDK ==
/// WeChat JS-SDK signature provider.
pub struct WxJsSdk {
    cache: Arc<TtlCache>,
    source: Arc<dyn CredentialSource>,
    app_id: String,
}

impl WxJsSdk {
    /// Creates an SDK for the application identified by `app_id`.
    pub fn new(
        cache: Arc<TtlCache>,
        source: Arc<dyn CredentialSource>,
        app_id: impl Into<String>,
    ) -> Self {
        Self {
            cache,
            source,
            app_id: app_id.into(),
        }
    }

    // == Sign Packages ==
    /// Returns the signature package for `url`, or `None` when no ticket is
    /// currently available.
    ///
    /// Packages are cached per URL, so repeated requests for one page reuse
    /// the same nonce and timestamp until the package ages out.
    pub async fn sign_package(&self, url: &str) -> Result<Option<SignPackage>> {
        let key = format!("{}{}", SIGN_PACKAGE_PREFIX, url);
        self.cache
            .get_or_set_message(&key, || self.build_sign_package(url), SIGN_PACKAGE_WINDOW)
            .await
    }

    async fn build_sign_package(&self, url: &str) -> anyhow::Result<Option<SignPackage>> {
        let ticket = self.cached_ticket().await?;
        if ticket.trim().is_empty() {
            return Ok(None);
        }

        let nonce_str = random_nonce();
        let timestamp = Utc::now().timestamp();
        let signature = sign(&ticket, &nonce_str, timestamp, url);

        Ok(Some(SignPackage {
            app_id: self.app_id.clone(),
            nonce_str,
            timestamp,
            url: url.to_string(),
            signature,
        }))
    }

    // == Credential Refresh ==
    /// Fetches a fresh access token and force-writes it into the cache.
    ///
    /// Returns false when the fetch failed, the upstream declined, or the
    /// write was rejected.
    pub async fn refresh_access_token(&self) -> bool {
        let token = match self.source.access_token().await {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "access token refresh failed");
                return false;
            }
        };

        match self.cache.set_text(ACCESS_TOKEN_KEY, &token).await {
            Ok(stored) => stored,
            Err(e) => {
                warn!(error = %e, "access token write failed");
                false
            }
        }
    }

    /// Fetches a fresh JS-API ticket and force-writes it into the cache.
    ///
    /// The ticket derivation reads the access token through the cache, so
    /// this step depends on the token being usable but does not refetch it
    /// while it is fresh.
    pub async fn refresh_jsapi_ticket(&self) -> bool {
        let ticket = match self.ticket_from_source().await {
            Ok(ticket) => ticket,
            Err(e) => {
                warn!(error = %e, "jsapi ticket refresh failed");
                return false;
            }
        };

        match self.cache.set_text(JSAPI_TICKET_KEY, &ticket).await {
            Ok(stored) => stored,
            Err(e) => {
                warn!(error = %e, "jsapi ticket write failed");
                false
            }
        }
    }

    // == Cached Credentials ==
    async fn cached_access_token(&self) -> Result<String> {
        self.cache
            .get_or_set_text(
                ACCESS_TOKEN_KEY,
                || self.source.access_token(),
                CREDENTIAL_WINDOW,
            )
            .await
    }

    async fn cached_ticket(&self) -> Result<String> {
        self.cache
            .get_or_set_text(
                JSAPI_TICKET_KEY,
                || self.ticket_from_source(),
                CREDENTIAL_WINDOW,
            )
            .await
    }

    /// Derives a ticket from the currently cached access token; an empty
    /// token short-circuits to an empty ticket without an upstream call.
    async fn ticket_from_source(&self) -> anyhow::Result<String> {
        let token = self.cached_access_token().await?;
        if token.trim().is_empty() {
            return Ok(String::new());
        }
        self.source.jsapi_ticket(&token).await
    }
}

/// Computes the JS-SDK signature: lowercase hex SHA-1 over the canonical
/// key-value string. The URL goes in exactly as the page reported it.
fn sign(ticket: &str, nonce_str: &str, timestamp: i64, url: &str) -> String {
    let raw = format!(
        "jsapi_ticket={}&noncestr={}&timestamp={}&url={}",
        ticket, nonce_str, timestamp, url
    );
    hex::encode(Sha1::digest(raw.as_bytes()))
}

/// Generates a random nonce of 6 to 10 ASCII letters.
fn random_nonce() -> String {
    use rand::Rng;

    const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

    let mut rng = rand::rng();
    let length = rng.random_range(NONCE_MIN_LEN..=NONCE_MAX_LEN);
    (0..length)
        .map(|_| {
            let idx = rng.random_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}
