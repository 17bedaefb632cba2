//! WeChat API Client Module
//!
//! HTTP access to the two credential-issuing endpoints. A declined request
//! (an errcode payload instead of a credential) is logged and reported as
//! an empty credential; only transport and parse failures are errors.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::warn;

/// Token endpoint of the WeChat public platform
const ACCESS_TOKEN_URL: &str = "https://api.weixin.qq.com/cgi-bin/token";

/// JS-API ticket endpoint, authenticated by a current access token
const JSAPI_TICKET_URL: &str = "https://api.weixin.qq.com/cgi-bin/ticket/getticket";

/// HTTP client timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// == Credential Source ==
/// Issues the two chained WeChat credentials.
///
/// An implementation returns an empty string for a credential the upstream
/// declined to issue; errors are reserved for transport-level failures.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    /// Fetches a fresh access token.
    async fn access_token(&self) -> Result<String>;

    /// Fetches a fresh JS-API ticket derived from `access_token`.
    async fn jsapi_ticket(&self, access_token: &str) -> Result<String>;
}

/// Response from the token endpoint
#[derive(Debug, Deserialize)]
struct AccessTokenResult {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    errcode: Option<i64>,
    #[serde(default)]
    errmsg: Option<String>,
}

/// Response from the ticket endpoint
#[derive(Debug, Deserialize)]
struct JsApiTicketResult {
    #[serde(default)]
    ticket: Option<String>,
    #[serde(default)]
    errcode: Option<i64>,
    #[serde(default)]
    errmsg: Option<String>,
}

// == WeChat Client ==
/// [`CredentialSource`] backed by the WeChat HTTP API.
pub struct WxClient {
    http_client: Client,
    app_id: String,
    app_secret: String,
}

impl WxClient {
    /// Creates a client for the application identified by `app_id`.
    pub fn new(app_id: impl Into<String>, app_secret: impl Into<String>) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            app_id: app_id.into(),
            app_secret: app_secret.into(),
        })
    }
}

#[async_trait]
impl CredentialSource for WxClient {
    async fn access_token(&self) -> Result<String> {
        let result: AccessTokenResult = self
            .http_client
            .get(ACCESS_TOKEN_URL)
            .query(&[
                ("grant_type", "client_credential"),
                ("appid", self.app_id.as_str()),
                ("secret", self.app_secret.as_str()),
            ])
            .send()
            .await
            .context("Failed to reach the token endpoint")?
            .json()
            .await
            .context("Failed to parse the token response")?;

        match result.access_token {
            Some(token) if !token.trim().is_empty() => Ok(token),
            _ => {
                warn!(
                    errcode = ?result.errcode,
                    errmsg = ?result.errmsg,
                    "access token request declined"
                );
                Ok(String::new())
            }
        }
    }

    async fn jsapi_ticket(&self, access_token: &str) -> Result<String> {
        let result: JsApiTicketResult = self
            .http_client
            .get(JSAPI_TICKET_URL)
            .query(&[("access_token", access_token), ("type", "jsapi")])
            .send()
            .await
            .context("Failed to reach the ticket endpoint")?
            .json()
            .await
            .context("Failed to parse the ticket response")?;

        match result.ticket {
            Some(ticket) if !ticket.trim().is_empty() => Ok(ticket),
            _ => {
                warn!(
                    errcode = ?result.errcode,
                    errmsg = ?result.errmsg,
                    "jsapi ticket request declined"
                );
                Ok(String::new())
            }
        }
    }
}
