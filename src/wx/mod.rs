//! WeChat Integration Module
//!
//! Credential client and JS-SDK signature provider.

mod client;
mod sdk;

pub use client::{CredentialSource, WxClient};
pub use sdk::{WxJsSdk, ACCESS_TOKEN_KEY, JSAPI_TICKET_KEY};
