//! Integration Tests for the Share API
//!
//! Tests the full request/response cycle for each endpoint over a real
//! store in a temporary directory, with a scripted credential source in
//! place of the WeChat endpoints.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use sharecache::api::create_router;
use sharecache::models::SignPackage;
use sharecache::wx::{CredentialSource, WxJsSdk};
use sharecache::{AppState, CacheStore, CodecRegistry, Config, TtlCache};

// == Helper Functions ==

/// Credential source that issues fixed strings and counts upstream calls.
struct TestSource {
    token: &'static str,
    ticket: &'static str,
    token_calls: AtomicU32,
    ticket_calls: AtomicU32,
}

impl TestSource {
    fn new(token: &'static str, ticket: &'static str) -> Self {
        Self {
            token,
            ticket,
            token_calls: AtomicU32::new(0),
            ticket_calls: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl CredentialSource for TestSource {
    async fn access_token(&self) -> anyhow::Result<String> {
        self.token_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.token.to_string())
    }

    async fn jsapi_ticket(&self, _access_token: &str) -> anyhow::Result<String> {
        self.ticket_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.ticket.to_string())
    }
}

fn create_test_app_with(source: TestSource) -> (Router, Arc<TestSource>, TempDir) {
    let temp_dir = TempDir::new().expect("TempDir creation should succeed");
    let store = Arc::new(CacheStore::open(temp_dir.path(), 10).expect("store should open"));
    let mut registry = CodecRegistry::new();
    registry.register::<SignPackage>();
    let cache = Arc::new(TtlCache::new(store, registry));

    let source = Arc::new(source);
    let sdk = Arc::new(WxJsSdk::new(
        Arc::clone(&cache),
        Arc::clone(&source) as Arc<dyn CredentialSource>,
        "wx-test-app",
    ));

    let config = Config {
        whitelist_domains: vec!["example\\.com".to_string()],
        ..Default::default()
    };
    let state = AppState::new(cache, sdk, &config);
    (create_router(state, &config.allowed_origins), source, temp_dir)
}

fn create_test_app() -> (Router, Arc<TestSource>, TempDir) {
    create_test_app_with(TestSource::new("tok-1", "ticket-1"))
}

fn signature_request(url: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/share/signature")
        .header("content-type", "application/json")
        .body(Body::from(format!(r#"{{"url":"{}"}}"#, url)))
        .unwrap()
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// == Signature Endpoint Tests ==

#[tokio::test]
async fn test_signature_endpoint_success() {
    let (app, _source, _temp_dir) = create_test_app();

    let response = app
        .oneshot(signature_request("https://example.com/video?id=42"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["appId"].as_str().unwrap(), "wx-test-app");
    assert_eq!(json["url"].as_str().unwrap(), "https://example.com/video?id=42");
    assert!(json["timestamp"].as_i64().unwrap() > 0);
    assert!(!json["nonceStr"].as_str().unwrap().is_empty());

    let signature = json["signature"].as_str().unwrap();
    assert_eq!(signature.len(), 40);
    assert!(signature
        .chars()
        .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
}

#[tokio::test]
async fn test_signature_endpoint_reuses_cached_package() {
    let (app, _source, _temp_dir) = create_test_app();

    let first = app
        .clone()
        .oneshot(signature_request("https://example.com/page"))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    let first = body_to_json(first.into_body()).await;

    let second = app
        .oneshot(signature_request("https://example.com/page"))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::OK);
    let second = body_to_json(second.into_body()).await;

    // The same nonce and signature prove the second answer came from the
    // cache rather than being signed afresh
    assert_eq!(first["nonceStr"], second["nonceStr"]);
    assert_eq!(first["timestamp"], second["timestamp"]);
    assert_eq!(first["signature"], second["signature"]);
}

#[tokio::test]
async fn test_signature_endpoint_trims_url() {
    let (app, _source, _temp_dir) = create_test_app();

    let response = app
        .oneshot(signature_request("  https://example.com/padded  "))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["url"].as_str().unwrap(), "https://example.com/padded");
}

#[tokio::test]
async fn test_signature_endpoint_shares_credentials_across_urls() {
    let (app, source, _temp_dir) = create_test_app();

    for url in ["https://example.com/a", "https://example.com/b"] {
        let response = app.clone().oneshot(signature_request(url)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    // Both packages were signed with one cached token/ticket pair
    assert_eq!(source.token_calls.load(Ordering::SeqCst), 1);
    assert_eq!(source.ticket_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_signature_endpoint_empty_url() {
    let (app, _source, _temp_dir) = create_test_app();

    let response = app.oneshot(signature_request("")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_to_json(response.into_body()).await;
    assert!(json.get("error").is_some());
}

#[tokio::test]
async fn test_signature_endpoint_invalid_json() {
    let (app, _source, _temp_dir) = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/share/signature")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"url"#))
                .unwrap(),
        )
        .await
        .unwrap();

    // Axum returns 400 or 422 for JSON parsing errors depending on where
    // the body breaks
    assert!(
        response.status() == StatusCode::BAD_REQUEST
            || response.status() == StatusCode::UNPROCESSABLE_ENTITY
    );
}

#[tokio::test]
async fn test_signature_endpoint_unlisted_host() {
    let (app, source, _temp_dir) = create_test_app();

    let response = app
        .oneshot(signature_request("https://evil.test/page"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_to_json(response.into_body()).await;
    assert!(json["error"].as_str().unwrap().contains("evil.test"));

    // A rejected host never reaches the credential chain
    assert_eq!(source.token_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_signature_endpoint_unavailable_without_credentials() {
    let (app, _source, _temp_dir) = create_test_app_with(TestSource::new("", ""));

    let response = app
        .oneshot(signature_request("https://example.com/video"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_to_json(response.into_body()).await;
    assert!(json.get("error").is_some());
}

// == Redirect Endpoint Tests ==

#[tokio::test]
async fn test_redirect_endpoint_follows_whitelisted() {
    let (app, _source, _temp_dir) = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/share/redirect?url=https://example.com/landing")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        response.headers().get("location").unwrap(),
        "https://example.com/landing"
    );
}

#[tokio::test]
async fn test_redirect_endpoint_rejects_unlisted_host() {
    let (app, _source, _temp_dir) = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/share/redirect?url=https://evil.test/landing")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_redirect_endpoint_rejects_missing_url() {
    let (app, _source, _temp_dir) = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/share/redirect")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// == Stats Endpoint Tests ==

#[tokio::test]
async fn test_stats_endpoint_counts_cache_traffic() {
    let (app, _source, _temp_dir) = create_test_app();

    // First request misses the package, the ticket and the token; the
    // second is answered from the cache
    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(signature_request("https://example.com/page"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .oneshot(
            Request::builder()
                .uri("/stats")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;

    assert_eq!(json["hits"].as_u64().unwrap(), 1);
    assert_eq!(json["misses"].as_u64().unwrap(), 3);
    assert_eq!(json["writes"].as_u64().unwrap(), 3);
    assert_eq!(json["rejected_writes"].as_u64().unwrap(), 0);
    assert!((json["hit_rate"].as_f64().unwrap() - 0.25).abs() < 0.001);
}

// == Health Endpoint Tests ==

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _source, _temp_dir) = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"].as_str().unwrap(), "healthy");
    assert!(json.get("timestamp").is_some());
}

// == CORS Tests ==

#[tokio::test]
async fn test_cors_preflight_allows_any_origin_by_default() {
    let (app, _source, _temp_dir) = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/api/share/signature")
                .header("origin", "https://anywhere.test")
                .header("access-control-request-method", "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .unwrap(),
        "*"
    );
}

#[tokio::test]
async fn test_cors_restricts_to_configured_origins() {
    let temp_dir = TempDir::new().expect("TempDir creation should succeed");
    let store = Arc::new(CacheStore::open(temp_dir.path(), 10).expect("store should open"));
    let cache = Arc::new(TtlCache::new(store, CodecRegistry::new()));
    let sdk = Arc::new(WxJsSdk::new(
        Arc::clone(&cache),
        Arc::new(TestSource::new("", "")) as Arc<dyn CredentialSource>,
        "wx-test-app",
    ));
    let state = AppState::new(cache, sdk, &Config::default());
    let app = create_router(state, &["https://app.example.com".to_string()]);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("origin", "https://app.example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .unwrap(),
        "https://app.example.com"
    );
}
