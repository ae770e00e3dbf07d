//! End-to-end tests of the HTTP surface.
//!
//! These drive the axum router directly with in-memory collaborators: a mock
//! detector, the in-memory store and a static identity provider.

use axum::{
    body::Body,
    extract::Request,
    http::{header, StatusCode},
    response::Response,
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use vision_shield::backends::MockDetector;
use vision_shield::core::{EncryptionStatus, Finding};
use vision_shield::http::{self, AppState};
use vision_shield::identity::{ExternalIdentity, StaticIdentityProvider};
use vision_shield::manager::ScanOrchestrator;
use vision_shield::store::{InMemoryScanStore, Plan, ScanStore, Subscription, UserId};

const BOUNDARY: &str = "vision-shield-test-boundary";

struct TestApp {
    router: Router,
    orchestrator: Arc<ScanOrchestrator>,
    store: Arc<InMemoryScanStore>,
    detector: Arc<MockDetector>,
}

impl TestApp {
    fn new(detector: MockDetector) -> Self {
        Self::with_upload_limit(detector, 1024 * 1024)
    }

    fn with_upload_limit(detector: MockDetector, max_upload_bytes: usize) -> Self {
        let store = Arc::new(InMemoryScanStore::new());
        let detector = Arc::new(detector);
        let identity = StaticIdentityProvider::new()
            .with_token("alice-token", ExternalIdentity::new("ext-alice", "alice@example.com"))
            .with_token("bob-token", ExternalIdentity::new("ext-bob", "bob@example.com"));

        let orchestrator = Arc::new(
            ScanOrchestrator::builder()
                .with_arc_detector(detector.clone())
                .with_arc_store(store.clone())
                .with_identity_provider(identity)
                .build()
                .unwrap(),
        );
        let router = http::router(AppState::new(orchestrator.clone()), max_upload_bytes);

        Self {
            router,
            orchestrator,
            store,
            detector,
        }
    }

    async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    async fn user_id(&self, token: &str) -> UserId {
        self.orchestrator
            .authenticate(Some(token))
            .await
            .unwrap()
            .user_id()
    }
}

fn sensitive_detector() -> MockDetector {
    MockDetector::new()
        .with_finding(Finding::new("Credit Card", 0.91, "Image content"))
        .with_encryption_status(EncryptionStatus::suggest("Fernet"))
}

fn multipart_body(field: &str, file_name: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            field, file_name
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn scan_request(token: Option<&str>, body: Vec<u8>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/scan")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        );
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body)).unwrap()
}

fn jpeg_request(token: Option<&str>) -> Request<Body> {
    scan_request(
        token,
        multipart_body("image", "photo.jpg", "image/jpeg", &[0xFF; 2048]),
    )
}

fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new(MockDetector::new());

    let response = app.send(get_request("/health", None)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({"status": "healthy"}));
}

#[tokio::test]
async fn test_scan_requires_authentication() {
    let app = TestApp::new(MockDetector::new());

    let cases = [
        (None, "No session token provided"),
        (Some("forged"), "Invalid session"),
    ];
    for (token, message) in cases {
        let response = app.send(jpeg_request(token)).await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            json_body(response).await,
            json!({"error": "User not authenticated", "message": message})
        );
    }
    assert_eq!(app.detector.invocation_count(), 0);
}

#[tokio::test]
async fn test_oversize_upload_without_credential_is_unauthorized() {
    let app = TestApp::with_upload_limit(MockDetector::new(), 1024);
    let body = multipart_body("image", "photo.jpg", "image/jpeg", &[0xFF; 4096]);

    let response = app.send(scan_request(None, body)).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(app.detector.invocation_count(), 0);
}

#[tokio::test]
async fn test_oversize_upload_from_authenticated_caller_is_rejected() {
    let app = TestApp::with_upload_limit(MockDetector::new(), 1024);
    let body = multipart_body("image", "photo.jpg", "image/jpeg", &[0xFF; 4096]);

    let response = app.send(scan_request(Some("alice-token"), body)).await;

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(json_body(response).await, json!({"error": "Image too large"}));
    assert_eq!(app.detector.invocation_count(), 0);
    assert_eq!(app.store.total_scans().await, 0);
}

#[tokio::test]
async fn test_scan_without_image_field_is_bad_request() {
    let app = TestApp::new(MockDetector::new());
    let body = multipart_body("document", "notes.txt", "text/plain", b"hello");

    let response = app.send(scan_request(Some("alice-token"), body)).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await,
        json!({"error": "No image file provided"})
    );
}

#[tokio::test]
async fn test_scan_with_non_multipart_body_is_bad_request() {
    let app = TestApp::new(MockDetector::new());
    let request = Request::builder()
        .method("POST")
        .uri("/api/scan")
        .header(header::AUTHORIZATION, "Bearer alice-token")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{}"))
        .unwrap();

    let response = app.send(request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_scan_jpeg_returns_analysis_and_records_one_scan() {
    let app = TestApp::new(sensitive_detector());

    let response = app.send(jpeg_request(Some("alice-token"))).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(
        body["sensitiveData"],
        json!([{"type": "Credit Card", "confidence": 0.91, "location": "Image content"}])
    );
    assert_eq!(
        body["encryptionStatus"],
        json!({"isEncrypted": false, "encryptionType": "Fernet", "suggested": true})
    );
    assert_eq!(body["metadata"]["size"], json!(2048));
    assert!(body["metadata"]["lastModified"].is_string());

    let user_id = app.user_id("alice-token").await;
    let scans = app.store.list_scans(user_id).await.unwrap();
    assert_eq!(scans.len(), 1);
    assert_eq!(scans[0].file_name, "photo.jpg");
    assert_eq!(scans[0].file_type, "image/jpeg");
    assert_eq!(scans[0].file_size, 2048);
}

#[tokio::test]
async fn test_free_tier_limit_response() {
    let app = TestApp::new(MockDetector::new());
    let user_id = app.user_id("alice-token").await;
    app.store.seed_scans(user_id, 10).await;

    let response = app.send(jpeg_request(Some("alice-token"))).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        json_body(response).await,
        json!({
            "error": "Free tier limit reached",
            "message": "Please upgrade to continue scanning"
        })
    );
    assert_eq!(app.store.count_scans(user_id).await.unwrap(), 10);
    assert_eq!(app.detector.invocation_count(), 0);
}

#[tokio::test]
async fn test_paid_plan_is_not_limited() {
    let app = TestApp::new(MockDetector::new());
    let user_id = app.user_id("alice-token").await;
    app.store
        .put_subscription(Subscription::new(user_id, Plan::Enterprise))
        .await;
    app.store.seed_scans(user_id, 1000).await;

    let response = app.send(jpeg_request(Some("alice-token"))).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.store.count_scans(user_id).await.unwrap(), 1001);
}

#[tokio::test]
async fn test_missing_subscription_response() {
    let app = TestApp::new(MockDetector::new());
    let user_id = app.user_id("alice-token").await;
    app.store.remove_subscription(user_id).await;

    let response = app.send(jpeg_request(Some("alice-token"))).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        json_body(response).await,
        json!({"error": "No active subscription"})
    );
}

#[tokio::test]
async fn test_detector_failure_is_opaque_500() {
    let app = TestApp::new(MockDetector::new_failing("CUDA out of memory"));

    let response = app.send(jpeg_request(Some("alice-token"))).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        json_body(response).await,
        json!({"error": "Failed to process image"})
    );
    assert_eq!(app.store.total_scans().await, 0);
}

#[tokio::test]
async fn test_storage_failure_is_opaque_500() {
    let app = TestApp::new(sensitive_detector());
    app.user_id("alice-token").await;
    app.store.fail_writes(true);

    let response = app.send(jpeg_request(Some("alice-token"))).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        json_body(response).await,
        json!({"error": "Failed to process image"})
    );
}

#[tokio::test]
async fn test_history_lists_own_scans_newest_first() {
    let app = TestApp::new(MockDetector::new());
    for name in ["one.png", "two.png"] {
        let body = multipart_body("image", name, "image/png", &[1, 2, 3]);
        let response = app.send(scan_request(Some("alice-token"), body)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
    app.send(jpeg_request(Some("bob-token"))).await;

    let response = app.send(get_request("/api/scans", Some("alice-token"))).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let scans = body.as_array().unwrap();
    assert_eq!(scans.len(), 2);
    assert_eq!(scans[0]["fileName"], json!("two.png"));
    assert_eq!(scans[1]["fileName"], json!("one.png"));

    let keys: Vec<&str> = scans[0]
        .as_object()
        .unwrap()
        .keys()
        .map(String::as_str)
        .collect();
    for key in [
        "id",
        "fileName",
        "fileType",
        "fileSize",
        "sensitiveData",
        "encryptionStatus",
        "createdAt",
    ] {
        assert!(keys.contains(&key), "missing {}", key);
    }
    assert!(!keys.contains(&"userId"));
}

#[tokio::test]
async fn test_history_requires_authentication() {
    let app = TestApp::new(MockDetector::new());

    let response = app.send(get_request("/api/scans", None)).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_scan_detail_round_trip() {
    let app = TestApp::new(sensitive_detector());

    let response = app.send(jpeg_request(Some("alice-token"))).await;
    let submitted = json_body(response).await;

    let history = json_body(app.send(get_request("/api/scans", Some("alice-token"))).await).await;
    let id = history[0]["id"].as_str().unwrap().to_string();

    let response = app
        .send(get_request(&format!("/api/scans/{}", id), Some("alice-token")))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let detail = json_body(response).await;
    assert_eq!(detail["id"], json!(id));
    assert_eq!(detail["sensitiveData"], submitted["sensitiveData"]);
    assert_eq!(detail["encryptionStatus"], submitted["encryptionStatus"]);
}

#[tokio::test]
async fn test_scan_detail_is_isolated_per_user() {
    let app = TestApp::new(MockDetector::new());
    app.send(jpeg_request(Some("alice-token"))).await;
    let history = json_body(app.send(get_request("/api/scans", Some("alice-token"))).await).await;
    let id = history[0]["id"].as_str().unwrap().to_string();

    let response = app
        .send(get_request(&format!("/api/scans/{}", id), Some("bob-token")))
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await, json!({"error": "Scan not found"}));
}

#[tokio::test]
async fn test_scan_detail_unknown_or_malformed_id() {
    let app = TestApp::new(MockDetector::new());

    for id in ["7f1c2a9e-3b4d-4c5e-8f60-718293a4b5c6", "not-a-uuid"] {
        let response = app
            .send(get_request(&format!("/api/scans/{}", id), Some("alice-token")))
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{}", id);
    }

    let response = app
        .send(get_request("/api/scans/not-a-uuid", None))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
