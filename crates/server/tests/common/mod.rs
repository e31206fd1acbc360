//! Common test utilities for API testing with a mock engine.
//!
//! This module provides a test fixture that creates an in-process server
//! with the mock engine injected, so the whole download flow can be driven
//! over HTTP without yt-dlp or network access.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use linxgo_core::{
    testing::MockEngine, Config, DownloadService, DownloadWorker, DownloadsConfig, HeaderPolicy,
    InMemoryJobStore, JobStore, ServerConfig, StatusPoller,
};
use linxgo_server::state::AppState;

/// Re-export fixtures for test convenience
pub use linxgo_core::testing::fixtures;

/// Test fixture for API testing with a mock engine.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_job_creation() {
///     let fixture = TestFixture::new().await;
///
///     let response = fixture.post("/api/v1/jobs", json!({
///         "url": "https://example.com/v",
///         "quality": "high"
///     })).await;
///
///     assert_eq!(response.status, 202);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock engine - script progress, results and failures
    pub engine: Arc<MockEngine>,
    /// Job store shared with the router
    pub store: Arc<dyn JobStore>,
    /// Temporary directory for downloads and the web page
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// Response with the raw body and headers
#[derive(Debug)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl RawResponse {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

impl TestFixture {
    /// Create a new test fixture with default mocks.
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let download_dir = temp_dir.path().join("downloads");
        let ui_dir = temp_dir.path().join("ui");
        std::fs::create_dir_all(&ui_dir).expect("Failed to create ui dir");
        std::fs::write(
            ui_dir.join("index.html"),
            "<!DOCTYPE html><title>LinxGo</title>",
        )
        .expect("Failed to write index.html");

        let config = Config {
            server: ServerConfig {
                host: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
                port: 8080, // Not used for in-process testing
                ui_dir,
            },
            downloads: DownloadsConfig {
                dir: download_dir.clone(),
                poll_interval_ms: 10,
                max_concurrent: None,
            },
            ..Default::default()
        };

        let engine = Arc::new(MockEngine::new());
        let store: Arc<dyn JobStore> = Arc::new(InMemoryJobStore::new());

        let worker = DownloadWorker::new(
            Arc::clone(&store),
            Arc::clone(&engine) as Arc<dyn linxgo_core::Engine>,
            download_dir,
        );
        let service =
            DownloadService::new(Arc::clone(&store), worker, HeaderPolicy::with_defaults());
        let poller = StatusPoller::new(Arc::clone(&store), config.downloads.poll_interval());

        let state = Arc::new(AppState::new(config, service, poller));
        let router = linxgo_server::api::create_router(state);

        Self {
            router,
            engine,
            store,
            temp_dir,
        }
    }

    pub fn download_dir(&self) -> PathBuf {
        self.temp_dir.path().join("downloads")
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a POST request with raw string body (for testing malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let raw = self.send(request).await;
        TestResponse {
            status: raw.status,
            body: parse_json(&raw.body),
        }
    }

    /// Send a GET request and keep the raw body and headers.
    pub async fn get_raw(&self, path: &str) -> RawResponse {
        let request = Request::builder().uri(path).body(Body::empty()).unwrap();
        self.send(request).await
    }

    /// Submit a job and poll it until it reaches a terminal state.
    pub async fn run_job(&self, url: &str, quality: &str) -> Value {
        let created = self
            .post(
                "/api/v1/jobs",
                serde_json::json!({ "url": url, "quality": quality }),
            )
            .await;
        assert_eq!(created.status, StatusCode::ACCEPTED, "{:?}", created.body);
        let id = created.body["id"].as_str().expect("job id").to_string();
        self.wait_for_terminal(&id).await
    }

    /// Poll `GET /jobs/{id}` until the job is `finished` or `error`.
    pub async fn wait_for_terminal(&self, id: &str) -> Value {
        for _ in 0..200 {
            let response = self.get(&format!("/api/v1/jobs/{}", id)).await;
            let state = response.body["state"].as_str().unwrap_or_default();
            if state == "finished" || state == "error" {
                return response.body;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("job {} did not reach a terminal state", id);
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();
        let raw = self.send(request).await;

        TestResponse {
            status: raw.status,
            body: parse_json(&raw.body),
        }
    }

    async fn send(&self, request: Request<Body>) -> RawResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        RawResponse {
            status,
            headers,
            body,
        }
    }
}

fn parse_json(bytes: &[u8]) -> Value {
    if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(bytes).unwrap_or(Value::Null)
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}
