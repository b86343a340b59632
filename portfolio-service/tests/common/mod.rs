//! Common test utilities for portfolio-service integration tests.
#![allow(dead_code)]

use axum::{
    body::Body,
    extract::Query,
    http::{Request, StatusCode},
    response::Response,
    routing::post,
    Json, Router,
};
use http_body_util::BodyExt;
use portfolio_service::config::{
    DatabaseConfig, GeminiConfig, PortfolioConfig, SiteConfig, SmtpConfig,
};
use portfolio_service::services::{GeminiClient, MockContactStore, MockEmailProvider};
use portfolio_service::startup::{build_router, AppState};
use secrecy::Secret;
use serde_json::Value;
use service_core::config::Config as CoreConfig;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceExt;

static INIT: Once = Once::new();

/// Initialize tracing for tests (only once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("info,portfolio_service=debug")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

pub const TEST_API_KEY: &str = "test-gemini-key";

pub fn test_config(gemini_url: &str, api_key: Option<&str>) -> PortfolioConfig {
    PortfolioConfig {
        common: CoreConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        service_name: "portfolio-service-test".to_string(),
        log_level: "debug".to_string(),
        otlp_endpoint: None,
        debug: true,
        site: SiteConfig {
            owner_name: "Test Owner".to_string(),
            static_dir: concat!(env!("CARGO_MANIFEST_DIR"), "/static").to_string(),
            allowed_hosts: Vec::new(),
        },
        database: DatabaseConfig {
            url: "postgres://unused".to_string(),
            max_connections: 1,
            min_connections: 1,
        },
        smtp: SmtpConfig {
            host: "smtp.test.local".to_string(),
            port: 587,
            user: "owner@example.com".to_string(),
            password: Secret::new("test".to_string()),
            from_email: "owner@example.com".to_string(),
            from_name: "Portfolio".to_string(),
            recipient: "owner@example.com".to_string(),
            use_tls: true,
            use_ssl: false,
            enabled: false,
        },
        gemini: GeminiConfig {
            api_key: api_key.map(|k| Secret::new(k.to_string())),
            api_url: gemini_url.to_string(),
            timeout: Duration::from_secs(15),
        },
    }
}

/// Router plus handles on its mock collaborators.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<MockContactStore>,
    pub email: Arc<MockEmailProvider>,
}

impl TestApp {
    pub fn new(config: PortfolioConfig) -> Self {
        Self::with_email(config, MockEmailProvider::new())
    }

    pub fn with_email(config: PortfolioConfig, email: MockEmailProvider) -> Self {
        init_tracing();

        let store = Arc::new(MockContactStore::new());
        let email = Arc::new(email);
        let generator =
            GeminiClient::new(config.gemini.clone()).expect("Failed to build Gemini client");

        let state = AppState::new(config, store.clone(), email.clone(), Arc::new(generator));
        let router = build_router(state.clone());

        Self {
            router,
            state,
            store,
            email,
        }
    }

    /// A proxy-focused app whose upstream is `gemini_url`.
    pub fn with_gemini(gemini_url: &str, api_key: Option<&str>) -> Self {
        Self::new(test_config(gemini_url, api_key))
    }

    pub async fn request(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }

    pub async fn get(&self, uri: &str) -> Response {
        self.request(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn post_form(&self, uri: &str, body: &str) -> Response {
        self.request(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/x-www-form-urlencoded")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn post_json(&self, uri: &str, body: &str) -> Response {
        self.request(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }
}

pub async fn body_string(response: Response) -> String {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes();
    String::from_utf8(bytes.to_vec()).expect("Body is not UTF-8")
}

pub async fn body_json(response: Response) -> Value {
    serde_json::from_str(&body_string(response).await).expect("Body is not JSON")
}

/// Requests seen by the mock Gemini upstream: query parameters and JSON body.
#[derive(Clone, Default)]
pub struct UpstreamLog {
    requests: Arc<Mutex<Vec<(HashMap<String, String>, Value)>>>,
}

impl UpstreamLog {
    pub fn requests(&self) -> Vec<(HashMap<String, String>, Value)> {
        self.requests.lock().unwrap().clone()
    }
}

/// Serve a fake `generateContent` endpoint that always answers with
/// `status` and `body`, optionally after `delay`.
pub async fn spawn_mock_gemini_with_delay(
    status: StatusCode,
    body: Value,
    delay: Option<Duration>,
) -> (String, UpstreamLog) {
    let log = UpstreamLog::default();
    let handler_log = log.clone();

    let app = Router::new().route(
        "/v1beta/generate",
        post(
            move |Query(query): Query<HashMap<String, String>>, Json(payload): Json<Value>| {
                let log = handler_log.clone();
                let body = body.clone();
                async move {
                    log.requests.lock().unwrap().push((query, payload));
                    if let Some(delay) = delay {
                        tokio::time::sleep(delay).await;
                    }
                    (status, Json(body))
                }
            },
        ),
    );

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind mock upstream");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    (
        format!("http://{}/v1beta/generate", addr),
        log,
    )
}

pub async fn spawn_mock_gemini(status: StatusCode, body: Value) -> (String, UpstreamLog) {
    spawn_mock_gemini_with_delay(status, body, None).await
}
