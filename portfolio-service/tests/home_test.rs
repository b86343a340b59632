mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use common::{body_json, body_string, test_config, TestApp, TEST_API_KEY};
use portfolio_service::services::MockEmailProvider;
use std::io::Write;
use std::sync::{Arc, Mutex};

fn app() -> TestApp {
    TestApp::new(test_config("http://127.0.0.1:9/unused", Some(TEST_API_KEY)))
}

#[tokio::test]
async fn get_home_renders_portfolio_page() {
    let app = app();

    let response = app.get("/").await;

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
    assert!(content_type.starts_with("text/html"));

    let body = body_string(response).await;
    assert!(body.contains("Test Owner"));
    assert!(body.contains(r#"id="contact""#));
    assert!(app.store.messages().is_empty(), "GET must not store anything");
}

#[tokio::test]
async fn post_contact_stores_message_and_redirects() {
    let app = app();

    let response = app
        .post_form(
            "/",
            "name=Ada+Lovelace&email=ada%40example.com&message=Let%27s+build+something",
        )
        .await;

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers()[header::LOCATION], "/#contact");

    let messages = app.store.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].name, "Ada Lovelace");
    assert_eq!(messages[0].email, "ada@example.com");
    assert_eq!(messages[0].message, "Let's build something");

    assert_eq!(app.email.send_count(), 1);
    let sent = &app.email.sent()[0];
    assert_eq!(sent.to, "owner@example.com");
    assert!(sent.body_text.contains("Ada Lovelace"));
    assert!(sent.body_text.contains("ada@example.com"));
    assert!(sent.body_text.contains("Let's build something"));
}

#[tokio::test]
async fn post_contact_still_redirects_when_email_fails() {
    let app = TestApp::with_email(
        test_config("http://127.0.0.1:9/unused", Some(TEST_API_KEY)),
        MockEmailProvider::failing(),
    );

    let response = app
        .post_form("/", "name=Ada&email=ada%40example.com&message=Hello")
        .await;

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers()[header::LOCATION], "/#contact");
    assert_eq!(app.store.messages().len(), 1);
    assert_eq!(app.email.send_count(), 0);
}

#[tokio::test]
async fn post_contact_accepts_missing_fields() {
    let app = app();

    let response = app.post_form("/", "name=Ada").await;

    assert_eq!(response.status(), StatusCode::FOUND);
    let messages = app.store.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].name, "Ada");
    assert_eq!(messages[0].email, "");
    assert_eq!(messages[0].message, "");
}

#[tokio::test]
async fn post_contact_without_form_content_type_is_lenient() {
    let app = app();

    let response = app
        .request(
            Request::builder()
                .method("POST")
                .uri("/")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(app.store.messages().len(), 1);
}

#[tokio::test]
async fn post_contact_with_repeated_field_keeps_last_value() {
    let app = app();

    let response = app
        .post_form(
            "/",
            "name=Ada&email=ada%40example.com&message=Hello&name=Ada+Lovelace",
        )
        .await;

    assert_eq!(response.status(), StatusCode::FOUND);
    let messages = app.store.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].name, "Ada Lovelace");
    assert_eq!(messages[0].email, "ada@example.com");
    assert_eq!(messages[0].message, "Hello");
}

#[tokio::test]
async fn post_contact_accepts_multipart_form_data() {
    let app = app();
    let boundary = "----portfolio-boundary";
    let body = format!(
        "--{b}\r\n\
         Content-Disposition: form-data; name=\"name\"\r\n\r\n\
         Ada\r\n\
         --{b}\r\n\
         Content-Disposition: form-data; name=\"message\"\r\n\r\n\
         Hello from FormData\r\n\
         --{b}--\r\n",
        b = boundary
    );

    let response = app
        .request(
            Request::builder()
                .method("POST")
                .uri("/")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={}", boundary),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers()[header::LOCATION], "/#contact");
    let messages = app.store.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].name, "Ada");
    assert_eq!(messages[0].email, "");
    assert_eq!(messages[0].message, "Hello from FormData");
    assert!(app.email.sent()[0].subject.contains("Ada"));
}

#[tokio::test]
async fn post_contact_with_unreadable_body_is_rejected() {
    let app = app();

    let response = app
        .request(
            Request::builder()
                .method("POST")
                .uri("/")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"name":"Ada"}"#))
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(app.store.messages().is_empty(), "nothing stored for a bad body");
    assert_eq!(app.email.send_count(), 0);
}

#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn visitor_email_is_not_logged_at_info() {
    let app = app();
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let response = app
        .post_form("/", "name=Ada&email=visitor%40example.org&message=Hello")
        .await;
    assert_eq!(response.status(), StatusCode::FOUND);

    let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
    assert!(output.contains("New contact message received"));
    assert!(!output.contains("visitor@example.org"));
}

#[tokio::test]
async fn post_contact_reports_storage_failure() {
    let app = app();
    app.store.set_failing(true);

    let response = app
        .post_form("/", "name=Ada&email=ada%40example.com&message=Hello")
        .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await["error"], "Database error");
    assert_eq!(app.email.send_count(), 0, "no email for an unsaved message");
}

#[tokio::test]
async fn static_assets_are_served() {
    let app = app();

    let response = app.get("/static/js/assistant.js").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.contains("/api/gemini-proxy/"));
}
