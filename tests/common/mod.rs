//! Shared fixtures for integration tests

use lingo_dl::{BackoffConfig, DocumentHandle, Translator, TranslatorOptions};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Document ID used by the mock service
pub const DOCUMENT_ID: &str = "9B7CBE2EAF2D4AC8";

/// Document key used by the mock service
pub const DOCUMENT_KEY: &str = "52C1A7C3D4E5F6A8";

/// The handle the mock upload endpoint hands out
pub fn mock_handle() -> DocumentHandle {
    DocumentHandle {
        document_id: DOCUMENT_ID.to_string(),
        document_key: DOCUMENT_KEY.to_string(),
    }
}

/// A translator pointed at the mock server, with fast polling and no retries
pub fn test_translator(server_url: &str) -> Translator {
    Translator::new(
        "integration-test-key",
        TranslatorOptions {
            server_url: Some(server_url.to_string()),
            max_retries: 0,
            min_timeout: Duration::from_secs(5),
            poll_interval: Duration::from_millis(10),
            backoff: BackoffConfig {
                initial_delay: Duration::from_millis(10),
                max_delay: Duration::from_millis(40),
                multiplier: 1.6,
                jitter: 0.0,
            },
            send_platform_info: false,
            app_info: None,
        },
    )
    .expect("test translator construction should succeed")
}

/// Mount the upload endpoint, responding with the mock handle
pub async fn mount_upload(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/v2/document"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            r#"{{"document_id":"{DOCUMENT_ID}","document_key":"{DOCUMENT_KEY}"}}"#,
        )))
        .expect(1)
        .named("document upload")
        .mount(server)
        .await;
}

/// Mount a status endpoint that walks through the given transient states
/// once each, then reports done with the given billed character count
pub async fn mount_status_sequence(server: &MockServer, transient_states: &[&str], billed: u64) {
    let status_path = format!("/v2/document/{DOCUMENT_ID}");
    for state in transient_states {
        Mock::given(method("POST"))
            .and(path(status_path.as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_string(format!(
                r#"{{"document_id":"{DOCUMENT_ID}","status":"{state}","seconds_remaining":9999}}"#,
            )))
            .up_to_n_times(1)
            .mount(server)
            .await;
    }
    Mock::given(method("POST"))
        .and(path(status_path.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            r#"{{"document_id":"{DOCUMENT_ID}","status":"done","billed_characters":{billed}}}"#,
        )))
        .mount(server)
        .await;
}

/// Mount the result endpoint, streaming the given bytes
pub async fn mount_result(server: &MockServer, body: Vec<u8>) {
    Mock::given(method("POST"))
        .and(path(format!("/v2/document/{DOCUMENT_ID}/result")))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
        .named("result download")
        .mount(server)
        .await;
}
