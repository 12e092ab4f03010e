//! Error types for lingo-dl
//!
//! This module provides the error handling for the library, including:
//! - A single tagged error enum with kind-specific payloads
//! - HTTP status code classification into typed errors
//! - Phase-tagged minification/deminification errors
//! - The resumable-failure payload for document translation

use crate::types::DocumentHandle;
use reqwest::StatusCode;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for lingo-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for lingo-dl
///
/// Each variant carries the context needed to handle it programmatically;
/// matching on the variant replaces class-hierarchy checks.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "auth_key")
        key: Option<String>,
    },

    /// Authorization failed (HTTP 403); the auth key is invalid or lacks access
    #[error("authorization failure, check your auth key{0}")]
    Authorization(String),

    /// Translation quota for this billing period has been exhausted (HTTP 456)
    #[error("quota for this billing period has been exceeded{0}")]
    QuotaExceeded(String),

    /// Too many requests; the service is throttling this client (HTTP 429)
    ///
    /// The transport retries this status internally before surfacing it.
    #[error("too many requests, the service is receiving high load{0}")]
    TooManyRequests(String),

    /// The requested glossary does not exist (HTTP 404 on a glossary endpoint)
    #[error("glossary not found{0}")]
    GlossaryNotFound(String),

    /// The translated document is not ready for download yet (HTTP 503 on the
    /// document result endpoint)
    #[error("document translation is not done, result not ready for download{0}")]
    DocumentNotReady(String),

    /// The request was malformed (HTTP 400)
    #[error("bad request{0}")]
    BadRequest(String),

    /// Any other non-success response from the service
    #[error("request failed with status {status} {reason}{message}")]
    Server {
        /// HTTP status code returned by the service
        status: u16,
        /// Canonical reason phrase for the status code
        reason: String,
        /// Message extracted from the response body, if any
        message: String,
    },

    /// Network-level failure; no usable response was received
    #[error("connection error: {message}")]
    Connection {
        /// Description of the underlying transport failure
        message: String,
        /// Whether the failure is transient (timeout, aborted connection) and
        /// worth retrying
        should_retry: bool,
    },

    /// The service reported that a document translation job failed
    #[error("document translation reported an error: {0}")]
    DocumentFailed(String),

    /// A failure during the upload/poll/download sequence
    ///
    /// This is the only error kind with a recovery payload: when the upload
    /// had already succeeded, `handle` identifies the in-flight job so the
    /// caller can resume polling and downloading manually.
    #[error("document translation failed: {source}")]
    DocumentTranslation {
        /// Handle of the in-flight job, when the upload step completed
        handle: Option<DocumentHandle>,
        /// The underlying failure
        #[source]
        source: Box<Error>,
    },

    /// Filesystem or archive failure while minifying a document
    #[error("error occurred during document minification: {0}")]
    Minification(#[source] MinifyError),

    /// Filesystem or archive failure while deminifying a document
    #[error("error occurred during document deminification: {0}")]
    Deminification(#[source] MinifyError),

    /// Glossary entries failed validation
    #[error("invalid glossary entries: {0}")]
    InvalidGlossaryEntries(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Archive/filesystem errors raised by the document minifier
///
/// The same failure kinds can occur on either side of the round trip; the
/// top-level [`Error::Minification`] / [`Error::Deminification`] wrapper
/// records which phase was active.
#[derive(Debug, Error)]
pub enum MinifyError {
    /// Failed to extract a document archive
    #[error("failed to extract {archive}: {reason}")]
    Extraction {
        /// The archive that failed to extract
        archive: PathBuf,
        /// The reason extraction failed
        reason: String,
    },

    /// Failed to re-create a document archive
    #[error("failed to create archive {archive}: {reason}")]
    Archival {
        /// The archive that failed to be written
        archive: PathBuf,
        /// The reason archival failed
        reason: String,
    },

    /// Failed to relocate or restore a media file
    #[error("failed to relocate media file {path}: {reason}")]
    Media {
        /// The media file being moved
        path: PathBuf,
        /// The reason the move failed
        reason: String,
    },

    /// Failed to remove a working directory
    #[error("failed to clean up {dir}: {reason}")]
    Cleanup {
        /// The directory that could not be removed
        dir: PathBuf,
        /// The reason removal failed
        reason: String,
    },
}

/// Trait for errors that can be classified as retryable or not
///
/// Transient failures (network timeouts, aborted connections) should return
/// `true`. Everything else, including all status-classified errors, is
/// permanent from the transport's point of view; retryable statuses are
/// handled separately before classification.
pub trait IsRetryable {
    /// Returns true if the error is transient and the operation should be retried
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for Error {
    fn is_retryable(&self) -> bool {
        match self {
            Error::Connection { should_retry, .. } => *should_retry,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        // Timeouts and failures to connect are transient; everything else
        // (invalid request construction, decode failures) is not.
        Error::Connection {
            should_retry: e.is_timeout() || e.is_connect(),
            message: e.to_string(),
        }
    }
}

/// Call-site context for status classification
///
/// The same status codes mean different things on different endpoints; the
/// caller supplies the two bits the classifier cannot derive from the code.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct RequestContext {
    /// A glossary operation is in flight (404 means glossary-not-found)
    pub glossary_management: bool,
    /// A document result download is in flight (503 means not-ready)
    pub downloading_document: bool,
}

impl RequestContext {
    /// Context for glossary endpoints
    pub(crate) fn glossary() -> Self {
        Self {
            glossary_management: true,
            downloading_document: false,
        }
    }

    /// Context for the document result download endpoint
    pub(crate) fn document_download() -> Self {
        Self {
            glossary_management: false,
            downloading_document: true,
        }
    }
}

/// Returns Ok for success statuses (2xx/3xx), otherwise the classified error.
pub(crate) fn check_status(status: StatusCode, content: &str, ctx: RequestContext) -> Result<()> {
    if status.is_success() || status.is_redirection() {
        return Ok(());
    }
    Err(classify_status(status, content, ctx))
}

/// Maps a non-success response onto the typed error taxonomy.
pub(crate) fn classify_status(status: StatusCode, content: &str, ctx: RequestContext) -> Error {
    let message = message_from_body(content);
    match status.as_u16() {
        403 => Error::Authorization(message),
        456 => Error::QuotaExceeded(message),
        404 if ctx.glossary_management => Error::GlossaryNotFound(message),
        400 => Error::BadRequest(message),
        429 => Error::TooManyRequests(message),
        503 if ctx.downloading_document => Error::DocumentNotReady(message),
        code => Error::Server {
            status: code,
            reason: status
                .canonical_reason()
                .unwrap_or("Unknown Status")
                .to_string(),
            message,
        },
    }
}

/// Extracts a human-readable message from a response body.
///
/// Parseable JSON contributes its `message` and `detail` fields; anything
/// else is appended raw. The result is pre-formatted for direct appending to
/// the variant's error text (empty, or ", ..." with a leading separator).
fn message_from_body(content: &str) -> String {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        let message = value.get("message").and_then(|v| v.as_str());
        let detail = value.get("detail").and_then(|v| v.as_str());
        match (message, detail) {
            (Some(m), Some(d)) => return format!(", message: {m}, detail: {d}"),
            (Some(m), None) => return format!(", message: {m}"),
            (None, Some(d)) => return format!(", detail: {d}"),
            (None, None) => {}
        }
    }

    format!(", {trimmed}")
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16) -> StatusCode {
        StatusCode::from_u16(code).unwrap()
    }

    // -----------------------------------------------------------------------
    // Status classification table
    // -----------------------------------------------------------------------

    #[test]
    fn classification_covers_documented_statuses() {
        let ctx = RequestContext::default();
        assert!(matches!(
            classify_status(status(403), "", ctx),
            Error::Authorization(_)
        ));
        assert!(matches!(
            classify_status(status(456), "", ctx),
            Error::QuotaExceeded(_)
        ));
        assert!(matches!(
            classify_status(status(400), "", ctx),
            Error::BadRequest(_)
        ));
        assert!(matches!(
            classify_status(status(429), "", ctx),
            Error::TooManyRequests(_)
        ));
        assert!(matches!(
            classify_status(status(500), "", ctx),
            Error::Server { status: 500, .. }
        ));
    }

    #[test]
    fn not_found_is_glossary_error_only_in_glossary_context() {
        let generic = classify_status(status(404), "", RequestContext::default());
        assert!(
            matches!(generic, Error::Server { status: 404, .. }),
            "404 outside glossary context must stay generic, got {generic:?}"
        );

        let glossary = classify_status(status(404), "", RequestContext::glossary());
        assert!(matches!(glossary, Error::GlossaryNotFound(_)));
    }

    #[test]
    fn service_unavailable_is_not_ready_only_when_downloading() {
        let generic = classify_status(status(503), "", RequestContext::default());
        assert!(
            matches!(generic, Error::Server { status: 503, .. }),
            "503 outside a result download must stay generic, got {generic:?}"
        );

        let downloading = classify_status(status(503), "", RequestContext::document_download());
        assert!(matches!(downloading, Error::DocumentNotReady(_)));
    }

    #[test]
    fn success_and_redirect_statuses_pass_check() {
        for code in [200, 201, 204, 301, 302] {
            assert!(
                check_status(status(code), "", RequestContext::default()).is_ok(),
                "status {code} should pass"
            );
        }
        assert!(check_status(status(403), "", RequestContext::default()).is_err());
    }

    // -----------------------------------------------------------------------
    // Body message extraction
    // -----------------------------------------------------------------------

    #[test]
    fn json_body_contributes_message_and_detail() {
        let err = classify_status(
            status(400),
            r#"{"message":"Invalid target_lang","detail":"target_lang=XX"}"#,
            RequestContext::default(),
        );
        let text = err.to_string();
        assert!(text.contains("message: Invalid target_lang"), "{text}");
        assert!(text.contains("detail: target_lang=XX"), "{text}");
    }

    #[test]
    fn unparseable_body_is_appended_raw() {
        let err = classify_status(status(400), "gateway exploded", RequestContext::default());
        assert!(err.to_string().contains("gateway exploded"));
    }

    #[test]
    fn empty_body_adds_nothing() {
        let err = classify_status(status(403), "   ", RequestContext::default());
        assert_eq!(err.to_string(), "authorization failure, check your auth key");
    }

    #[test]
    fn unknown_status_includes_code_and_reason() {
        let err = classify_status(status(418), "", RequestContext::default());
        let text = err.to_string();
        assert!(text.contains("418"), "{text}");
        assert!(text.contains("I'm a teapot"), "{text}");
    }

    // -----------------------------------------------------------------------
    // Retryability
    // -----------------------------------------------------------------------

    #[test]
    fn only_flagged_connection_errors_are_retryable() {
        let transient = Error::Connection {
            message: "operation timed out".into(),
            should_retry: true,
        };
        assert!(transient.is_retryable());

        let permanent = Error::Connection {
            message: "certificate rejected".into(),
            should_retry: false,
        };
        assert!(!permanent.is_retryable());
    }

    #[test]
    fn classified_errors_are_never_retryable() {
        let errors = [
            Error::Authorization(String::new()),
            Error::QuotaExceeded(String::new()),
            Error::TooManyRequests(String::new()),
            Error::GlossaryNotFound(String::new()),
            Error::DocumentNotReady(String::new()),
            Error::BadRequest(String::new()),
            Error::DocumentFailed("bad source".into()),
        ];
        for err in errors {
            assert!(
                !err.is_retryable(),
                "classified error should not be retryable: {err}"
            );
        }
    }

    // -----------------------------------------------------------------------
    // Wrapping
    // -----------------------------------------------------------------------

    #[test]
    fn document_translation_error_exposes_handle_and_source() {
        let handle = DocumentHandle {
            document_id: "D1".into(),
            document_key: "K1".into(),
        };
        let err = Error::DocumentTranslation {
            handle: Some(handle.clone()),
            source: Box::new(Error::DocumentFailed("source file corrupted".into())),
        };
        match &err {
            Error::DocumentTranslation {
                handle: Some(h),
                source,
            } => {
                assert_eq!(*h, handle);
                assert!(source.to_string().contains("source file corrupted"));
            }
            other => panic!("unexpected error shape: {other:?}"),
        }
        assert!(!err.is_retryable());
    }

    #[test]
    fn minify_phases_are_distinguishable() {
        let cause = || MinifyError::Extraction {
            archive: PathBuf::from("input.docx"),
            reason: "invalid zip header".into(),
        };
        let minify = Error::Minification(cause());
        let deminify = Error::Deminification(cause());
        assert!(minify.to_string().contains("minification"));
        assert!(deminify.to_string().contains("deminification"));
        assert!(minify.to_string().contains("input.docx"));
    }
}
