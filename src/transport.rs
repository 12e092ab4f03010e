//! HTTP transport with retry and backoff
//!
//! Executes one logical request against the configured base URL, retrying
//! transient failures per the backoff policy and returning the raw status and
//! body for the status classifier to interpret. The underlying connection
//! pool supports concurrent in-flight requests; all configuration is
//! immutable after construction.

use crate::backoff::BackoffTimer;
use crate::config::BackoffConfig;
use crate::error::{Error, IsRetryable, Result};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, USER_AGENT};
use reqwest::{Method, StatusCode};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// A file to attach to a multipart upload request
pub(crate) struct FileUpload {
    /// Filename reported to the service (used for format detection)
    pub filename: String,
    /// Raw file bytes
    pub data: Vec<u8>,
}

/// Per-request options
#[derive(Default)]
pub(crate) struct RequestOptions {
    /// Ordered key/value pairs; repeated keys are allowed. Sent as the query
    /// string for GET/DELETE and as the body for other methods.
    pub data: Vec<(String, String)>,
    /// Optional file attachment; switches the body to multipart form data
    /// with the data fields merged alongside the file part.
    pub file: Option<FileUpload>,
    /// Extra headers merged over the instance-level defaults
    pub headers: Vec<(String, String)>,
}

impl RequestOptions {
    /// Options carrying only form/query fields
    pub(crate) fn with_data(data: Vec<(String, String)>) -> Self {
        Self {
            data,
            ..Self::default()
        }
    }
}

/// A buffered response: status code plus body text
#[derive(Debug)]
pub(crate) struct HttpResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Response body, decoded as text
    pub content: String,
}

impl HttpResponse {
    /// Deserialize the body as JSON
    pub(crate) fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_str(&self.content)?)
    }
}

/// HTTP transport shared by all endpoint wrappers
#[derive(Debug)]
pub(crate) struct HttpTransport {
    client: reqwest::Client,
    server_url: Url,
    default_headers: HeaderMap,
    max_retries: u32,
    min_timeout: Duration,
    backoff: BackoffConfig,
}

impl HttpTransport {
    /// Build a transport for the given base URL and auth key.
    pub(crate) fn new(
        server_url: &str,
        auth_key: &str,
        user_agent: &str,
        max_retries: u32,
        min_timeout: Duration,
        backoff: BackoffConfig,
    ) -> Result<Self> {
        let server_url = Url::parse(server_url).map_err(|e| Error::Config {
            message: format!("invalid server URL {server_url:?}: {e}"),
            key: Some("server_url".to_string()),
        })?;

        let mut default_headers = HeaderMap::new();
        let auth_value = HeaderValue::from_str(&format!("DeepL-Auth-Key {auth_key}")).map_err(
            |_| Error::Config {
                message: "auth key contains characters not permitted in a header".to_string(),
                key: Some("auth_key".to_string()),
            },
        )?;
        let ua_value = HeaderValue::from_str(user_agent).map_err(|_| Error::Config {
            message: "user agent contains characters not permitted in a header".to_string(),
            key: Some("app_info".to_string()),
        })?;
        default_headers.insert(AUTHORIZATION, auth_value);
        default_headers.insert(USER_AGENT, ua_value);

        Ok(Self {
            client: reqwest::Client::new(),
            server_url,
            default_headers,
            max_retries,
            min_timeout,
            backoff,
        })
    }

    /// Execute one logical request and buffer the response body.
    pub(crate) async fn send_request(
        &self,
        method: Method,
        path: &str,
        options: RequestOptions,
    ) -> Result<HttpResponse> {
        let response = self.send_with_backoff(method, path, &options).await?;
        let status = response.status();
        let content = response.text().await?;
        Ok(HttpResponse { status, content })
    }

    /// Execute one logical request and return the live response for
    /// streaming, without buffering the body.
    ///
    /// The caller is responsible for checking the status code before
    /// consuming the stream.
    pub(crate) async fn send_request_streaming(
        &self,
        method: Method,
        path: &str,
        options: RequestOptions,
    ) -> Result<reqwest::Response> {
        self.send_with_backoff(method, path, &options).await
    }

    /// The retry loop: issues attempts until one succeeds, a non-retryable
    /// failure occurs, or the retry budget is spent.
    async fn send_with_backoff(
        &self,
        method: Method,
        path: &str,
        options: &RequestOptions,
    ) -> Result<reqwest::Response> {
        let url = self.server_url.join(path).map_err(|e| Error::Config {
            message: format!("invalid request path {path:?}: {e}"),
            key: None,
        })?;

        let mut timer = BackoffTimer::new(self.backoff.clone());
        loop {
            // Slow attempts still yield to the retry clock
            let attempt_timeout = self.min_timeout.max(timer.time_until_deadline());
            let result = self
                .send_attempt(method.clone(), url.clone(), options, attempt_timeout)
                .await;

            match result {
                Ok(response)
                    if should_retry_status(response.status())
                        && timer.num_retries() < self.max_retries =>
                {
                    warn!(
                        status = response.status().as_u16(),
                        num_retries = timer.num_retries(),
                        "request rejected with retryable status, backing off"
                    );
                    timer.advance().await;
                }
                Ok(response) => {
                    debug!(
                        status = response.status().as_u16(),
                        num_retries = timer.num_retries(),
                        %url,
                        "request completed"
                    );
                    return Ok(response);
                }
                Err(e) if e.is_retryable() && timer.num_retries() < self.max_retries => {
                    warn!(
                        error = %e,
                        num_retries = timer.num_retries(),
                        "request failed with transient connection error, backing off"
                    );
                    timer.advance().await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Issue a single HTTP attempt.
    async fn send_attempt(
        &self,
        method: Method,
        url: Url,
        options: &RequestOptions,
        timeout: Duration,
    ) -> Result<reqwest::Response> {
        let mut builder = self
            .client
            .request(method.clone(), url)
            .headers(self.default_headers.clone())
            .timeout(timeout);

        for (name, value) in &options.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        if let Some(file) = &options.file {
            // Multipart body merging the data fields alongside the file part
            let mut form = reqwest::multipart::Form::new();
            for (key, value) in &options.data {
                form = form.text(key.clone(), value.clone());
            }
            let part = reqwest::multipart::Part::bytes(file.data.clone())
                .file_name(file.filename.clone());
            form = form.part("file", part);
            builder = builder.multipart(form);
        } else if method == Method::GET || method == Method::DELETE {
            if !options.data.is_empty() {
                builder = builder.query(&options.data);
            }
        } else if !options.data.is_empty() {
            builder = builder.form(&options.data);
        }

        Ok(builder.send().await?)
    }
}

/// An attempt is retried for 429, and for server errors except 503 (which is
/// a user-facing "not ready" signal, not a transport-level transient failure).
fn should_retry_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS
        || (status.is_server_error() && status != StatusCode::SERVICE_UNAVAILABLE)
}
