//! Configuration types for lingo-dl

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default server URL used for regular (paid-tier) auth keys
pub const SERVER_URL: &str = "https://api.deepl.com";

/// Default server URL used for free-tier auth keys
pub const SERVER_URL_FREE: &str = "https://api-free.deepl.com";

/// Suffix carried by free-tier auth keys
const FREE_KEY_SUFFIX: &str = ":fx";

/// Returns true if the auth key belongs to a free-tier account.
///
/// Free-tier keys carry a recognizable `:fx` suffix and are served from a
/// different host than paid keys.
pub fn is_free_account_auth_key(auth_key: &str) -> bool {
    auth_key.ends_with(FREE_KEY_SUFFIX)
}

/// Selects the default server URL for an auth key.
///
/// Used when no explicit server URL override is configured.
pub(crate) fn server_url_for_auth_key(auth_key: &str) -> &'static str {
    if is_free_account_auth_key(auth_key) {
        SERVER_URL_FREE
    } else {
        SERVER_URL
    }
}

/// Identification of the application embedding this library.
///
/// When set, `name/version` is appended to the `User-Agent` header so the
/// service can attribute traffic to the calling application.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppInfo {
    /// Application name (e.g. "my-translation-tool")
    pub name: String,
    /// Application version (e.g. "1.2.3")
    pub version: String,
}

/// Backoff policy for retrying one logical request
///
/// The delay grows multiplicatively from `initial_delay` up to `max_delay`,
/// with symmetric jitter of `jitter * delay` applied around each deadline to
/// decorrelate concurrent clients.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BackoffConfig {
    /// Initial delay before the first retry (default: 1 second)
    #[serde(default = "default_initial_delay", with = "duration_serde")]
    pub initial_delay: Duration,

    /// Maximum delay between retries (default: 120 seconds)
    #[serde(default = "default_max_delay", with = "duration_serde")]
    pub max_delay: Duration,

    /// Multiplier applied to the delay after each retry (default: 1.6)
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,

    /// Jitter fraction, as a symmetric proportion of the delay (default: 0.23)
    ///
    /// A value of 0.23 means each realized delay lies uniformly within
    /// `delay * [0.77, 1.23]`. Set to 0.0 for deterministic delays.
    #[serde(default = "default_jitter")]
    pub jitter: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_delay: default_initial_delay(),
            max_delay: default_max_delay(),
            multiplier: default_multiplier(),
            jitter: default_jitter(),
        }
    }
}

/// Client configuration
///
/// All fields have sensible defaults; `TranslatorOptions::default()` works out
/// of the box. The configuration is immutable after the client is constructed
/// and safely shared read-only across concurrent requests.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TranslatorOptions {
    /// Base URL override (default: selected automatically from the auth key)
    #[serde(default)]
    pub server_url: Option<String>,

    /// Maximum number of retries for one logical request (default: 5)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Minimum timeout for a single HTTP attempt (default: 10 seconds)
    ///
    /// The effective per-attempt timeout is the larger of this value and the
    /// backoff timer's time-until-deadline, so slow attempts still yield to
    /// the retry clock.
    #[serde(default = "default_min_timeout", with = "duration_serde")]
    pub min_timeout: Duration,

    /// Interval between document status polls (default: 5 seconds)
    ///
    /// The service reports a `seconds_remaining` estimate, but it is
    /// unreliable and deliberately ignored in favor of this fixed interval.
    #[serde(default = "default_poll_interval", with = "duration_serde")]
    pub poll_interval: Duration,

    /// Retry backoff policy
    #[serde(default)]
    pub backoff: BackoffConfig,

    /// Include platform details (OS, architecture) in the User-Agent header
    /// (default: true)
    #[serde(default = "default_true")]
    pub send_platform_info: bool,

    /// Optional application name/version appended to the User-Agent header
    #[serde(default)]
    pub app_info: Option<AppInfo>,
}

impl Default for TranslatorOptions {
    fn default() -> Self {
        Self {
            server_url: None,
            max_retries: default_max_retries(),
            min_timeout: default_min_timeout(),
            poll_interval: default_poll_interval(),
            backoff: BackoffConfig::default(),
            send_platform_info: true,
            app_info: None,
        }
    }
}

fn default_initial_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(120)
}

fn default_multiplier() -> f64 {
    1.6
}

fn default_jitter() -> f64 {
    0.23
}

fn default_max_retries() -> u32 {
    5
}

fn default_min_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(5)
}

fn default_true() -> bool {
    true
}

// Duration serialization helper (seconds as integer)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
