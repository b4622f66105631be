//! Ledger API configuration.

use serde::Deserialize;

/// Environment variable holding the ledger API bearer token.
pub const LEDGER_TOKEN_ENV: &str = "SNAPSETTLE_LEDGER_TOKEN";

/// `[ledger]` configuration section.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Base URL of the ledger REST API.
    #[serde(default)]
    pub api_url: String,
    /// Snapshots requested per poll.
    #[serde(default = "default_fetch_limit")]
    pub fetch_limit: usize,
    #[serde(default)]
    pub http: LedgerHttpConfig,
}

const fn default_fetch_limit() -> usize {
    100
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            fetch_limit: default_fetch_limit(),
            http: LedgerHttpConfig::default(),
        }
    }
}

/// Ledger HTTP client configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerHttpConfig {
    /// Request timeout in milliseconds.
    #[serde(default = "default_http_timeout_ms")]
    pub timeout_ms: u64,
    /// Connect timeout in milliseconds.
    #[serde(default = "default_http_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Maximum number of attempts for transient failures.
    #[serde(default = "default_http_retry_max_attempts")]
    pub retry_max_attempts: u32,
    /// Backoff between retries in milliseconds.
    #[serde(default = "default_http_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

const fn default_http_timeout_ms() -> u64 {
    5000
}

const fn default_http_connect_timeout_ms() -> u64 {
    2000
}

const fn default_http_retry_max_attempts() -> u32 {
    3
}

const fn default_http_retry_backoff_ms() -> u64 {
    500
}

impl Default for LedgerHttpConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_http_timeout_ms(),
            connect_timeout_ms: default_http_connect_timeout_ms(),
            retry_max_attempts: default_http_retry_max_attempts(),
            retry_backoff_ms: default_http_retry_backoff_ms(),
        }
    }
}
