//! Analysis API endpoint configuration

use std::env;

pub const DEFAULT_API_URL: &str = "http://developer.echonest.com/api";
const DEFAULT_TIMEOUT_MS: u64 = 60_000;

/// Where and how to reach the remote analysis API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzeConfig {
    /// Base URL; methods are appended as path segments
    pub api_url: String,
    /// Developer key sent with every request
    pub api_key: String,
    /// Per-request timeout
    pub timeout_ms: u64,
}

impl AnalyzeConfig {
    /// Read configuration from `REMIX_ANALYZE_*` environment variables
    pub fn from_env() -> Self {
        let api_url =
            env::var("REMIX_ANALYZE_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.into());
        let api_key = env::var("REMIX_ANALYZE_API_KEY").unwrap_or_default();
        let timeout_ms = env::var("REMIX_ANALYZE_TIMEOUT_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_MS);

        Self {
            api_url,
            api_key,
            timeout_ms,
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Full URL of a remote method
    pub fn method_url(&self, method: &str) -> String {
        format!("{}/{}", self.api_url.trim_end_matches('/'), method)
    }
}

impl Default for AnalyzeConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: String::new(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}
