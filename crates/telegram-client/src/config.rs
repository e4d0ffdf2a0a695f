//! Configuration types for telegram-client.

use std::fmt;
use std::time::Duration;

/// Default Bot API base URL.
pub const DEFAULT_API_URL: &str = "https://api.telegram.org";

/// Configuration for connecting to the Bot API.
#[derive(Clone)]
pub struct BotConfig {
    /// Base URL of the Bot API (e.g., "https://api.telegram.org").
    pub api_url: String,
    /// Bot token issued by BotFather.
    pub token: String,
    /// Timeout for regular API calls.
    pub request_timeout: Duration,
    /// Timeout for file downloads.
    pub download_timeout: Duration,
}

impl BotConfig {
    /// Create a new configuration for the public Bot API.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token: token.into(),
            request_timeout: Duration::from_secs(30),
            download_timeout: Duration::from_secs(60),
        }
    }

    /// Use a different Bot API server (e.g., a local bot API instance).
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Get the URL of a Bot API method.
    pub fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_url, self.token, method)
    }

    /// Get the download URL of a file path returned by `getFile`.
    pub fn file_url(&self, file_path: &str) -> String {
        format!(
            "{}/file/bot{}/{}",
            self.api_url,
            self.token,
            file_path.trim_start_matches('/')
        )
    }
}

impl fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotConfig")
            .field("api_url", &self.api_url)
            .field("token", &"<redacted>")
            .field("request_timeout", &self.request_timeout)
            .field("download_timeout", &self.download_timeout)
            .finish()
    }
}
