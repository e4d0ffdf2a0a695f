//! Configuration for one Karakeep server and API key.

use std::fmt;
use std::time::Duration;

use url::Url;

use crate::error::KarakeepError;

/// API path prefix tried first.
pub const DEFAULT_API_PREFIX: &str = "/api/v1";

/// Default timeout for a single request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Connection settings for a Karakeep server.
#[derive(Clone)]
pub struct KarakeepConfig {
    /// Server origin, `https://host[:port]`, without a path.
    pub base_url: String,
    /// Bearer API key.
    pub api_key: String,
    /// Timeout for a single request.
    pub timeout: Duration,
    /// Path prefix of the API (e.g., "/api/v1").
    pub api_prefix: String,
}

impl KarakeepConfig {
    /// Validate and normalize a server URL and API key.
    ///
    /// The URL must be `https` with a host; any path, query or fragment is dropped.
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, KarakeepError> {
        let base = base_url.trim();
        if base.is_empty() {
            return Err(KarakeepError::Config("base url is empty".to_string()));
        }

        let parsed = Url::parse(base)
            .map_err(|_| KarakeepError::Config(format!("invalid base url: {:?}", base)))?;
        let host = parsed
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| KarakeepError::Config(format!("invalid base url: {:?}", base)))?;
        if parsed.scheme() != "https" {
            return Err(KarakeepError::Config(format!(
                "base url must be https: {:?}",
                base
            )));
        }

        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(KarakeepError::Config("api key is empty".to_string()));
        }

        let base_url = match parsed.port() {
            Some(port) => format!("https://{}:{}", host, port),
            None => format!("https://{}", host),
        };

        Ok(Self {
            base_url,
            api_key: api_key.to_string(),
            timeout: DEFAULT_TIMEOUT,
            api_prefix: DEFAULT_API_PREFIX.to_string(),
        })
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the API prefix; a missing leading slash is added.
    pub fn with_api_prefix(mut self, prefix: &str) -> Self {
        self.api_prefix = normalize_prefix(prefix);
        self
    }
}

impl fmt::Debug for KarakeepConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KarakeepConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("api_prefix", &self.api_prefix)
            .finish()
    }
}

pub(crate) fn normalize_prefix(prefix: &str) -> String {
    let prefix = prefix.trim().trim_end_matches('/');
    if prefix.is_empty() {
        DEFAULT_API_PREFIX.to_string()
    } else if prefix.starts_with('/') {
        prefix.to_string()
    } else {
        format!("/{}", prefix)
    }
}

/// The other common prefix, tried once after a 404.
pub(crate) fn alternate_prefix(prefix: &str) -> &'static str {
    match prefix {
        "/api/v1" => "/api",
        _ => "/api/v1",
    }
}
