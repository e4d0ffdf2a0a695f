//! Configuration loaded from environment variables.

use std::env;
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use orchestrator::{PipelineConfig, PollConfig, DEFAULT_MAX_UPLOAD_BYTES};

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_WEBHOOK_PATH: &str = "/telegram/webhook";
const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";
const DEFAULT_DB_PATH: &str = "./data/bot.sqlite";
const DEFAULT_MEDIA_GROUP_DELAY_MS: u64 = 2000;
const DEFAULT_POLL_INTERVAL_SECS: u64 = 3;
const DEFAULT_POLL_TIMEOUT_SECS: u64 = 180;

/// Bot server configuration.
#[derive(Clone)]
pub struct Config {
    /// Telegram bot token.
    pub telegram_token: String,
    /// Secret the stored API keys are encrypted with.
    pub master_key: String,
    /// Webhook server bind address.
    pub listen_addr: SocketAddr,
    pub webhook_path: String,
    /// Expected `X-Telegram-Bot-Api-Secret-Token`, if any.
    pub webhook_secret: Option<String>,
    pub telegram_api_url: String,
    pub db_path: PathBuf,
    pub media_group_delay: Duration,
    pub max_upload_bytes: u64,
    pub poll_interval: Duration,
    pub poll_timeout: Duration,
    /// Reported by `/status`.
    pub version: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `TELEGRAM_BOT_TOKEN` | Bot token | (required) |
    /// | `API_KEY_MASTER_KEY` | Master secret for stored API keys | (required) |
    /// | `LISTEN_ADDR` | Server bind address | `0.0.0.0:8080` |
    /// | `TELEGRAM_WEBHOOK_PATH` | Webhook route, starts with `/` | `/telegram/webhook` |
    /// | `TELEGRAM_WEBHOOK_SECRET` | Webhook secret token | (none) |
    /// | `TELEGRAM_API_URL` | Bot API base URL | `https://api.telegram.org` |
    /// | `DB_PATH` | SQLite file | `./data/bot.sqlite` |
    /// | `MEDIA_GROUP_DELAY_MS` | Album debounce window | `2000` |
    /// | `MAX_UPLOAD_BYTES` | Attachment ceiling | `52428800` |
    /// | `POLL_INTERVAL_SECS` | Polling interval | `3` |
    /// | `POLL_TIMEOUT_SECS` | Polling timeout | `180` |
    /// | `BOT_VERSION` | Version shown by `/status` | crate version |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the configuration from any variable source.
    ///
    /// Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let telegram_token =
            var("TELEGRAM_BOT_TOKEN").ok_or(ConfigError::Missing("TELEGRAM_BOT_TOKEN"))?;
        let master_key =
            var("API_KEY_MASTER_KEY").ok_or(ConfigError::Missing("API_KEY_MASTER_KEY"))?;

        let listen_addr = parse_or(&var, "LISTEN_ADDR", DEFAULT_LISTEN_ADDR)?;

        let webhook_path =
            var("TELEGRAM_WEBHOOK_PATH").unwrap_or_else(|| DEFAULT_WEBHOOK_PATH.to_string());
        if !webhook_path.starts_with('/') {
            return Err(ConfigError::WebhookPath(webhook_path));
        }

        let media_group_delay_ms: u64 = parse_or(
            &var,
            "MEDIA_GROUP_DELAY_MS",
            &DEFAULT_MEDIA_GROUP_DELAY_MS.to_string(),
        )?;
        let max_upload_bytes: u64 = parse_or(
            &var,
            "MAX_UPLOAD_BYTES",
            &DEFAULT_MAX_UPLOAD_BYTES.to_string(),
        )?;
        let poll_interval_secs: u64 = parse_or(
            &var,
            "POLL_INTERVAL_SECS",
            &DEFAULT_POLL_INTERVAL_SECS.to_string(),
        )?;
        let poll_timeout_secs: u64 = parse_or(
            &var,
            "POLL_TIMEOUT_SECS",
            &DEFAULT_POLL_TIMEOUT_SECS.to_string(),
        )?;

        Ok(Self {
            telegram_token,
            master_key,
            listen_addr,
            webhook_path,
            webhook_secret: var("TELEGRAM_WEBHOOK_SECRET"),
            telegram_api_url: var("TELEGRAM_API_URL")
                .unwrap_or_else(|| DEFAULT_TELEGRAM_API_URL.to_string()),
            db_path: var("DB_PATH")
                .unwrap_or_else(|| DEFAULT_DB_PATH.to_string())
                .into(),
            media_group_delay: Duration::from_millis(media_group_delay_ms),
            // Zero would disable the ceiling for files of undeclared size.
            max_upload_bytes: if max_upload_bytes == 0 {
                DEFAULT_MAX_UPLOAD_BYTES
            } else {
                max_upload_bytes
            },
            poll_interval: Duration::from_secs(poll_interval_secs),
            poll_timeout: Duration::from_secs(poll_timeout_secs),
            version: var("BOT_VERSION").unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string()),
        })
    }

    /// Pipeline tunables; both waiters share one interval and timeout.
    pub fn pipeline(&self) -> PipelineConfig {
        let poll = PollConfig::new(self.poll_interval, self.poll_timeout);
        PipelineConfig {
            max_upload_bytes: self.max_upload_bytes,
            extraction: poll,
            summary: poll,
        }
    }
}

fn parse_or<T, F>(var: &F, name: &'static str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let value = var(name).unwrap_or_else(|| default.to_string());
    value
        .parse()
        .map_err(|_| ConfigError::Invalid { name, value })
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("telegram_token", &"[REDACTED]")
            .field("master_key", &"[REDACTED]")
            .field("listen_addr", &self.listen_addr)
            .field("webhook_path", &self.webhook_path)
            .field("webhook_secret", &self.webhook_secret.as_ref().map(|_| "[REDACTED]"))
            .field("telegram_api_url", &self.telegram_api_url)
            .field("db_path", &self.db_path)
            .field("media_group_delay", &self.media_group_delay)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("poll_interval", &self.poll_interval)
            .field("poll_timeout", &self.poll_timeout)
            .field("version", &self.version)
            .finish()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    #[error("Invalid {name} value: {value:?}")]
    Invalid { name: &'static str, value: String },

    #[error("TELEGRAM_WEBHOOK_PATH must start with '/': {0:?}")]
    WebhookPath(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    const REQUIRED: [(&str, &str); 2] = [
        ("TELEGRAM_BOT_TOKEN", "123:ABC"),
        ("API_KEY_MASTER_KEY", "hunter2"),
    ];

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&REQUIRED)).unwrap();
        assert_eq!(config.listen_addr, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(config.webhook_path, "/telegram/webhook");
        assert!(config.webhook_secret.is_none());
        assert_eq!(config.telegram_api_url, "https://api.telegram.org");
        assert_eq!(config.db_path, PathBuf::from("./data/bot.sqlite"));
        assert_eq!(config.media_group_delay, Duration::from_secs(2));
        assert_eq!(config.max_upload_bytes, 52_428_800);
        assert_eq!(config.poll_interval, Duration::from_secs(3));
        assert_eq!(config.poll_timeout, Duration::from_secs(180));
        assert_eq!(config.version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_missing_required() {
        let err = Config::from_lookup(lookup(&[("API_KEY_MASTER_KEY", "m")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("TELEGRAM_BOT_TOKEN")));

        let err = Config::from_lookup(lookup(&[("TELEGRAM_BOT_TOKEN", "t"), ("API_KEY_MASTER_KEY", "  ")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Missing("API_KEY_MASTER_KEY")));
    }

    #[test]
    fn test_overrides() {
        let mut pairs = REQUIRED.to_vec();
        pairs.extend([
            ("LISTEN_ADDR", "127.0.0.1:9000"),
            ("TELEGRAM_WEBHOOK_PATH", "/hook"),
            ("TELEGRAM_WEBHOOK_SECRET", "s3cret"),
            ("MEDIA_GROUP_DELAY_MS", "500"),
            ("MAX_UPLOAD_BYTES", "1024"),
            ("POLL_INTERVAL_SECS", "1"),
            ("POLL_TIMEOUT_SECS", "30"),
            ("BOT_VERSION", "1.2.3"),
        ]);
        let config = Config::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(config.listen_addr.port(), 9000);
        assert_eq!(config.webhook_path, "/hook");
        assert_eq!(config.webhook_secret.as_deref(), Some("s3cret"));
        assert_eq!(config.media_group_delay, Duration::from_millis(500));
        assert_eq!(config.version, "1.2.3");

        let pipeline = config.pipeline();
        assert_eq!(pipeline.max_upload_bytes, 1024);
        assert_eq!(pipeline.extraction.interval, Duration::from_secs(1));
        assert_eq!(pipeline.summary.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_zero_upload_limit_falls_back_to_default() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("MAX_UPLOAD_BYTES", "0"));
        let config = Config::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(config.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
        assert_eq!(config.pipeline().max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
    }

    #[test]
    fn test_invalid_values() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("TELEGRAM_WEBHOOK_PATH", "hook"));
        assert!(matches!(
            Config::from_lookup(lookup(&pairs)),
            Err(ConfigError::WebhookPath(_))
        ));

        let mut pairs = REQUIRED.to_vec();
        pairs.push(("POLL_TIMEOUT_SECS", "soon"));
        assert!(matches!(
            Config::from_lookup(lookup(&pairs)),
            Err(ConfigError::Invalid { name: "POLL_TIMEOUT_SECS", .. })
        ));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("TELEGRAM_WEBHOOK_SECRET", "s3cret"));
        let config = Config::from_lookup(lookup(&pairs)).unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("123:ABC"));
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("s3cret"));
    }
}
