//! Telegram Bot API HTTP client.

use std::borrow::Cow;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::BotConfig;
use crate::error::TelegramError;
use crate::types::{
    ApiResponse, EditMessageTextParams, File, GetFileParams, Message, SendMessageParams,
    SetWebhookParams,
};

/// Longest text the Bot API accepts in a single message, in characters.
pub const MAX_MESSAGE_CHARS: usize = 4096;

/// Truncate `text` to [`MAX_MESSAGE_CHARS`], ending with an ellipsis when cut.
pub fn truncate_message(text: &str) -> Cow<'_, str> {
    if text.chars().count() <= MAX_MESSAGE_CHARS {
        return Cow::Borrowed(text);
    }
    let mut cut: String = text.chars().take(MAX_MESSAGE_CHARS - 1).collect();
    cut.push('…');
    Cow::Owned(cut)
}

/// Client for the Telegram Bot API.
#[derive(Clone)]
pub struct TelegramClient {
    http: Client,
    download_http: Client,
    config: BotConfig,
}

impl TelegramClient {
    /// Create a client. No request is made until a method is called.
    pub fn new(config: BotConfig) -> Result<Self, TelegramError> {
        if config.token.trim().is_empty() {
            return Err(TelegramError::Config("bot token is empty".to_string()));
        }

        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(TelegramError::Http)?;
        let download_http = Client::builder()
            .timeout(config.download_timeout)
            .build()
            .map_err(TelegramError::Http)?;

        Ok(Self {
            http,
            download_http,
            config,
        })
    }

    /// Send a text message, returning the sent message.
    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<Message, TelegramError> {
        let text = truncate_message(text);
        let params = SendMessageParams {
            chat_id,
            text: &text,
            disable_web_page_preview: true,
        };
        self.call("sendMessage", &params).await
    }

    /// Replace the text of a message previously sent by the bot.
    pub async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
    ) -> Result<(), TelegramError> {
        let text = truncate_message(text);
        let params = EditMessageTextParams {
            chat_id,
            message_id,
            text: &text,
            disable_web_page_preview: true,
        };
        // The result is either the edited message or `true`.
        let _: serde_json::Value = self.call("editMessageText", &params).await?;
        Ok(())
    }

    /// Resolve a file id into a downloadable file path.
    pub async fn get_file(&self, file_id: &str) -> Result<File, TelegramError> {
        self.call("getFile", &GetFileParams { file_id }).await
    }

    /// Download a file's bytes, returning them with the platform file path.
    ///
    /// With `max_bytes > 0`, fails with [`TelegramError::FileTooLarge`] as soon as
    /// the declared or received size exceeds the ceiling.
    pub async fn download_file(
        &self,
        file_id: &str,
        max_bytes: u64,
    ) -> Result<(Vec<u8>, String), TelegramError> {
        let file_id = file_id.trim();
        if file_id.is_empty() {
            return Err(TelegramError::InvalidFile("file id is empty".to_string()));
        }

        let file = self.get_file(file_id).await?;
        let path = file
            .file_path
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| TelegramError::InvalidFile("empty file_path from telegram".to_string()))?;

        if let Some(size) = file.file_size {
            if max_bytes > 0 && size > max_bytes {
                return Err(TelegramError::FileTooLarge {
                    size,
                    limit: max_bytes,
                });
            }
        }

        // The file URL embeds the token; never log it.
        let mut response = self
            .download_http
            .get(self.config.file_url(&path))
            .send()
            .await
            .map_err(|e| TelegramError::Http(e.without_url()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TelegramError::DownloadFailed(status.as_u16()));
        }

        let mut bytes = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| TelegramError::Http(e.without_url()))?
        {
            bytes.extend_from_slice(&chunk);
            if max_bytes > 0 && bytes.len() as u64 > max_bytes {
                return Err(TelegramError::FileTooLarge {
                    size: bytes.len() as u64,
                    limit: max_bytes,
                });
            }
        }

        debug!("Downloaded {} bytes for file {}", bytes.len(), file_id);
        Ok((bytes, path))
    }

    /// Register the webhook URL with Telegram.
    pub async fn set_webhook(&self, params: &SetWebhookParams) -> Result<bool, TelegramError> {
        self.call("setWebhook", params).await
    }

    /// Get the configuration.
    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    /// Call a Bot API method with JSON parameters.
    async fn call<P: Serialize, R: DeserializeOwned>(
        &self,
        method: &str,
        params: &P,
    ) -> Result<R, TelegramError> {
        debug!("Bot API call: {}", method);

        let response = self
            .http
            .post(self.config.method_url(method))
            .json(params)
            .send()
            .await
            .map_err(|e| TelegramError::Http(e.without_url()))?;

        let body = response
            .bytes()
            .await
            .map_err(|e| TelegramError::Http(e.without_url()))?;
        let parsed: ApiResponse<R> = serde_json::from_slice(&body)?;

        if !parsed.ok {
            let code = parsed.error_code.unwrap_or_default();
            let description = parsed.description.unwrap_or_default();
            warn!("Bot API {} failed: {} {}", method, code, description);
            return Err(TelegramError::Api { code, description });
        }

        parsed
            .result
            .ok_or_else(|| TelegramError::MissingResult(method.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_message_is_borrowed() {
        assert!(matches!(truncate_message("hello"), Cow::Borrowed("hello")));
    }

    #[test]
    fn test_long_message_is_cut_to_limit() {
        let text = "я".repeat(MAX_MESSAGE_CHARS + 10);
        let cut = truncate_message(&text);
        assert_eq!(cut.chars().count(), MAX_MESSAGE_CHARS);
        assert!(cut.ends_with('…'));
    }

    #[test]
    fn test_exact_limit_is_untouched() {
        let text = "a".repeat(MAX_MESSAGE_CHARS);
        assert_eq!(truncate_message(&text).len(), MAX_MESSAGE_CHARS);
    }

    #[test]
    fn test_empty_token_is_rejected() {
        assert!(matches!(
            TelegramClient::new(BotConfig::new("  ")),
            Err(TelegramError::Config(_))
        ));
    }
}
