//! Parameters for Bot API method calls.

use serde::Serialize;

/// Parameters for `sendMessage`.
#[derive(Debug, Clone, Serialize)]
pub struct SendMessageParams<'a> {
    pub chat_id: i64,
    pub text: &'a str,
    pub disable_web_page_preview: bool,
}

/// Parameters for `editMessageText`.
#[derive(Debug, Clone, Serialize)]
pub struct EditMessageTextParams<'a> {
    pub chat_id: i64,
    pub message_id: i64,
    pub text: &'a str,
    pub disable_web_page_preview: bool,
}

/// Parameters for `getFile`.
#[derive(Debug, Clone, Serialize)]
pub struct GetFileParams<'a> {
    pub file_id: &'a str,
}

/// Parameters for `setWebhook`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SetWebhookParams {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_token: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub allowed_updates: Vec<String>,
    pub drop_pending_updates: bool,
}

impl SetWebhookParams {
    /// Register `url` for message updates.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            allowed_updates: vec!["message".to_string()],
            ..Default::default()
        }
    }

    /// Require Telegram to send this secret in every webhook request.
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret_token = Some(secret.into());
        self
    }

    /// Discard updates queued while no webhook was set.
    pub fn drop_pending(mut self, drop: bool) -> Self {
        self.drop_pending_updates = drop;
        self
    }
}
