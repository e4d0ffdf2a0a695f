//! Setup commands (`/start`, `/help`, `/server`, `/key`, `/status`).

use std::sync::Arc;

use chrono::SecondsFormat;
use keep_core::{Acknowledger, Command, MessageUnit, StoreError, UserSettings, UserStore};
use tracing::{info, warn};

use crate::server_url::validate_server_url;

const NOT_SET: &str = "(not set)";

pub const PRIVATE_ONLY: &str = "Setup commands are only available in a private chat.";
pub const UNKNOWN_COMMAND: &str = "Unknown command. /help";
const READ_FAILED: &str = "Failed to read settings.";

pub const HELP_TEXT: &str = "Commands:\n\
/server - show the current server\n\
/server <url> - set the server (https only)\n\
/key - check whether an API key is set\n\
/key <token> - set the API key\n\
/status - status\n\
/help - help";

/// Answers setup commands in a private chat.
pub struct CommandHandler {
    store: Arc<dyn UserStore>,
    replies: Arc<dyn Acknowledger>,
    version: String,
}

impl CommandHandler {
    pub fn new(
        store: Arc<dyn UserStore>,
        replies: Arc<dyn Acknowledger>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            store,
            replies,
            version: version.into(),
        }
    }

    /// Run `command` and send its reply to the originating chat.
    pub async fn handle(&self, unit: &MessageUnit, command: &Command) {
        let reply = self.reply_for(unit, command).await;
        if let Err(e) = self.replies.send(unit.chat_id, &reply).await {
            warn!(chat_id = unit.chat_id, command = %command.name, "Failed to send command reply: {}", e);
        }
    }

    /// Run `command` and return the reply text.
    pub async fn reply_for(&self, unit: &MessageUnit, command: &Command) -> String {
        if !unit.is_private_chat {
            return PRIVATE_ONLY.to_string();
        }

        info!(user_id = unit.sender_id, command = %command.name, "Handling command");
        let user_id = unit.sender_id;
        let args = command.arguments.trim();

        match command.name.as_str() {
            "start" => self.start(user_id).await,
            "help" => HELP_TEXT.to_string(),
            "server" if args.is_empty() => self.show_server(user_id).await,
            "server" => self.set_server(user_id, args).await,
            "key" if args.is_empty() => self.show_key(user_id).await,
            "key" => self.set_key(user_id, args).await,
            "status" => self.status(user_id).await,
            _ => UNKNOWN_COMMAND.to_string(),
        }
    }

    async fn load(&self, user_id: i64) -> Result<UserSettings, StoreError> {
        Ok(self.store.get_user(user_id).await?.unwrap_or(UserSettings {
            user_id,
            ..Default::default()
        }))
    }

    /// Whether a usable API key is stored; an undecryptable key counts as absent.
    async fn key_is_set(&self, user_id: i64) -> Result<bool, StoreError> {
        match self.store.get_user(user_id).await {
            Ok(settings) => Ok(settings
                .and_then(|s| s.api_key)
                .is_some_and(|k| !k.trim().is_empty())),
            Err(StoreError::Crypto(e)) => {
                warn!(user_id, "Stored API key cannot be decrypted: {}", e);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    async fn start(&self, user_id: i64) -> String {
        let server = match self.load(user_id).await {
            Ok(settings) => server_label(&settings),
            Err(e) => {
                warn!(user_id, "Failed to load settings: {}", e);
                NOT_SET.to_string()
            }
        };
        format!(
            "Hi! I save messages to Karakeep using your API key.\n\n\
             Current server: {}\n\n\
             Set up first:\n\
             /server https://<your_karakeep>\n\
             /key <API_KEY>\n\n\
             Then just send links, text or media.",
            server
        )
    }

    async fn show_server(&self, user_id: i64) -> String {
        match self.load(user_id).await {
            Ok(settings) => format!(
                "Current server: {}\nSet it with: /server https://<host>",
                server_label(&settings)
            ),
            Err(e) => {
                warn!(user_id, "Failed to load settings: {}", e);
                READ_FAILED.to_string()
            }
        }
    }

    async fn set_server(&self, user_id: i64, raw: &str) -> String {
        let normalized = match validate_server_url(raw).await {
            Ok(url) => url,
            Err(e) => {
                info!(user_id, "Rejected server url: {}", e);
                return "Invalid or unsafe URL. Only public https is allowed. Example: /server https://karakeep.example.com".to_string();
            }
        };

        match self.store.set_server_url(user_id, &normalized).await {
            Ok(()) => format!("✅ Server saved: {}", normalized),
            Err(e) => {
                warn!(user_id, "Failed to save server: {}", e);
                "Failed to save the server.".to_string()
            }
        }
    }

    async fn show_key(&self, user_id: i64) -> String {
        match self.key_is_set(user_id).await {
            Ok(true) => "API key: set ✅".to_string(),
            Ok(false) => "API key: not set ❌\nSet it with: /key <API_KEY>".to_string(),
            Err(e) => {
                warn!(user_id, "Failed to load settings: {}", e);
                READ_FAILED.to_string()
            }
        }
    }

    async fn set_key(&self, user_id: i64, key: &str) -> String {
        match self.store.set_api_key(user_id, key).await {
            Ok(()) => "✅ API key saved.".to_string(),
            Err(e) => {
                warn!(user_id, "Failed to save api key: {}", e);
                "Failed to save the API key.".to_string()
            }
        }
    }

    async fn status(&self, user_id: i64) -> String {
        let key_set = match self.key_is_set(user_id).await {
            Ok(set) => set,
            Err(e) => {
                warn!(user_id, "Failed to load settings: {}", e);
                return READ_FAILED.to_string();
            }
        };
        // The key lookup above already covered undecryptable rows.
        let settings = self.load(user_id).await.unwrap_or(UserSettings {
            user_id,
            ..Default::default()
        });

        let last = settings
            .last_success_at
            .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
            .unwrap_or_else(|| "none".to_string());

        format!(
            "Server: {}\nKey: {}\nLast successful save: {}\nVersion: {}",
            server_label(&settings),
            if key_set { "yes" } else { "no" },
            last,
            self.version.trim()
        )
    }
}

fn server_label(settings: &UserSettings) -> String {
    settings
        .server_url
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(NOT_SET)
        .to_string()
}
