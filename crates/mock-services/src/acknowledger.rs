use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use async_trait::async_trait;
use keep_core::{Acknowledger, TransportError};
use tokio::sync::Mutex;

/// One call made against a [`MockAcknowledger`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AckEvent {
    Sent {
        chat_id: i64,
        message_id: i64,
        text: String,
    },
    Edited {
        chat_id: i64,
        message_id: i64,
        text: String,
    },
}

impl AckEvent {
    pub fn text(&self) -> &str {
        match self {
            AckEvent::Sent { text, .. } | AckEvent::Edited { text, .. } => text,
        }
    }
}

/// Acknowledger that remembers every message it was asked to send or edit.
#[derive(Debug)]
pub struct MockAcknowledger {
    next_id: AtomicI64,
    fail_send: AtomicBool,
    events: Mutex<Vec<AckEvent>>,
}

impl Default for MockAcknowledger {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAcknowledger {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(100),
            fail_send: AtomicBool::new(false),
            events: Mutex::new(Vec::new()),
        }
    }

    /// Make every `send` fail.
    pub fn failing_send() -> Self {
        let ack = Self::new();
        ack.fail_send.store(true, Ordering::SeqCst);
        ack
    }

    pub async fn events(&self) -> Vec<AckEvent> {
        self.events.lock().await.clone()
    }

    /// Texts of new messages, in order.
    pub async fn sent_texts(&self) -> Vec<String> {
        self.events
            .lock()
            .await
            .iter()
            .filter(|e| matches!(e, AckEvent::Sent { .. }))
            .map(|e| e.text().to_string())
            .collect()
    }

    /// Texts written into `message_id`, its original text first.
    pub async fn history(&self, message_id: i64) -> Vec<String> {
        self.events
            .lock()
            .await
            .iter()
            .filter(|e| match e {
                AckEvent::Sent { message_id: id, .. } | AckEvent::Edited { message_id: id, .. } => {
                    *id == message_id
                }
            })
            .map(|e| e.text().to_string())
            .collect()
    }

    /// What `message_id` shows now.
    pub async fn final_text(&self, message_id: i64) -> Option<String> {
        self.history(message_id).await.pop()
    }
}

#[async_trait]
impl Acknowledger for MockAcknowledger {
    async fn send(&self, chat_id: i64, text: &str) -> Result<i64, TransportError> {
        if self.fail_send.load(Ordering::SeqCst) {
            return Err(TransportError::Request("send disabled".to_string()));
        }
        let message_id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.events.lock().await.push(AckEvent::Sent {
            chat_id,
            message_id,
            text: text.to_string(),
        });
        Ok(message_id)
    }

    async fn edit(&self, chat_id: i64, message_id: i64, text: &str) -> Result<(), TransportError> {
        self.events.lock().await.push(AckEvent::Edited {
            chat_id,
            message_id,
            text: text.to_string(),
        });
        Ok(())
    }
}
