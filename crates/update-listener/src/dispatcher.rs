//! Routing of Telegram updates.

use std::sync::Arc;
use std::time::Duration;

use keep_core::{Acknowledger, Batch, MessageUnit, UserStore};
use orchestrator::{CommandHandler, FlushFn, MediaGroupCollector, Pipeline};
use telegram_client::{MessageExt, Update};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// What the dispatcher did with an update.
#[derive(Debug)]
pub enum Dispatch {
    /// Nothing to do.
    Ignored(&'static str),
    /// A setup command was answered.
    Command(String),
    /// The message was buffered as part of an album.
    Buffered { group_id: String },
    /// The message is being processed as its own batch.
    Processing(JoinHandle<bool>),
}

/// Sends each update to the command handler, the album collector or the
/// pipeline.
pub struct UpdateDispatcher {
    store: Arc<dyn UserStore>,
    commands: CommandHandler,
    collector: MediaGroupCollector,
    pipeline: Arc<Pipeline>,
}

impl UpdateDispatcher {
    pub fn new(
        pipeline: Arc<Pipeline>,
        store: Arc<dyn UserStore>,
        replies: Arc<dyn Acknowledger>,
        version: impl Into<String>,
        media_group_delay: Duration,
    ) -> Self {
        let flush_target = Arc::clone(&pipeline);
        let on_flush: FlushFn = Arc::new(move |group_id: String, units: Vec<MessageUnit>| {
            match Batch::group(group_id.as_str(), units) {
                Some(batch) => {
                    info!(group_id = %group_id, members = batch.len(), "Album complete");
                    flush_target.spawn_batch(batch);
                }
                None => warn!(group_id = %group_id, "Dropping inconsistent album"),
            }
        });

        Self {
            commands: CommandHandler::new(Arc::clone(&store), replies, version),
            collector: MediaGroupCollector::new(media_group_delay, on_flush),
            store,
            pipeline,
        }
    }

    pub fn collector(&self) -> &MediaGroupCollector {
        &self.collector
    }

    /// Handle one update. Must be called from within a Tokio runtime.
    pub async fn dispatch(&self, update: Update) -> Dispatch {
        let update_id = update.update_id;
        let Some(message) = update.message else {
            debug!(update_id, "Ignoring update without message");
            return Dispatch::Ignored("no message");
        };
        let Some(unit) = message.to_message_unit() else {
            debug!(update_id, "Ignoring message without sender");
            return Dispatch::Ignored("no sender");
        };

        if let Err(e) = self.store.ensure_user(unit.sender_id).await {
            warn!(user_id = unit.sender_id, "Failed to ensure user: {}", e);
        }

        if let Some(command) = unit.command.clone() {
            self.commands.handle(&unit, &command).await;
            return Dispatch::Command(command.name);
        }

        if let Some(group_id) = unit.media_group_id.clone() {
            self.collector.collect(unit);
            return Dispatch::Buffered { group_id };
        }

        Dispatch::Processing(self.pipeline.spawn_batch(Batch::single(unit)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mock_services::{
        ApiCall, InMemoryUserStore, MockAcknowledger, MockBookmarkApi, MockConnector,
        MockFileSource, Scripted,
    };
    use orchestrator::PRIVATE_ONLY;
    use serde_json::json;

    struct Fixture {
        dispatcher: UpdateDispatcher,
        ack: Arc<MockAcknowledger>,
        api: Arc<MockBookmarkApi>,
        store: Arc<InMemoryUserStore>,
    }

    fn fixture(store: InMemoryUserStore) -> Fixture {
        let ack = Arc::new(MockAcknowledger::new());
        let api = Arc::new(
            MockBookmarkApi::new()
                .with_gets([Scripted::Ok(json!({"id": "bm_1", "summary": "Done."}))]),
        );
        let store = Arc::new(store);
        let files = Arc::new(
            MockFileSource::new()
                .with_file("a", vec![1u8; 3], "photos/a.jpg")
                .with_file("b", vec![2u8; 3], "photos/b.jpg"),
        );
        let pipeline = Arc::new(Pipeline::new(
            ack.clone(),
            files,
            Arc::new(MockConnector::new(api.clone())),
            store.clone(),
        ));
        let dispatcher = UpdateDispatcher::new(
            pipeline,
            store.clone(),
            ack.clone(),
            "test",
            Duration::from_secs(2),
        );
        Fixture {
            dispatcher,
            ack,
            api,
            store,
        }
    }

    fn update(message: serde_json::Value) -> Update {
        serde_json::from_value(json!({"update_id": 1, "message": message})).unwrap()
    }

    fn private_text(text: &str, entities: serde_json::Value) -> Update {
        update(json!({
            "message_id": 5,
            "from": {"id": 42, "is_bot": false, "first_name": "A"},
            "chat": {"id": 42, "type": "private"},
            "date": 1_700_000_000,
            "text": text,
            "entities": entities,
        }))
    }

    fn album_photo(file_id: &str, caption: Option<&str>) -> Update {
        let mut message = json!({
            "message_id": 6,
            "from": {"id": 42, "is_bot": false, "first_name": "A"},
            "chat": {"id": 42, "type": "private"},
            "date": 1_700_000_000,
            "media_group_id": "album-9",
            "photo": [{"file_id": file_id, "file_unique_id": file_id, "width": 1, "height": 1, "file_size": 3}],
        });
        if let Some(caption) = caption {
            message["caption"] = json!(caption);
        }
        update(message)
    }

    #[tokio::test]
    async fn test_update_without_message_or_sender_is_ignored() {
        let f = fixture(InMemoryUserStore::new());

        let empty: Update = serde_json::from_value(json!({"update_id": 3})).unwrap();
        assert!(matches!(
            f.dispatcher.dispatch(empty).await,
            Dispatch::Ignored("no message")
        ));

        let anonymous = update(json!({
            "message_id": 1,
            "chat": {"id": -100, "type": "channel"},
            "text": "hello",
        }));
        assert!(matches!(
            f.dispatcher.dispatch(anonymous).await,
            Dispatch::Ignored("no sender")
        ));
        assert!(f.ack.events().await.is_empty());
    }

    #[tokio::test]
    async fn test_command_creates_user_and_replies() {
        let f = fixture(InMemoryUserStore::new());

        let result = f
            .dispatcher
            .dispatch(private_text(
                "/key abc",
                json!([{"type": "bot_command", "offset": 0, "length": 4}]),
            ))
            .await;

        assert!(matches!(result, Dispatch::Command(ref name) if name == "key"));
        assert_eq!(f.ack.sent_texts().await, vec!["✅ API key saved."]);
        assert_eq!(
            f.store.snapshot(42).await.unwrap().api_key.as_deref(),
            Some("abc")
        );
    }

    #[tokio::test]
    async fn test_command_in_group_is_refused() {
        let f = fixture(InMemoryUserStore::new());
        let group = update(json!({
            "message_id": 5,
            "from": {"id": 42, "is_bot": false, "first_name": "A"},
            "chat": {"id": -7, "type": "group", "title": "friends"},
            "text": "/status",
            "entities": [{"type": "bot_command", "offset": 0, "length": 7}],
        }));

        f.dispatcher.dispatch(group).await;

        assert_eq!(f.ack.sent_texts().await, vec![PRIVATE_ONLY]);
    }

    #[tokio::test]
    async fn test_plain_message_is_processed() {
        let f = fixture(InMemoryUserStore::configured(42, "https://keep.example.com", "k"));

        let result = f.dispatcher.dispatch(private_text("buy milk", json!([]))).await;

        let Dispatch::Processing(handle) = result else {
            panic!("expected processing");
        };
        assert!(handle.await.unwrap());
        assert_eq!(f.api.created().await.len(), 1);
        assert_eq!(f.ack.final_text(100).await.as_deref(), Some("✅ Saved as a note\n\nSummary:\nDone."));
    }

    #[tokio::test(start_paused = true)]
    async fn test_album_members_are_processed_together() {
        let f = fixture(InMemoryUserStore::configured(42, "https://keep.example.com", "k"));

        let first = f.dispatcher.dispatch(album_photo("a", None)).await;
        assert!(matches!(first, Dispatch::Buffered { ref group_id } if group_id == "album-9"));
        f.dispatcher.dispatch(album_photo("b", Some("holiday"))).await;
        assert_eq!(f.dispatcher.collector().pending_groups(), 1);

        tokio::time::sleep(Duration::from_secs(3)).await;

        assert_eq!(f.dispatcher.collector().pending_groups(), 0);
        assert_eq!(f.api.created().await.len(), 1);
        assert_eq!(f.api.count(|c| matches!(c, ApiCall::Attach { .. })).await, 2);
        assert_eq!(f.ack.sent_texts().await, vec!["⏳ Saving as a note…"]);
    }
}
