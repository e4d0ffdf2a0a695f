//! End-to-end batch scenarios against mock collaborators.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use classifier::ContentKind;
use keep_core::{Batch, Entity, MediaFile, MediaPayload, MessageUnit, NewBookmark, UserSettings};
use mock_services::{
    ApiCall, InMemoryUserStore, MockAcknowledger, MockBookmarkApi, MockConnector, MockFileSource,
    Scripted,
};
use orchestrator::{
    formatting, BatchOutcome, FlushFn, MediaGroupCollector, Pipeline, PipelineConfig,
    PipelineError,
};
use serde_json::{json, Value};
use tokio::sync::watch;
use tokio::time::Instant;

const USER: i64 = 42;
const ACK_ID: i64 = 100;

struct Harness {
    ack: Arc<MockAcknowledger>,
    api: Arc<MockBookmarkApi>,
    connector: Arc<MockConnector>,
    files: Arc<MockFileSource>,
    store: Arc<InMemoryUserStore>,
}

impl Harness {
    fn new(api: MockBookmarkApi) -> Self {
        Self::with(
            api,
            MockFileSource::new(),
            InMemoryUserStore::configured(USER, "https://keep.example.com", "secret-key"),
        )
    }

    fn with(api: MockBookmarkApi, files: MockFileSource, store: InMemoryUserStore) -> Self {
        let api = Arc::new(api);
        Self {
            ack: Arc::new(MockAcknowledger::new()),
            connector: Arc::new(MockConnector::new(api.clone())),
            api,
            files: Arc::new(files),
            store: Arc::new(store),
        }
    }

    fn pipeline(&self) -> Pipeline {
        Pipeline::new(
            self.ack.clone(),
            self.files.clone(),
            self.connector.clone(),
            self.store.clone(),
        )
    }

    async fn shown(&self) -> String {
        self.ack.final_text(ACK_ID).await.unwrap_or_default()
    }
}

fn extracted(extra: Value) -> Scripted<Value> {
    let mut record = json!({
        "id": "bm_1",
        "content": {"type": "link", "crawlStatus": "success"},
    });
    if let (Some(base), Some(extra)) = (record.as_object_mut(), extra.as_object()) {
        base.extend(extra.clone());
    }
    Scripted::Ok(record)
}

fn text(body: &str) -> MessageUnit {
    MessageUnit::text(USER, USER, body, 1_700_000_000).with_message_id(7)
}

fn photo(file_id: &str, size: u64) -> MediaPayload {
    MediaPayload {
        photo: vec![MediaFile::new(format!("{}_thumb", file_id), 10), MediaFile::new(file_id, size)],
        ..Default::default()
    }
}

#[tokio::test]
async fn url_only_is_saved_as_bookmark_without_notes() {
    let h = Harness::new(MockBookmarkApi::new().with_gets([extracted(json!({
        "title": "Example Domain",
        "summary": "A placeholder page for documentation.",
        "tags": [{"name": "web"}, {"name": "docs"}],
    }))]));
    let unit = text("https://example.com").with_entities(vec![Entity::url(0, 19)]);

    let outcome = h.pipeline().process_batch(&Batch::single(unit)).await.unwrap();

    assert_eq!(
        outcome,
        BatchOutcome::Completed {
            bookmark_id: "bm_1".to_string(),
            kind: ContentKind::Bookmark,
        }
    );
    assert_eq!(
        h.api.created().await,
        vec![NewBookmark::link("https://example.com", "")]
    );
    assert_eq!(
        h.connector.connections(),
        vec![("https://keep.example.com".to_string(), "secret-key".to_string())]
    );
    assert_eq!(
        h.ack.history(ACK_ID).await,
        vec![
            "⏳ Saving as a bookmark…".to_string(),
            "✅ Saved (id=bm_1). Waiting for content…".to_string(),
            "✅ Saved as a bookmark\n\nTitle: Example Domain\n\nSummary:\nA placeholder page for documentation.\n\nTags: web, docs".to_string(),
        ]
    );
    assert_eq!(
        h.store.snapshot(USER).await.unwrap().last_success_id.as_deref(),
        Some("bm_1")
    );
}

#[tokio::test]
async fn url_with_text_keeps_text_as_notes() {
    let h = Harness::new(
        MockBookmarkApi::new().with_gets([extracted(json!({"summary": "Worth it."}))]),
    );
    let unit = text("https://example.com interesting read").with_entities(vec![Entity::url(0, 19)]);

    h.pipeline().process_batch(&Batch::single(unit)).await.unwrap();

    assert_eq!(
        h.api.created().await,
        vec![NewBookmark::link("https://example.com", "interesting read")]
    );
}

#[tokio::test]
async fn photo_without_caption_is_saved_as_file() {
    let h = Harness::with(
        MockBookmarkApi::new().with_gets([Scripted::Ok(json!({"id": "bm_1", "summary": "A cat."}))]),
        MockFileSource::new().with_file("big", vec![7u8; 2048], "photos/file_1.jpg"),
        InMemoryUserStore::configured(USER, "https://keep.example.com", "secret-key"),
    );
    let unit = text("").with_media(photo("big", 2048));

    let outcome = h.pipeline().process_batch(&Batch::single(unit)).await.unwrap();

    assert_eq!(
        outcome,
        BatchOutcome::Completed {
            bookmark_id: "bm_1".to_string(),
            kind: ContentKind::File,
        }
    );
    assert_eq!(
        h.api.created().await,
        vec![NewBookmark::text("Telegram media (2023-11-14T22:13:20Z)")]
    );
    assert_eq!(h.files.downloads().await, vec!["big"]);
    let calls = h.api.calls().await;
    assert!(calls.contains(&ApiCall::Upload {
        filename: "photo.jpg".to_string(),
        mime: "image/jpeg".to_string(),
        size: 2048,
    }));
    assert!(calls.contains(&ApiCall::Attach {
        bookmark_id: "bm_1".to_string(),
        asset_id: "asset_1".to_string(),
    }));
    assert_eq!(h.api.count(|c| matches!(c, ApiCall::Upload { .. })).await, 1);
    assert_eq!(h.ack.sent_texts().await, vec!["⏳ Uploading file…"]);
    assert_eq!(h.shown().await, "✅ Saved as a file\n\nSummary:\nA cat.");
}

#[tokio::test]
async fn unconfigured_user_gets_one_instruction_and_no_remote_calls() {
    let h = Harness::with(
        MockBookmarkApi::new(),
        MockFileSource::new(),
        InMemoryUserStore::new().with_user(UserSettings {
            user_id: USER,
            server_url: Some("https://keep.example.com".to_string()),
            ..Default::default()
        }),
    );

    let result = h
        .pipeline()
        .process_batch(&Batch::single(text("https://example.com")))
        .await;

    assert!(matches!(result, Err(PipelineError::NotConfigured(USER))));
    assert_eq!(h.ack.sent_texts().await, vec![formatting::NOT_CONFIGURED]);
    assert!(h.connector.connections().is_empty());
    assert!(h.api.calls().await.is_empty());
}

#[tokio::test]
async fn unauthorized_create_is_translated() {
    let h = Harness::new(
        MockBookmarkApi::new().with_create(Scripted::Status(401, "{\"error\":\"Unauthorized\"}".to_string())),
    );
    let unit = text("https://example.com").with_entities(vec![Entity::url(0, 19)]);

    let result = h.pipeline().process_batch(&Batch::single(unit)).await;

    assert!(matches!(result, Err(PipelineError::Create(_))));
    assert_eq!(
        h.shown().await,
        "❌ Karakeep error (401). Check the API key (/key) and its permissions."
    );
    assert_eq!(h.api.count(|c| matches!(c, ApiCall::Get(_))).await, 0);
    assert!(h.store.snapshot(USER).await.unwrap().last_success_id.is_none());
}

#[tokio::test]
async fn note_with_urls_falls_back_to_link() {
    let h = Harness::new(
        MockBookmarkApi::new()
            .with_create(Scripted::Status(400, "type text not allowed".to_string()))
            .with_gets([Scripted::Ok(json!({"id": "bm_1", "summary": "Two links."}))]),
    );
    let unit = text("https://a.example https://b.example")
        .with_entities(vec![Entity::url(0, 17), Entity::url(18, 17)]);

    let outcome = h.pipeline().process_batch(&Batch::single(unit)).await.unwrap();

    assert_eq!(
        outcome,
        BatchOutcome::Completed {
            bookmark_id: "bm_1".to_string(),
            kind: ContentKind::Note,
        }
    );
    let created = h.api.created().await;
    assert_eq!(created.len(), 2);
    assert_eq!(created[1].url.as_deref(), Some("https://a.example"));
}

#[tokio::test]
async fn oversized_attachment_aborts_before_download() {
    let h = Harness::with(
        MockBookmarkApi::new(),
        MockFileSource::new().with_file("huge", vec![0u8; 8], "videos/huge.mp4"),
        InMemoryUserStore::configured(USER, "https://keep.example.com", "secret-key"),
    );
    let unit = text("").with_media(MediaPayload {
        video: Some(MediaFile::new("huge", 60 * 1024 * 1024)),
        ..Default::default()
    });

    let result = h.pipeline().process_batch(&Batch::single(unit)).await;

    assert!(matches!(result, Err(PipelineError::TooLarge { .. })));
    assert_eq!(
        h.shown().await,
        "❌ File too large: video.mp4 (62914560 bytes), limit 52428800 bytes"
    );
    assert!(h.files.downloads().await.is_empty());
    assert_eq!(h.api.count(|c| matches!(c, ApiCall::Upload { .. })).await, 0);
}

#[tokio::test]
async fn undeclared_size_is_caught_during_download() {
    let h = Harness::with(
        MockBookmarkApi::new(),
        MockFileSource::new().with_file("doc", vec![0u8; 64], "documents/report.pdf"),
        InMemoryUserStore::configured(USER, "https://keep.example.com", "secret-key"),
    );
    let pipeline = h.pipeline().with_config(PipelineConfig {
        max_upload_bytes: 32,
        ..Default::default()
    });
    let unit = text("").with_media(MediaPayload {
        document: Some(MediaFile {
            file_id: "doc".to_string(),
            file_name: Some("report.pdf".to_string()),
            mime_type: Some("application/pdf".to_string()),
            file_size: 0,
        }),
        ..Default::default()
    });

    let result = pipeline.process_batch(&Batch::single(unit)).await;

    assert!(matches!(
        result,
        Err(PipelineError::TooLarge { size: 64, limit: 32, .. })
    ));
    assert_eq!(
        h.shown().await,
        "❌ File too large: report.pdf (64 bytes), limit 32 bytes"
    );
}

#[tokio::test]
async fn failed_download_is_reported() {
    let h = Harness::new(MockBookmarkApi::new());
    let unit = text("").with_media(photo("missing", 100));

    let result = h.pipeline().process_batch(&Batch::single(unit)).await;

    assert!(matches!(result, Err(PipelineError::Download { .. })));
    assert!(h
        .shown()
        .await
        .starts_with("❌ Failed to download the file from Telegram: platform error 400"));
}

#[tokio::test(start_paused = true)]
async fn extraction_timeout_stops_before_summary() {
    let h = Harness::new(MockBookmarkApi::new().with_gets([Scripted::Ok(json!({"id": "bm_1"}))]));
    let unit = text("https://example.com").with_entities(vec![Entity::url(0, 19)]);
    let start = Instant::now();

    let outcome = h.pipeline().process_batch(&Batch::single(unit)).await.unwrap();

    assert_eq!(
        outcome,
        BatchOutcome::ExtractionTimedOut {
            bookmark_id: "bm_1".to_string()
        }
    );
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_secs(180));
    assert!(elapsed <= Duration::from_secs(183));
    assert_eq!(
        h.shown().await,
        "⚠️ Content did not load within 3 minutes. See the summary in the app."
    );
    assert_eq!(h.api.count(|c| matches!(c, ApiCall::Summarize(_))).await, 0);
}

#[tokio::test(start_paused = true)]
async fn summary_timeout_is_reported() {
    let h = Harness::new(MockBookmarkApi::new().with_gets([Scripted::Ok(json!({
        "id": "bm_1",
        "summary": "The content is empty.",
    }))]));

    let outcome = h
        .pipeline()
        .process_batch(&Batch::single(text("remember the milk")))
        .await
        .unwrap();

    assert_eq!(
        outcome,
        BatchOutcome::SummaryTimedOut {
            bookmark_id: "bm_1".to_string(),
            kind: ContentKind::Note,
        }
    );
    assert_eq!(h.shown().await, formatting::SUMMARY_NOT_READY);
    // summarize precedes every read
    let summarizes = h.api.count(|c| matches!(c, ApiCall::Summarize(_))).await;
    let gets = h.api.count(|c| matches!(c, ApiCall::Get(_))).await;
    assert_eq!(summarizes, gets);
    assert!(gets > 1);
}

#[tokio::test(start_paused = true)]
async fn shutdown_cancels_polling() {
    let h = Harness::new(MockBookmarkApi::new().with_gets([Scripted::Ok(json!({"id": "bm_1"}))]));
    let (tx, rx) = watch::channel(false);
    let pipeline = Arc::new(h.pipeline().with_shutdown(rx));
    let unit = text("https://example.com").with_entities(vec![Entity::url(0, 19)]);
    let start = Instant::now();

    let task = {
        let pipeline = pipeline.clone();
        tokio::spawn(async move { pipeline.process_batch(&Batch::single(unit)).await })
    };
    tokio::time::sleep(Duration::from_secs(10)).await;
    tx.send(true).unwrap();

    let outcome = task.await.unwrap().unwrap();
    assert_eq!(
        outcome,
        BatchOutcome::Interrupted {
            bookmark_id: "bm_1".to_string()
        }
    );
    assert!(start.elapsed() < Duration::from_secs(13));
    assert_eq!(h.shown().await, formatting::INTERRUPTED);
    assert_eq!(h.api.count(|c| matches!(c, ApiCall::Summarize(_))).await, 0);
}

#[tokio::test(start_paused = true)]
async fn album_is_saved_as_one_batch() {
    let h = Harness::with(
        MockBookmarkApi::new().with_gets([Scripted::Ok(json!({"id": "bm_1", "summary": "Trip photos."}))]),
        MockFileSource::new()
            .with_file("p1", vec![1u8; 10], "photos/p1.jpg")
            .with_file("p2", vec![2u8; 20], "photos/p2.jpg")
            .with_file("p3", vec![3u8; 30], "photos/p3.jpg"),
        InMemoryUserStore::configured(USER, "https://keep.example.com", "secret-key"),
    );
    let pipeline = Arc::new(h.pipeline());

    let handles = Arc::new(Mutex::new(Vec::new()));
    let on_flush: FlushFn = {
        let pipeline = pipeline.clone();
        let handles = handles.clone();
        Arc::new(move |group_id: String, units: Vec<MessageUnit>| {
            if let Some(batch) = Batch::group(group_id, units) {
                handles.lock().unwrap().push(pipeline.spawn_batch(batch));
            }
        })
    };
    let collector = MediaGroupCollector::new(Duration::from_secs(2), on_flush);

    let member = |id: &str, caption: &str| text(caption).with_media(photo(id, 10)).in_group("album");
    collector.collect(member("p1", ""));
    tokio::time::sleep(Duration::from_millis(300)).await;
    collector.collect(member("p2", "Summer trip"));
    tokio::time::sleep(Duration::from_millis(300)).await;
    collector.collect(member("p3", "ignored second caption"));
    tokio::time::sleep(Duration::from_secs(3)).await;

    let spawned: Vec<_> = handles.lock().unwrap().drain(..).collect();
    assert_eq!(spawned.len(), 1);
    for handle in spawned {
        assert!(handle.await.unwrap());
    }

    assert_eq!(h.api.created().await, vec![NewBookmark::text("Summer trip")]);
    assert_eq!(h.files.downloads().await, vec!["p1", "p2", "p3"]);
    assert_eq!(h.api.count(|c| matches!(c, ApiCall::Attach { .. })).await, 3);
    assert_eq!(h.ack.sent_texts().await, vec!["⏳ Saving as a note…"]);
    assert_eq!(h.shown().await, "✅ Saved as a note\n\nSummary:\nTrip photos.");
}
