//! Per-batch processing: classify, save, upload attachments, then wait for
//! extraction and summary while editing one acknowledgment message.

use std::sync::Arc;

use classifier::{classify, Classification, ContentKind};
use keep_core::{
    Acknowledger, ApiError, Attachment, Batch, BookmarkApi, BookmarkConnector, BookmarkRecord,
    FileSource, MessageUnit, NewBookmark, StoreError, TransportError, UserStore,
};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::attachments::extract_attachments;
use crate::error::PipelineError;
use crate::formatting;
use crate::polling::{PollConfig, PollingWaiter};
use crate::readiness::{has_extracted_content, ready_summary};
use crate::task::spawn_supervised;

/// Default attachment ceiling (50 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

/// Tunables of a [`Pipeline`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Largest attachment accepted, in bytes.
    pub max_upload_bytes: u64,
    /// Waiting for the service to extract page content.
    pub extraction: PollConfig,
    /// Waiting for a summary.
    pub summary: PollConfig,
}

impl PipelineConfig {
    /// Replace a zero size ceiling with the default.
    fn normalized(mut self) -> Self {
        if self.max_upload_bytes == 0 {
            self.max_upload_bytes = DEFAULT_MAX_UPLOAD_BYTES;
        }
        self
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            extraction: PollConfig::default(),
            summary: PollConfig::default(),
        }
    }
}

/// How a batch ended when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    /// Saved and summarized.
    Completed {
        bookmark_id: String,
        kind: ContentKind,
    },
    /// Saved, but the service returned no id to follow up on.
    SavedWithoutId { kind: ContentKind },
    /// Saved, but content extraction did not finish in time.
    ExtractionTimedOut { bookmark_id: String },
    /// Saved, but no summary appeared in time.
    SummaryTimedOut {
        bookmark_id: String,
        kind: ContentKind,
    },
    /// Saved, but shutdown stopped the wait for content or summary.
    Interrupted { bookmark_id: String },
}

/// Drives one batch from classification to the final acknowledgment edit.
pub struct Pipeline {
    ack: Arc<dyn Acknowledger>,
    files: Arc<dyn FileSource>,
    connector: Arc<dyn BookmarkConnector>,
    store: Arc<dyn UserStore>,
    config: PipelineConfig,
    shutdown: watch::Receiver<bool>,
}

impl Pipeline {
    pub fn new(
        ack: Arc<dyn Acknowledger>,
        files: Arc<dyn FileSource>,
        connector: Arc<dyn BookmarkConnector>,
        store: Arc<dyn UserStore>,
    ) -> Self {
        // Without a shutdown sender the waiters are never cancelled.
        let (_, shutdown) = watch::channel(false);
        Self {
            ack,
            files,
            connector,
            store,
            config: PipelineConfig::default(),
            shutdown,
        }
    }

    /// A zero `max_upload_bytes` falls back to [`DEFAULT_MAX_UPLOAD_BYTES`].
    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config.normalized();
        self
    }

    /// Cancel in-flight polling once `shutdown` turns `true`.
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Process `batch` in its own supervised task.
    pub fn spawn_batch(self: &Arc<Self>, batch: Batch) -> JoinHandle<bool> {
        let pipeline = Arc::clone(self);
        spawn_supervised("batch", async move {
            let unit = batch.representative();
            let (user_id, chat_id) = (unit.sender_id, unit.chat_id);
            match pipeline.process_batch(&batch).await {
                Ok(outcome) => info!(user_id, chat_id, ?outcome, "Batch finished"),
                Err(PipelineError::NotConfigured(_)) => {
                    info!(user_id, chat_id, "Batch skipped: user not configured")
                }
                Err(e) => warn!(user_id, chat_id, "Batch failed: {}", e),
            }
        })
    }

    /// Process one batch end to end.
    ///
    /// Every failure after the acknowledgment was sent is also written into
    /// that acknowledgment; see [`PipelineError::user_message`].
    pub async fn process_batch(&self, batch: &Batch) -> Result<BatchOutcome, PipelineError> {
        let unit = batch.representative();
        let (user_id, chat_id) = (unit.sender_id, unit.chat_id);

        let settings = match self.store.get_user(user_id).await {
            Ok(settings) => settings,
            Err(StoreError::Crypto(e)) => {
                warn!(user_id, "Stored API key does not decrypt: {}", e);
                None
            }
            Err(e) => return Err(e.into()),
        };
        let Some((server_url, api_key)) = settings.as_ref().and_then(|s| s.credentials()) else {
            self.reply(chat_id, formatting::NOT_CONFIGURED).await;
            return Err(PipelineError::NotConfigured(user_id));
        };

        let classification = classify(unit);
        let kind = classification.kind();
        let attachments = extract_attachments(batch.units());
        info!(
            user_id,
            chat_id,
            message_id = unit.message_id,
            %kind,
            urls = classification.urls().len(),
            has_media = unit.has_media(),
            units = batch.len(),
            attachments = attachments.len(),
            "Processing batch"
        );

        let ack_id = self
            .ack
            .send(chat_id, formatting::ack_text(kind))
            .await
            .map_err(PipelineError::Acknowledge)?;

        let result = self
            .save(
                unit,
                &classification,
                &attachments,
                server_url,
                api_key,
                ack_id,
            )
            .await;

        if let Err(e) = &result {
            if let Some(message) = e.user_message() {
                self.edit(chat_id, ack_id, &message).await;
            }
        }
        result
    }

    async fn save(
        &self,
        unit: &MessageUnit,
        classification: &Classification,
        attachments: &[Attachment],
        server_url: &str,
        api_key: &str,
        ack_id: i64,
    ) -> Result<BatchOutcome, PipelineError> {
        let (user_id, chat_id) = (unit.sender_id, unit.chat_id);
        let kind = classification.kind();

        let api = self
            .connector
            .connect(server_url, api_key)
            .map_err(PipelineError::Connect)?;

        let record = create(api.as_ref(), classification, unit)
            .await
            .map_err(|e| {
                warn!(user_id, status = e.status(), "Bookmark create failed: {}", e);
                PipelineError::Create(e)
            })?;
        let bookmark_id = record.id.trim().to_string();
        info!(user_id, bookmark_id = %bookmark_id, %kind, "Bookmark created");

        if !bookmark_id.is_empty() {
            for attachment in attachments {
                self.upload_attachment(api.as_ref(), &bookmark_id, attachment)
                    .await?;
            }
        }

        if let Err(e) = self.store.record_success(user_id, &bookmark_id).await {
            warn!(user_id, "Failed to record last success: {}", e);
        }

        if bookmark_id.is_empty() {
            self.edit(chat_id, ack_id, formatting::SAVED_WITHOUT_ID).await;
            return Ok(BatchOutcome::SavedWithoutId { kind });
        }
        self.edit(chat_id, ack_id, &formatting::saved_provisional(&bookmark_id))
            .await;

        if kind == ContentKind::Bookmark && !self.wait_for_extraction(&api, &bookmark_id).await {
            if self.shutting_down() {
                return Ok(self.interrupted(chat_id, ack_id, bookmark_id).await);
            }
            self.edit(
                chat_id,
                ack_id,
                &formatting::extraction_timeout(self.config.extraction.timeout),
            )
            .await;
            return Ok(BatchOutcome::ExtractionTimedOut { bookmark_id });
        }

        match self.wait_for_summary(&api, &bookmark_id).await {
            Some(record) => {
                self.edit(chat_id, ack_id, &formatting::final_message(kind, &record))
                    .await;
                Ok(BatchOutcome::Completed { bookmark_id, kind })
            }
            None if self.shutting_down() => {
                Ok(self.interrupted(chat_id, ack_id, bookmark_id).await)
            }
            None => {
                self.edit(chat_id, ack_id, formatting::SUMMARY_NOT_READY).await;
                Ok(BatchOutcome::SummaryTimedOut { bookmark_id, kind })
            }
        }
    }

    async fn upload_attachment(
        &self,
        api: &dyn BookmarkApi,
        bookmark_id: &str,
        attachment: &Attachment,
    ) -> Result<(), PipelineError> {
        let limit = self.config.max_upload_bytes;
        if attachment.size_bytes > limit {
            return Err(PipelineError::TooLarge {
                filename: attachment.filename.clone(),
                size: attachment.size_bytes,
                limit,
            });
        }

        let file = self
            .files
            .download(&attachment.file_id, limit)
            .await
            .map_err(|e| {
                warn!(file_id = %attachment.file_id, "Download failed: {}", e);
                match e {
                    TransportError::TooLarge { size, limit } => PipelineError::TooLarge {
                        filename: attachment.filename.clone(),
                        size,
                        limit,
                    },
                    source => PipelineError::Download {
                        filename: attachment.filename.clone(),
                        source,
                    },
                }
            })?;

        let filename = attachment.filename.as_str();
        let size = file.bytes.len();
        debug!(
            file_id = %attachment.file_id,
            source_path = %file.source_path,
            size,
            "Downloaded attachment"
        );

        let asset = api
            .upload(file.bytes, filename, &attachment.mime)
            .await
            .map_err(|e| {
                warn!(bookmark_id, status = e.status(), "Asset upload failed: {}", e);
                PipelineError::Upload(e)
            })?;
        let asset_id = asset.id.trim();
        if asset_id.is_empty() {
            warn!(bookmark_id, "Asset upload returned an empty id");
            return Err(PipelineError::EmptyAssetId);
        }

        api.attach(bookmark_id, asset_id).await.map_err(|e| {
            warn!(bookmark_id, asset_id, status = e.status(), "Asset attach failed: {}", e);
            PipelineError::Attach(e)
        })?;
        debug!(bookmark_id, asset_id, filename = %filename, size, "Attachment saved");
        Ok(())
    }

    async fn wait_for_extraction(&self, api: &Arc<dyn BookmarkApi>, bookmark_id: &str) -> bool {
        let waiter = PollingWaiter::new("extract", self.config.extraction, self.shutdown.clone());
        let signal = waiter
            .wait(bookmark_id, move |_| async move {
                let record = api.get(bookmark_id).await?;
                Ok::<_, ApiError>(has_extracted_content(&record.raw))
            })
            .await;

        match signal {
            Some(signal) => {
                debug!(bookmark_id, %signal, "Content extracted");
                true
            }
            None => false,
        }
    }

    async fn wait_for_summary(
        &self,
        api: &Arc<dyn BookmarkApi>,
        bookmark_id: &str,
    ) -> Option<BookmarkRecord> {
        let waiter = PollingWaiter::new("summary", self.config.summary, self.shutdown.clone());
        waiter
            .wait(bookmark_id, move |_| async move {
                // Safe to repeat: the service may not have had content to summarize yet.
                if let Err(e) = api.summarize(bookmark_id).await {
                    debug!(bookmark_id, "Summarize request failed: {}", e);
                }
                let record = api.get(bookmark_id).await?;
                Ok::<_, ApiError>(ready_summary(&record).map(|_| record))
            })
            .await
    }

    fn shutting_down(&self) -> bool {
        *self.shutdown.borrow()
    }

    async fn interrupted(&self, chat_id: i64, ack_id: i64, bookmark_id: String) -> BatchOutcome {
        info!(chat_id, bookmark_id = %bookmark_id, "Stopped waiting: shutting down");
        self.edit(chat_id, ack_id, formatting::INTERRUPTED).await;
        BatchOutcome::Interrupted { bookmark_id }
    }

    async fn reply(&self, chat_id: i64, text: &str) {
        if let Err(e) = self.ack.send(chat_id, text).await {
            warn!(chat_id, "Failed to send reply: {}", e);
        }
    }

    async fn edit(&self, chat_id: i64, message_id: i64, text: &str) {
        if let Err(e) = self.ack.edit(chat_id, message_id, text).await {
            warn!(chat_id, message_id, "Failed to edit acknowledgment: {}", e);
        }
    }
}

/// Submit the batch according to its classification.
///
/// A failed note that mentions URLs is retried once as a link to the first
/// of them.
async fn create(
    api: &dyn BookmarkApi,
    classification: &Classification,
    unit: &MessageUnit,
) -> Result<BookmarkRecord, ApiError> {
    match classification {
        Classification::Bookmark { url, notes, .. } => {
            api.create(NewBookmark::link(url.as_str(), notes.as_str())).await
        }
        Classification::Note { text, urls, .. } => {
            match api.create(NewBookmark::text(text.as_str())).await {
                Ok(record) => Ok(record),
                Err(e) => match urls.first() {
                    // TODO: restrict the fallback to validation errors once the
                    // service's rejection of text bookmarks is pinned down.
                    Some(url) => {
                        warn!(status = e.status(), "Text bookmark failed, retrying as link: {}", e);
                        api.create(NewBookmark::link(url.as_str(), text.as_str())).await
                    }
                    None => Err(e),
                },
            }
        }
        Classification::File => {
            api.create(NewBookmark::text(formatting::file_label(unit.timestamp)))
                .await
        }
    }
}
