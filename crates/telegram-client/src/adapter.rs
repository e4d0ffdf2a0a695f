//! [`keep_core`] collaborator traits implemented on top of [`TelegramClient`].

use async_trait::async_trait;
use keep_core::{Acknowledger, DownloadedFile, FileSource, TransportError};

use crate::client::TelegramClient;

#[async_trait]
impl Acknowledger for TelegramClient {
    async fn send(&self, chat_id: i64, text: &str) -> Result<i64, TransportError> {
        let message = self.send_message(chat_id, text).await?;
        Ok(message.message_id)
    }

    async fn edit(&self, chat_id: i64, message_id: i64, text: &str) -> Result<(), TransportError> {
        self.edit_message_text(chat_id, message_id, text).await?;
        Ok(())
    }
}

#[async_trait]
impl FileSource for TelegramClient {
    async fn download(&self, file_id: &str, max_bytes: u64) -> Result<DownloadedFile, TransportError> {
        let (bytes, source_path) = self.download_file(file_id, max_bytes).await?;
        Ok(DownloadedFile { bytes, source_path })
    }
}
