use std::collections::HashMap;

use async_trait::async_trait;
use keep_core::{DownloadedFile, FileSource, TransportError};
use tokio::sync::Mutex;

/// File source serving bytes registered up front.
#[derive(Debug, Default)]
pub struct MockFileSource {
    files: HashMap<String, DownloadedFile>,
    downloads: Mutex<Vec<String>>,
    ceilings: Mutex<Vec<u64>>,
}

impl MockFileSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a file under `file_id` with its platform-side path.
    pub fn with_file(mut self, file_id: &str, bytes: impl Into<Vec<u8>>, source_path: &str) -> Self {
        self.files.insert(
            file_id.to_string(),
            DownloadedFile {
                bytes: bytes.into(),
                source_path: source_path.to_string(),
            },
        );
        self
    }

    /// File ids requested so far, in order.
    pub async fn downloads(&self) -> Vec<String> {
        self.downloads.lock().await.clone()
    }

    /// The `max_bytes` passed with each download, in order.
    pub async fn ceilings(&self) -> Vec<u64> {
        self.ceilings.lock().await.clone()
    }
}

#[async_trait]
impl FileSource for MockFileSource {
    async fn download(&self, file_id: &str, max_bytes: u64) -> Result<DownloadedFile, TransportError> {
        self.downloads.lock().await.push(file_id.to_string());
        self.ceilings.lock().await.push(max_bytes);

        let file = self.files.get(file_id).ok_or_else(|| TransportError::Platform {
            code: 400,
            description: "Bad Request: invalid file_id".to_string(),
        })?;

        let size = file.bytes.len() as u64;
        if max_bytes > 0 && size > max_bytes {
            return Err(TransportError::TooLarge {
                size,
                limit: max_bytes,
            });
        }
        Ok(file.clone())
    }
}
