//! [`keep_core`] traits implemented on top of [`KarakeepClient`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use keep_core::{ApiError, Asset, BookmarkApi, BookmarkConnector, BookmarkRecord, NewBookmark};

use crate::client::KarakeepClient;
use crate::config::{KarakeepConfig, DEFAULT_TIMEOUT};

#[async_trait]
impl BookmarkApi for KarakeepClient {
    async fn create(&self, request: NewBookmark) -> Result<BookmarkRecord, ApiError> {
        Ok(self.create_bookmark(&request).await?)
    }

    async fn upload(&self, data: Vec<u8>, filename: &str, mime: &str) -> Result<Asset, ApiError> {
        Ok(self.upload_asset(&data, filename, mime).await?)
    }

    async fn attach(&self, bookmark_id: &str, asset_id: &str) -> Result<(), ApiError> {
        self.attach_asset(bookmark_id, asset_id).await?;
        Ok(())
    }

    async fn summarize(&self, bookmark_id: &str) -> Result<BookmarkRecord, ApiError> {
        Ok(KarakeepClient::summarize(self, bookmark_id).await?)
    }

    async fn get(&self, bookmark_id: &str) -> Result<BookmarkRecord, ApiError> {
        Ok(self.get_bookmark(bookmark_id).await?)
    }
}

/// Builds a [`KarakeepClient`] per user's stored server and key.
#[derive(Debug, Clone)]
pub struct KarakeepConnector {
    timeout: Duration,
}

impl KarakeepConnector {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for KarakeepConnector {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl BookmarkConnector for KarakeepConnector {
    fn connect(&self, server_url: &str, api_key: &str) -> Result<Arc<dyn BookmarkApi>, ApiError> {
        let config = KarakeepConfig::new(server_url, api_key)?.with_timeout(self.timeout);
        Ok(Arc::new(KarakeepClient::new(config)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_rejects_plain_http() {
        let connector = KarakeepConnector::default();
        let err = connector
            .connect("http://keep.example.com", "key")
            .err()
            .unwrap();
        assert!(matches!(err, ApiError::Config(_)));
    }

    #[test]
    fn test_connect_builds_client() {
        let connector = KarakeepConnector::new(Duration::from_secs(5));
        assert!(connector.connect("https://keep.example.com", "key").is_ok());
    }
}
