use std::collections::VecDeque;
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use keep_core::{ApiError, Asset, BookmarkApi, BookmarkConnector, BookmarkRecord, NewBookmark};
use serde_json::{json, Value};
use tokio::sync::Mutex;

/// A scripted answer from the mock service.
#[derive(Debug, Clone)]
pub enum Scripted<T> {
    Ok(T),
    /// An HTTP error status with a body preview.
    Status(u16, String),
    /// A request that never got a response.
    Transport(String),
}

impl<T: Clone> Scripted<T> {
    fn resolve(&self) -> Result<T, ApiError> {
        match self {
            Scripted::Ok(value) => Ok(value.clone()),
            Scripted::Status(status, preview) => Err(ApiError::Status {
                status: *status,
                preview: preview.clone(),
            }),
            Scripted::Transport(msg) => Err(ApiError::Transport(msg.clone())),
        }
    }
}

/// One call received by [`MockBookmarkApi`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    Create(NewBookmark),
    Upload {
        filename: String,
        mime: String,
        size: usize,
    },
    Attach {
        bookmark_id: String,
        asset_id: String,
    },
    Summarize(String),
    Get(String),
}

#[derive(Debug, Default)]
struct ApiState {
    creates: VecDeque<Scripted<Value>>,
    uploads: VecDeque<Scripted<Value>>,
    attaches: VecDeque<Scripted<()>>,
    summarizes: VecDeque<Scripted<Value>>,
    /// The last entry keeps answering once the others are used up.
    gets: VecDeque<Scripted<Value>>,
    calls: Vec<ApiCall>,
}

fn pop<T: Clone>(queue: &mut VecDeque<Scripted<T>>, sticky: bool) -> Option<Scripted<T>> {
    if sticky && queue.len() == 1 {
        queue.front().cloned()
    } else {
        queue.pop_front()
    }
}

fn record(value: Value) -> Result<BookmarkRecord, ApiError> {
    BookmarkRecord::from_json(value).map_err(|e| ApiError::Decode(e.to_string()))
}

/// Bookmarking service answering from scripts.
///
/// Without a script, `create` returns id `bm_1`, uploads return `asset_<n>`,
/// attach and summarize succeed and `get` echoes a bare record.
#[derive(Debug, Default)]
pub struct MockBookmarkApi {
    state: Mutex<ApiState>,
}

impl MockBookmarkApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the answer to the next `create`.
    pub fn with_create(mut self, outcome: Scripted<Value>) -> Self {
        self.state.get_mut().creates.push_back(outcome);
        self
    }

    /// Queue the answer to the next `upload`.
    pub fn with_upload(mut self, outcome: Scripted<Value>) -> Self {
        self.state.get_mut().uploads.push_back(outcome);
        self
    }

    /// Queue the answer to the next `attach`.
    pub fn with_attach(mut self, outcome: Scripted<()>) -> Self {
        self.state.get_mut().attaches.push_back(outcome);
        self
    }

    /// Queue the answer to the next `summarize`.
    pub fn with_summarize(mut self, outcome: Scripted<Value>) -> Self {
        self.state.get_mut().summarizes.push_back(outcome);
        self
    }

    /// Answers to successive `get` calls; the last one repeats forever.
    pub fn with_gets(mut self, outcomes: impl IntoIterator<Item = Scripted<Value>>) -> Self {
        self.state.get_mut().gets.extend(outcomes);
        self
    }

    pub async fn calls(&self) -> Vec<ApiCall> {
        self.state.lock().await.calls.clone()
    }

    /// Requests passed to `create`, in order.
    pub async fn created(&self) -> Vec<NewBookmark> {
        self.calls()
            .await
            .into_iter()
            .filter_map(|c| match c {
                ApiCall::Create(request) => Some(request),
                _ => None,
            })
            .collect()
    }

    pub async fn count(&self, matches: impl Fn(&ApiCall) -> bool) -> usize {
        self.state.lock().await.calls.iter().filter(|c| matches(c)).count()
    }
}

#[async_trait]
impl BookmarkApi for MockBookmarkApi {
    async fn create(&self, request: NewBookmark) -> Result<BookmarkRecord, ApiError> {
        let mut state = self.state.lock().await;
        state.calls.push(ApiCall::Create(request));
        let outcome = pop(&mut state.creates, false).unwrap_or(Scripted::Ok(json!({"id": "bm_1"})));
        record(outcome.resolve()?)
    }

    async fn upload(&self, data: Vec<u8>, filename: &str, mime: &str) -> Result<Asset, ApiError> {
        let mut state = self.state.lock().await;
        state.calls.push(ApiCall::Upload {
            filename: filename.to_string(),
            mime: mime.to_string(),
            size: data.len(),
        });
        let uploaded = state
            .calls
            .iter()
            .filter(|c| matches!(c, ApiCall::Upload { .. }))
            .count();
        let outcome = pop(&mut state.uploads, false)
            .unwrap_or_else(|| Scripted::Ok(json!({"id": format!("asset_{}", uploaded)})));
        Asset::from_json(outcome.resolve()?).map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn attach(&self, bookmark_id: &str, asset_id: &str) -> Result<(), ApiError> {
        let mut state = self.state.lock().await;
        state.calls.push(ApiCall::Attach {
            bookmark_id: bookmark_id.to_string(),
            asset_id: asset_id.to_string(),
        });
        pop(&mut state.attaches, false)
            .unwrap_or(Scripted::Ok(()))
            .resolve()
    }

    async fn summarize(&self, bookmark_id: &str) -> Result<BookmarkRecord, ApiError> {
        let mut state = self.state.lock().await;
        state.calls.push(ApiCall::Summarize(bookmark_id.to_string()));
        let outcome = pop(&mut state.summarizes, false)
            .unwrap_or_else(|| Scripted::Ok(json!({"id": bookmark_id})));
        record(outcome.resolve()?)
    }

    async fn get(&self, bookmark_id: &str) -> Result<BookmarkRecord, ApiError> {
        let mut state = self.state.lock().await;
        state.calls.push(ApiCall::Get(bookmark_id.to_string()));
        let outcome =
            pop(&mut state.gets, true).unwrap_or_else(|| Scripted::Ok(json!({"id": bookmark_id})));
        record(outcome.resolve()?)
    }
}

/// Connector handing out one shared [`MockBookmarkApi`].
#[derive(Debug)]
pub struct MockConnector {
    api: Arc<MockBookmarkApi>,
    reject: Option<String>,
    connections: StdMutex<Vec<(String, String)>>,
}

impl MockConnector {
    pub fn new(api: Arc<MockBookmarkApi>) -> Self {
        Self {
            api,
            reject: None,
            connections: StdMutex::new(Vec::new()),
        }
    }

    /// Fail every `connect` with a configuration error.
    pub fn rejecting(api: Arc<MockBookmarkApi>, reason: &str) -> Self {
        Self {
            reject: Some(reason.to_string()),
            ..Self::new(api)
        }
    }

    /// `(server_url, api_key)` pairs passed to `connect`.
    pub fn connections(&self) -> Vec<(String, String)> {
        self.connections
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl BookmarkConnector for MockConnector {
    fn connect(&self, server_url: &str, api_key: &str) -> Result<Arc<dyn BookmarkApi>, ApiError> {
        self.connections
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((server_url.to_string(), api_key.to_string()));

        if let Some(reason) = &self.reject {
            return Err(ApiError::Config(reason.clone()));
        }
        Ok(self.api.clone())
    }
}
