//! Karakeep HTTP client.

use keep_core::{Asset, BookmarkRecord, NewBookmark};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, Response, StatusCode};
use serde_json::{json, Map, Value};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::{alternate_prefix, normalize_prefix, KarakeepConfig};
use crate::error::KarakeepError;

/// Largest error body read for the preview.
const ERROR_BODY_LIMIT: usize = 32 * 1024;

/// Largest success body accepted.
const SUCCESS_BODY_LIMIT: usize = 4 * 1024 * 1024;

/// Characters of an error body kept in [`KarakeepError::Status`].
const PREVIEW_CHARS: usize = 600;

const DEFAULT_UPLOAD_NAME: &str = "upload.bin";
const DEFAULT_UPLOAD_MIME: &str = "application/octet-stream";

/// Request payload, rebuilt for the prefix retry.
enum Payload<'a> {
    Empty,
    Json(&'a Value),
    Upload {
        data: &'a [u8],
        filename: &'a str,
        mime: &'a str,
    },
}

/// Client for one Karakeep server and API key.
pub struct KarakeepClient {
    http: Client,
    config: KarakeepConfig,
    prefix: RwLock<String>,
}

impl KarakeepClient {
    pub fn new(config: KarakeepConfig) -> Result<Self, KarakeepError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(KarakeepError::Http)?;
        let prefix = normalize_prefix(&config.api_prefix);

        Ok(Self {
            http,
            config,
            prefix: RwLock::new(prefix),
        })
    }

    /// Get the configuration.
    pub fn config(&self) -> &KarakeepConfig {
        &self.config
    }

    /// The API prefix currently in use.
    pub async fn api_prefix(&self) -> String {
        self.prefix.read().await.clone()
    }

    /// Create a link or text bookmark.
    ///
    /// Notes on a link bookmark are added afterwards with a best-effort update;
    /// a failure there is logged and the created record is still returned.
    pub async fn create_bookmark(
        &self,
        request: &NewBookmark,
    ) -> Result<BookmarkRecord, KarakeepError> {
        let (body, notes) = create_body(request);
        let record = decode_record(
            self.request(Method::POST, "/bookmarks", Payload::Json(&body))
                .await?,
        )?;

        if let Some(notes) = notes {
            if !record.id.is_empty() {
                let patch = json!({ "notes": notes });
                if let Err(e) = self.update_bookmark(&record.id, &patch).await {
                    warn!(
                        "Failed to add notes to bookmark {}: {}",
                        record.id, e
                    );
                }
            }
        }

        Ok(record)
    }

    /// Apply a partial update to a bookmark.
    pub async fn update_bookmark(
        &self,
        bookmark_id: &str,
        patch: &Value,
    ) -> Result<BookmarkRecord, KarakeepError> {
        let path = bookmark_path(bookmark_id, "");
        decode_record(self.request(Method::PATCH, &path, Payload::Json(patch)).await?)
    }

    /// Fetch a single bookmark.
    pub async fn get_bookmark(&self, bookmark_id: &str) -> Result<BookmarkRecord, KarakeepError> {
        let path = bookmark_path(bookmark_id, "");
        decode_record(self.request(Method::GET, &path, Payload::Empty).await?)
    }

    /// Ask the server to generate the bookmark's summary.
    pub async fn summarize(&self, bookmark_id: &str) -> Result<BookmarkRecord, KarakeepError> {
        let path = bookmark_path(bookmark_id, "/summarize");
        let body = Value::Object(Map::new());
        decode_record(self.request(Method::POST, &path, Payload::Json(&body)).await?)
    }

    /// Upload raw bytes as a new asset.
    pub async fn upload_asset(
        &self,
        data: &[u8],
        filename: &str,
        mime: &str,
    ) -> Result<Asset, KarakeepError> {
        let filename = non_blank_or(filename, DEFAULT_UPLOAD_NAME);
        let mime = non_blank_or(mime, DEFAULT_UPLOAD_MIME);

        let value = self
            .request(
                Method::POST,
                "/assets",
                Payload::Upload {
                    data,
                    filename,
                    mime,
                },
            )
            .await?;
        decode_asset(value)
    }

    /// Attach an uploaded asset to a bookmark.
    pub async fn attach_asset(
        &self,
        bookmark_id: &str,
        asset_id: &str,
    ) -> Result<BookmarkRecord, KarakeepError> {
        let path = bookmark_path(bookmark_id, "/assets");
        let body = json!({ "assetId": asset_id });
        decode_record(self.request(Method::POST, &path, Payload::Json(&body)).await?)
    }

    /// Send a request, retrying once with the alternate prefix on a 404.
    async fn request(
        &self,
        method: Method,
        path: &str,
        payload: Payload<'_>,
    ) -> Result<Value, KarakeepError> {
        let prefix = self.prefix.read().await.clone();
        let response = self.execute(&method, &prefix, path, &payload).await?;

        if response.status() != StatusCode::NOT_FOUND {
            return read_response(response).await;
        }

        let alt = alternate_prefix(&prefix);
        debug!("{} {}{} returned 404, retrying under {}", method, prefix, path, alt);
        let retry = self.execute(&method, alt, path, &payload).await?;
        if retry.status().is_success() {
            let mut current = self.prefix.write().await;
            if *current != alt {
                info!("Switching Karakeep API prefix to {} for {}", alt, self.config.base_url);
                *current = alt.to_string();
            }
        }
        read_response(retry).await
    }

    async fn execute(
        &self,
        method: &Method,
        prefix: &str,
        path: &str,
        payload: &Payload<'_>,
    ) -> Result<Response, KarakeepError> {
        let url = format!("{}{}{}", self.config.base_url, prefix, path);
        let mut builder = self
            .http
            .request(method.clone(), url)
            .bearer_auth(&self.config.api_key)
            .header(reqwest::header::ACCEPT, "application/json");

        builder = match payload {
            Payload::Empty => builder,
            Payload::Json(body) => builder.json(body),
            Payload::Upload {
                data,
                filename,
                mime,
            } => {
                let part = Part::bytes(data.to_vec())
                    .file_name(filename.to_string())
                    .mime_str(mime)
                    .or_else(|_| {
                        Part::bytes(data.to_vec())
                            .file_name(filename.to_string())
                            .mime_str(DEFAULT_UPLOAD_MIME)
                    })?;
                let form = Form::new().part("file", part).text("mime", mime.to_string());
                builder.multipart(form)
            }
        };

        Ok(builder.send().await?)
    }
}

/// JSON body for a create request, plus the notes to add afterwards for links.
fn create_body(request: &NewBookmark) -> (Value, Option<String>) {
    let url = request.url.as_deref().map(str::trim).unwrap_or_default();
    let title = request.title.as_deref().map(str::trim).unwrap_or_default();
    let body = request.body.trim();

    let mut object = Map::new();
    let notes = if url.is_empty() {
        object.insert("type".to_string(), json!("text"));
        object.insert("text".to_string(), json!(body));
        None
    } else {
        object.insert("type".to_string(), json!("link"));
        object.insert("url".to_string(), json!(url));
        (!body.is_empty()).then(|| body.to_string())
    };
    if !title.is_empty() {
        object.insert("title".to_string(), json!(title));
    }

    (Value::Object(object), notes)
}

fn bookmark_path(bookmark_id: &str, suffix: &str) -> String {
    format!("/bookmarks/{}{}", urlencoding::encode(bookmark_id), suffix)
}

fn non_blank_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() {
        fallback
    } else {
        value
    }
}

async fn read_response(mut response: Response) -> Result<Value, KarakeepError> {
    let status = response.status();
    let limit = if status.is_success() {
        SUCCESS_BODY_LIMIT
    } else {
        ERROR_BODY_LIMIT
    };

    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        body.extend_from_slice(&chunk);
        if body.len() > limit {
            if status.is_success() {
                return Err(KarakeepError::Decode(format!(
                    "response body exceeds {} bytes",
                    limit
                )));
            }
            body.truncate(limit);
            break;
        }
    }

    if !status.is_success() {
        return Err(KarakeepError::Status {
            status: status.as_u16(),
            preview: preview(&body),
        });
    }

    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_slice(&body)?)
}

/// Trimmed, lossily decoded body capped at [`PREVIEW_CHARS`].
fn preview(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.chars().count() <= PREVIEW_CHARS {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(PREVIEW_CHARS).collect();
    cut.push('…');
    cut
}

fn decode_record(value: Value) -> Result<BookmarkRecord, KarakeepError> {
    if !value.is_object() {
        return Ok(BookmarkRecord {
            raw: value,
            ..Default::default()
        });
    }
    Ok(BookmarkRecord::from_json(value)?)
}

fn decode_asset(value: Value) -> Result<Asset, KarakeepError> {
    if !value.is_object() {
        return Ok(Asset {
            raw: value,
            ..Default::default()
        });
    }
    Ok(Asset::from_json(value)?)
}
