//! Remote bookmark records as observed through the bookmarking API.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A request to create a bookmark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBookmark {
    /// Link target; `None` creates a text bookmark.
    pub url: Option<String>,
    pub title: Option<String>,
    /// Notes for a link bookmark, or the full text of a text bookmark.
    pub body: String,
}

impl NewBookmark {
    /// A link bookmark with optional notes.
    pub fn link(url: impl Into<String>, notes: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            title: None,
            body: notes.into(),
        }
    }

    /// A text-only bookmark.
    pub fn text(body: impl Into<String>) -> Self {
        Self {
            url: None,
            title: None,
            body: body.into(),
        }
    }

    pub fn is_link(&self) -> bool {
        self.url.is_some()
    }
}

/// A tag attached to a bookmark.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

/// A best-effort view of a remote bookmark.
///
/// The full response is kept in `raw` so callers can inspect fields this
/// struct does not model.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BookmarkRecord {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub notes: String,
    /// Either a plain string or an object; read through [`BookmarkRecord::summary_text`].
    #[serde(default)]
    pub summary: Option<Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<Tag>,
    #[serde(skip)]
    pub raw: Value,
}

impl BookmarkRecord {
    /// Decode a response body, unwrapping a `{"data": {...}}` envelope if present.
    pub fn from_json(raw: Value) -> Result<Self, serde_json::Error> {
        let body = unwrap_data(&raw);
        let mut record: BookmarkRecord = serde_json::from_value(body.clone())?;
        record.raw = raw;
        Ok(record)
    }

    /// The summary as trimmed text, or an empty string.
    pub fn summary_text(&self) -> String {
        match &self.summary {
            Some(Value::String(s)) => s.trim().to_string(),
            Some(Value::Object(map)) => ["text", "summary"]
                .iter()
                .find_map(|key| map.get(*key).and_then(Value::as_str))
                .map(|s| s.trim().to_string())
                .unwrap_or_default(),
            _ => String::new(),
        }
    }

    /// Tag names, trimmed, in server order.
    pub fn tag_names(&self) -> Vec<String> {
        self.tags
            .iter()
            .map(|t| t.name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect()
    }
}

/// An uploaded asset.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Asset {
    #[serde(default, alias = "assetId", deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, alias = "fileName", deserialize_with = "null_as_default")]
    pub filename: String,
    #[serde(default, alias = "contentType", deserialize_with = "null_as_default")]
    pub mime: String,
    #[serde(skip)]
    pub raw: Value,
}

impl Asset {
    /// Decode a response body, unwrapping a `{"data": {...}}` envelope if present.
    pub fn from_json(raw: Value) -> Result<Self, serde_json::Error> {
        let body = unwrap_data(&raw);
        let mut asset: Asset = serde_json::from_value(body.clone())?;
        asset.raw = raw;
        Ok(asset)
    }
}

fn unwrap_data(raw: &Value) -> &Value {
    match raw.get("data") {
        Some(inner) if inner.is_object() && raw.get("id").is_none() => inner,
        _ => raw,
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_summary_as_string() {
        let record =
            BookmarkRecord::from_json(json!({"id": "b1", "summary": "  short text  "})).unwrap();
        assert_eq!(record.summary_text(), "short text");
    }

    #[test]
    fn test_summary_as_object() {
        let record =
            BookmarkRecord::from_json(json!({"id": "b1", "summary": {"text": "nested"}})).unwrap();
        assert_eq!(record.summary_text(), "nested");

        let record = BookmarkRecord::from_json(json!({"summary": {"summary": "alt"}})).unwrap();
        assert_eq!(record.summary_text(), "alt");
    }

    #[test]
    fn test_summary_missing_or_unexpected() {
        let record = BookmarkRecord::from_json(json!({"id": "b1", "summary": null})).unwrap();
        assert_eq!(record.summary_text(), "");
        let record = BookmarkRecord::from_json(json!({"id": "b1", "summary": [1, 2]})).unwrap();
        assert_eq!(record.summary_text(), "");
    }

    #[test]
    fn test_data_envelope_and_nulls() {
        let raw = json!({"data": {"id": "b2", "title": null, "tags": null}});
        let record = BookmarkRecord::from_json(raw.clone()).unwrap();
        assert_eq!(record.id, "b2");
        assert_eq!(record.title, "");
        assert!(record.tags.is_empty());
        assert_eq!(record.raw, raw);
    }

    #[test]
    fn test_tag_names_skip_blank() {
        let record = BookmarkRecord::from_json(json!({
            "id": "b3",
            "tags": [{"id": "1", "name": " rust "}, {"id": "2", "name": ""}, {"name": "async"}]
        }))
        .unwrap();
        assert_eq!(record.tag_names(), vec!["rust", "async"]);
    }

    #[test]
    fn test_asset_id_aliases() {
        let asset = Asset::from_json(json!({"assetId": "a1", "contentType": "image/jpeg"})).unwrap();
        assert_eq!(asset.id, "a1");
        assert_eq!(asset.mime, "image/jpeg");

        let asset = Asset::from_json(json!({"data": {"id": "a2"}})).unwrap();
        assert_eq!(asset.id, "a2");
    }
}
