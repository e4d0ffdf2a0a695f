//! User-facing texts for acknowledgments, outcomes and error translation.

use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use classifier::ContentKind;
use keep_core::{ApiError, BookmarkRecord, TransportError};

use crate::readiness::looks_empty_summary;

/// Longest error text shown to the user, in characters.
pub const MAX_ERROR_CHARS: usize = 800;

pub const NOT_CONFIGURED: &str =
    "❌ Not configured. First: /server https://<host> and /key <API_KEY>";

pub const SAVED_WITHOUT_ID: &str = "✅ Saved.";

pub const EMPTY_ASSET_ID: &str =
    "❌ Karakeep returned an asset without an id (check the asset upload API).";

/// The in-progress acknowledgment sent before any remote call.
pub fn ack_text(kind: ContentKind) -> &'static str {
    match kind {
        ContentKind::Bookmark => "⏳ Saving as a bookmark…",
        ContentKind::Note => "⏳ Saving as a note…",
        ContentKind::File => "⏳ Uploading file…",
    }
}

pub fn saved_provisional(bookmark_id: &str) -> String {
    format!("✅ Saved (id={}). Waiting for content…", bookmark_id)
}

pub fn extraction_timeout(timeout: Duration) -> String {
    format!(
        "⚠️ Content did not load within {}. See the summary in the app.",
        human_duration(timeout)
    )
}

pub const SUMMARY_NOT_READY: &str = "⚠️ The summary is not ready yet. See the summary in the app.";

/// Shown when the bot stops while still waiting on a saved bookmark.
pub const INTERRUPTED: &str =
    "⚠️ Saved, but the bot stopped before the content loaded. See the summary in the app.";

/// The final edit once a summary is available.
///
/// Sections are a kind header, then title, summary and tags when present.
pub fn final_message(kind: ContentKind, record: &BookmarkRecord) -> String {
    let mut out = String::new();
    out.push_str(match kind {
        ContentKind::Bookmark => "✅ Saved as a bookmark\n",
        ContentKind::Note => "✅ Saved as a note\n",
        ContentKind::File => "✅ Saved as a file\n",
    });

    let title = record.title.trim();
    if !title.is_empty() {
        out.push_str("\nTitle: ");
        out.push_str(title);
        out.push('\n');
    }

    let summary = record.summary_text();
    if !summary.is_empty() && !looks_empty_summary(&summary) {
        out.push_str("\nSummary:\n");
        out.push_str(&summary);
        out.push('\n');
    }

    let tags = record.tag_names();
    if !tags.is_empty() {
        out.push_str("\nTags: ");
        out.push_str(&tags.join(", "));
        out.push('\n');
    }

    out.trim().to_string()
}

/// Translate a bookmarking API failure into a short hint.
pub fn user_facing_api_error(error: &ApiError) -> String {
    let status = error.status();
    let mut msg = format!("❌ Karakeep error ({}).", status);

    match status {
        404 => {
            msg.push_str(
                " Looks like the server address is wrong. Use the Karakeep domain without /api: /server https://<host>",
            );
            return msg;
        }
        401 | 403 => {
            msg.push_str(" Check the API key (/key) and its permissions.");
            return msg;
        }
        400 => msg.push_str(
            " Karakeep rejected the request payload. The request fields (url/title/notes) are probably wrong.",
        ),
        _ => {}
    }

    let detail = error.to_string();
    let detail = detail.trim();
    if !detail.is_empty() {
        msg.push(' ');
        msg.push_str(detail);
    }
    cap_chars(msg, MAX_ERROR_CHARS)
}

pub fn config_error(error: &ApiError) -> String {
    cap_chars(
        format!("❌ Karakeep configuration error: {}", error),
        MAX_ERROR_CHARS,
    )
}

pub fn file_too_large(filename: &str, size: u64, limit: u64) -> String {
    format!(
        "❌ File too large: {} ({} bytes), limit {} bytes",
        filename, size, limit
    )
}

pub fn download_failed(error: &TransportError) -> String {
    cap_chars(
        format!("❌ Failed to download the file from Telegram: {}", error.to_string().trim()),
        MAX_ERROR_CHARS,
    )
}

pub fn upload_failed(error: &ApiError) -> String {
    cap_chars(
        format!(
            "❌ Failed to upload to Karakeep ({}): {}",
            error.status(),
            error.to_string().trim()
        ),
        MAX_ERROR_CHARS,
    )
}

pub fn attach_failed(error: &ApiError) -> String {
    cap_chars(
        format!(
            "❌ Failed to attach the asset ({}): {}",
            error.status(),
            error.to_string().trim()
        ),
        MAX_ERROR_CHARS,
    )
}

/// Body of the text record created for a caption-less media message.
pub fn file_label(timestamp: i64) -> String {
    let when = DateTime::<Utc>::from_timestamp(timestamp, 0).unwrap_or_default();
    format!(
        "Telegram media ({})",
        when.to_rfc3339_opts(SecondsFormat::Secs, true)
    )
}

fn cap_chars(text: String, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}…", &text[..cut]),
        None => text,
    }
}

fn human_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    match secs {
        60 => "1 minute".to_string(),
        s if s > 60 && s % 60 == 0 => format!("{} minutes", s / 60),
        1 => "1 second".to_string(),
        s => format!("{} seconds", s),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn status(code: u16, preview: &str) -> ApiError {
        ApiError::Status {
            status: code,
            preview: preview.to_string(),
        }
    }

    #[test]
    fn test_final_message_sections() {
        let record = BookmarkRecord::from_json(json!({
            "id": "b1",
            "title": "  Rust 2024  ",
            "summary": "A short recap.",
            "tags": [{"name": "rust"}, {"name": "release"}]
        }))
        .unwrap();

        assert_eq!(
            final_message(ContentKind::Bookmark, &record),
            "✅ Saved as a bookmark\n\nTitle: Rust 2024\n\nSummary:\nA short recap.\n\nTags: rust, release"
        );
    }

    #[test]
    fn test_final_message_skips_placeholder_summary() {
        let record = BookmarkRecord::from_json(json!({
            "id": "b1",
            "summary": "The content is empty, nothing to say."
        }))
        .unwrap();
        assert_eq!(final_message(ContentKind::Note, &record), "✅ Saved as a note");
    }

    #[test]
    fn test_api_error_hints() {
        let not_found = user_facing_api_error(&status(404, "<html>"));
        assert!(not_found.starts_with("❌ Karakeep error (404)."));
        assert!(not_found.contains("/server https://<host>"));
        assert!(!not_found.contains("<html>"));

        let unauthorized = user_facing_api_error(&status(401, "nope"));
        assert!(unauthorized.contains("/key"));
        assert!(!unauthorized.contains("nope"));
        assert!(user_facing_api_error(&status(403, "")).contains("/key"));

        let bad_request = user_facing_api_error(&status(400, "invalid url"));
        assert!(bad_request.contains("rejected the request payload"));
        assert!(bad_request.contains("invalid url"));
    }

    #[test]
    fn test_api_error_is_capped() {
        let msg = user_facing_api_error(&status(500, &"é".repeat(2000)));
        assert_eq!(msg.chars().count(), MAX_ERROR_CHARS + 1);
        assert!(msg.ends_with('…'));
    }

    #[test]
    fn test_transport_error_has_no_status() {
        let msg = user_facing_api_error(&ApiError::Transport("connection refused".to_string()));
        assert!(msg.starts_with("❌ Karakeep error (0)."));
        assert!(msg.contains("connection refused"));
    }

    #[test]
    fn test_file_label() {
        assert_eq!(file_label(1_700_000_000), "Telegram media (2023-11-14T22:13:20Z)");
    }

    #[test]
    fn test_file_too_large_names_file_and_limit() {
        let msg = file_too_large("clip.mp4", 60, 50);
        assert!(msg.contains("clip.mp4"));
        assert!(msg.contains("60 bytes"));
        assert!(msg.contains("limit 50 bytes"));
    }

    #[test]
    fn test_timeout_text() {
        assert!(extraction_timeout(Duration::from_secs(180)).contains("3 minutes"));
        assert!(extraction_timeout(Duration::from_secs(45)).contains("45 seconds"));
    }
}
