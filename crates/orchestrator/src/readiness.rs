//! Readiness predicates for the remote service's asynchronous work.

use std::fmt;

use keep_core::BookmarkRecord;
use serde_json::Value;

/// Deepest nesting level inspected by [`has_extracted_content`].
const MAX_DEPTH: usize = 6;

/// Trimmed length a content-like field needs to count as extracted.
const CONTENT_FIELD_MIN_CHARS: usize = 200;

/// Trimmed length any string needs to count as extracted content.
const LARGE_STRING_MIN_CHARS: usize = 400;

const CONTENT_KEYS: &[&str] = &[
    "content",
    "html",
    "text",
    "textcontent",
    "readablecontent",
    "excerpt",
    "description",
    "markdown",
    "article",
];

/// User-written or generated fields; never evidence of a crawled page.
const IGNORED_KEYS: &[&str] = &["notes", "note", "summary"];

const STATUS_KEYS: &[&str] = &["crawlstatus", "taggingstatus"];

/// Why a record was judged to have extracted content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentSignal {
    /// A crawl or tagging status reported success.
    Status(String),
    /// A content-like field carries enough text.
    Field { key: String, chars: usize },
    /// Some string somewhere is long enough on its own.
    LargeString { chars: usize },
}

impl fmt::Display for ContentSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentSignal::Status(key) => write!(f, "{}=success", key),
            ContentSignal::Field { key, chars } => write!(f, "{}={} chars", key, chars),
            ContentSignal::LargeString { chars } => write!(f, "large_string={} chars", chars),
        }
    }
}

/// Inspect a raw record for signs that the page content has been extracted.
pub fn has_extracted_content(raw: &Value) -> Option<ContentSignal> {
    scan(raw, 0)
}

fn scan(value: &Value, depth: usize) -> Option<ContentSignal> {
    if depth > MAX_DEPTH {
        return None;
    }

    match value {
        Value::Object(map) => map.iter().find_map(|(key, child)| {
            let lowered = key.to_lowercase();
            if IGNORED_KEYS.contains(&lowered.as_str()) {
                return None;
            }
            if STATUS_KEYS.contains(&lowered.as_str()) && child.as_str() == Some("success") {
                return Some(ContentSignal::Status(key.clone()));
            }
            if CONTENT_KEYS.contains(&lowered.as_str()) {
                if let Some(chars) = child.as_str().map(trimmed_chars) {
                    if chars >= CONTENT_FIELD_MIN_CHARS {
                        return Some(ContentSignal::Field {
                            key: key.clone(),
                            chars,
                        });
                    }
                }
            }
            scan(child, depth + 1)
        }),
        Value::Array(items) => items.iter().find_map(|item| scan(item, depth + 1)),
        Value::String(s) => {
            let chars = trimmed_chars(s);
            (chars >= LARGE_STRING_MIN_CHARS).then_some(ContentSignal::LargeString { chars })
        }
        _ => None,
    }
}

fn trimmed_chars(s: &str) -> usize {
    s.trim().chars().count()
}

/// Whether a summary is the service's placeholder for "nothing to summarize".
pub fn looks_empty_summary(summary: &str) -> bool {
    let lowered = summary.to_lowercase();
    lowered.contains("content is empty") || lowered.contains("no information to summarize")
}

/// The record's summary, if it is real content.
pub fn ready_summary(record: &BookmarkRecord) -> Option<String> {
    let summary = record.summary_text();
    (!summary.is_empty() && !looks_empty_summary(&summary)).then_some(summary)
}
