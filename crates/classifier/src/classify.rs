//! Bookmark / note / file classification.

use std::fmt;

use keep_core::{EntityKind, MessageUnit};
use serde::{Deserialize, Serialize};

use crate::urls::{clean_url, extract_urls};
use crate::utf16::utf16_byte_range;

/// The kind of save a message turns into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Bookmark,
    Note,
    File,
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContentKind::Bookmark => "bookmark",
            ContentKind::Note => "note",
            ContentKind::File => "file",
        };
        f.write_str(name)
    }
}

/// Result of classifying one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Exactly one URL and no media.
    Bookmark {
        url: String,
        /// The trimmed text without the URL itself; empty when only the URL was sent.
        notes: String,
        urls: Vec<String>,
    },
    /// Free text, several URLs, or text alongside media.
    Note {
        text: String,
        urls: Vec<String>,
        has_media: bool,
    },
    /// Media without any text or URL.
    File,
}

impl Classification {
    pub fn kind(&self) -> ContentKind {
        match self {
            Classification::Bookmark { .. } => ContentKind::Bookmark,
            Classification::Note { .. } => ContentKind::Note,
            Classification::File => ContentKind::File,
        }
    }

    /// Every URL found in the message.
    pub fn urls(&self) -> &[String] {
        match self {
            Classification::Bookmark { urls, .. } | Classification::Note { urls, .. } => urls,
            Classification::File => &[],
        }
    }
}

/// Classify a message unit.
///
/// Rules, first match wins:
/// 1. media, no text, no URL: file
/// 2. media: note
/// 3. no URL: note
/// 4. one URL: bookmark, with the remaining text as notes
/// 5. several URLs: note
pub fn classify(unit: &MessageUnit) -> Classification {
    let text = unit.text.trim();
    let urls = extract_urls(&unit.text, &unit.entities);
    let has_media = unit.has_media();

    if has_media && text.is_empty() && urls.is_empty() {
        return Classification::File;
    }

    if has_media {
        return Classification::Note {
            text: text.to_string(),
            urls,
            has_media,
        };
    }

    match urls.len() {
        1 => {
            let url = urls[0].clone();
            let notes = if text == url {
                String::new()
            } else {
                notes_without_url(unit, &url)
            };
            Classification::Bookmark { url, notes, urls }
        }
        _ => Classification::Note {
            text: text.to_string(),
            urls,
            has_media,
        },
    }
}

/// The message text with the bare-URL span that produced `url` cut out.
///
/// Hyperlinked URLs are not part of the text, so the whole text is kept.
fn notes_without_url(unit: &MessageUnit, url: &str) -> String {
    let text = unit.text.as_str();
    let span = unit
        .entities
        .iter()
        .filter(|e| e.kind == EntityKind::Url)
        .map(|e| utf16_byte_range(text, e.offset, e.length))
        .find(|range| clean_url(&text[range.clone()]) == url);

    match span {
        Some(range) => {
            let before = text[..range.start].trim_end();
            let after = text[range.end..].trim_start();
            format!("{} {}", before, after).trim().to_string()
        }
        None => text.trim().to_string(),
    }
}
