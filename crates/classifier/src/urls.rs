//! URL extraction from entity annotations.

use std::collections::HashSet;

use keep_core::{Entity, EntityKind};

use crate::utf16::slice_utf16;

const TRAILING_PUNCTUATION: &[char] = &[')', ']', '.', ',', '!', '?', ':', ';'];

/// Collect the URLs annotated in `text`, deduplicated in first-seen order.
///
/// Hyperlink entities contribute their target; bare-URL entities contribute
/// the annotated span. Trailing punctuation is stripped from both.
pub fn extract_urls(text: &str, entities: &[Entity]) -> Vec<String> {
    let mut out = Vec::new();
    let mut seen = HashSet::new();

    for entity in entities {
        let candidate = match entity.kind {
            EntityKind::TextLink => entity.url.as_deref().unwrap_or_default(),
            EntityKind::Url => slice_utf16(text, entity.offset, entity.length),
            _ => continue,
        };

        let url = clean_url(candidate);
        if url.is_empty() {
            continue;
        }
        if seen.insert(url.to_string()) {
            out.push(url.to_string());
        }
    }

    out
}

/// Trim whitespace and trailing punctuation from a URL candidate.
pub(crate) fn clean_url(candidate: &str) -> &str {
    candidate
        .trim()
        .trim_end_matches(TRAILING_PUNCTUATION)
        .trim()
}
