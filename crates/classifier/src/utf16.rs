//! Substrings addressed by UTF-16 code units.

use std::ops::Range;

/// Return the part of `text` addressed by a UTF-16 `offset` and `length`.
///
/// Chat platforms count entity positions in UTF-16 code units, so a
/// character outside the Basic Multilingual Plane takes two units. Negative
/// or oversized values clamp to the nearest valid boundary.
pub fn slice_utf16(text: &str, offset: i64, length: i64) -> &str {
    &text[utf16_byte_range(text, offset, length)]
}

/// Byte range of `text` covered by a UTF-16 `offset` and `length`, clamped.
pub fn utf16_byte_range(text: &str, offset: i64, length: i64) -> Range<usize> {
    let start = offset.max(0);
    let end = start.saturating_add(length.max(0));

    let mut units: i64 = 0;
    let mut start_byte = None;
    let mut end_byte = None;

    for (idx, ch) in text.char_indices() {
        if start_byte.is_none() && units >= start {
            start_byte = Some(idx);
        }
        if units >= end {
            end_byte = Some(idx);
            break;
        }
        units += ch.len_utf16() as i64;
    }

    let start_byte = start_byte.unwrap_or(text.len());
    let end_byte = end_byte.unwrap_or(text.len()).max(start_byte);
    start_byte..end_byte
}
