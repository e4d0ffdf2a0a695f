//! Attachment extraction from a batch of message units.

use std::collections::HashSet;

use keep_core::{Attachment, MediaFile, MessageUnit};

const FALLBACK_FILENAME: &str = "upload.bin";

/// Collect one attachment per media object across `units`.
///
/// Order follows the batch, then photo, document, video, audio, voice,
/// animation, video note, sticker within a unit. A file id seen earlier in
/// the batch is skipped, as is any object without a file id.
pub fn extract_attachments(units: &[MessageUnit]) -> Vec<Attachment> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    let mut add = |file: &MediaFile, filename: String, mime: String| {
        if file.file_id.trim().is_empty() || !seen.insert(file.file_id.clone()) {
            return;
        }
        let filename = if filename.trim().is_empty() {
            FALLBACK_FILENAME.to_string()
        } else {
            filename
        };
        out.push(Attachment {
            file_id: file.file_id.clone(),
            filename,
            mime,
            size_bytes: file.file_size,
        });
    };

    for unit in units {
        let media = &unit.media;

        // Sizes are ascending; the last one is the original.
        if let Some(photo) = media.photo.last() {
            add(photo, "photo.jpg".to_string(), "image/jpeg".to_string());
        }
        if let Some(doc) = &media.document {
            add(doc, named(doc, "document"), mime_of(doc));
        }
        if let Some(video) = &media.video {
            add(video, "video.mp4".to_string(), mime_of(video));
        }
        if let Some(audio) = &media.audio {
            add(audio, named(audio, "audio.mp3"), mime_of(audio));
        }
        if let Some(voice) = &media.voice {
            add(voice, "voice.ogg".to_string(), mime_of(voice));
        }
        if let Some(animation) = &media.animation {
            add(animation, named(animation, "animation.mp4"), mime_of(animation));
        }
        if let Some(note) = &media.video_note {
            add(note, "video_note.mp4".to_string(), "video/mp4".to_string());
        }
        if let Some(sticker) = &media.sticker {
            let name = if sticker.is_animated {
                "sticker.tgs"
            } else {
                "sticker.webp"
            };
            add(&sticker.file, name.to_string(), String::new());
        }
    }

    out
}

/// The final path component of `name`, or `upload.bin` when nothing is left.
pub fn safe_filename(name: &str) -> String {
    let base = name
        .trim()
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or_default()
        .trim();
    match base {
        "" | "." | ".." => FALLBACK_FILENAME.to_string(),
        other => other.to_string(),
    }
}

fn named(file: &MediaFile, fallback: &str) -> String {
    match file.file_name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => safe_filename(name),
        _ => fallback.to_string(),
    }
}

fn mime_of(file: &MediaFile) -> String {
    file.mime_type.clone().unwrap_or_default()
}
