//! Inbound message types.

use serde::{Deserialize, Serialize};

/// Kind of a rich-text entity annotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// A span of text that is a bare URL.
    Url,
    /// A span of text hyperlinked to an explicit URL.
    TextLink,
    /// A `/command` span.
    BotCommand,
    /// Any other annotation (bold, mention, ...).
    Other(String),
}

/// A rich-text annotation over the message text.
///
/// Offsets and lengths are counted in UTF-16 code units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub kind: EntityKind,
    pub offset: i64,
    pub length: i64,
    /// Target URL for [`EntityKind::TextLink`].
    #[serde(default)]
    pub url: Option<String>,
}

impl Entity {
    /// A bare-URL entity over `offset..offset + length`.
    pub fn url(offset: i64, length: i64) -> Self {
        Self {
            kind: EntityKind::Url,
            offset,
            length,
            url: None,
        }
    }

    /// A hyperlink entity pointing to `url`.
    pub fn text_link(offset: i64, length: i64, url: impl Into<String>) -> Self {
        Self {
            kind: EntityKind::TextLink,
            offset,
            length,
            url: Some(url.into()),
        }
    }
}

/// A downloadable file as described by the platform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaFile {
    pub file_id: String,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    /// Declared size in bytes, 0 when unknown.
    #[serde(default)]
    pub file_size: u64,
}

impl MediaFile {
    pub fn new(file_id: impl Into<String>, file_size: u64) -> Self {
        Self {
            file_id: file_id.into(),
            file_size,
            ..Default::default()
        }
    }
}

/// A sticker, which carries an animation flag on top of the file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sticker {
    pub file: MediaFile,
    #[serde(default)]
    pub is_animated: bool,
}

/// All media a single message may carry, at most one object per kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaPayload {
    /// Photo size variants, smallest first.
    #[serde(default)]
    pub photo: Vec<MediaFile>,
    #[serde(default)]
    pub document: Option<MediaFile>,
    #[serde(default)]
    pub video: Option<MediaFile>,
    #[serde(default)]
    pub audio: Option<MediaFile>,
    #[serde(default)]
    pub voice: Option<MediaFile>,
    #[serde(default)]
    pub animation: Option<MediaFile>,
    #[serde(default)]
    pub video_note: Option<MediaFile>,
    #[serde(default)]
    pub sticker: Option<Sticker>,
}

impl MediaPayload {
    /// Whether any media object is present.
    pub fn has_any(&self) -> bool {
        !self.photo.is_empty()
            || self.document.is_some()
            || self.video.is_some()
            || self.audio.is_some()
            || self.voice.is_some()
            || self.animation.is_some()
            || self.video_note.is_some()
            || self.sticker.is_some()
    }
}

/// A bot command carried by a message (`/name@bot args`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    /// Lowercased command name without the slash or bot suffix.
    pub name: String,
    /// Trimmed text after the command.
    pub arguments: String,
}

/// One platform message, decoded into a platform-neutral shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageUnit {
    pub message_id: i64,
    pub chat_id: i64,
    pub sender_id: i64,
    /// Whether the chat is a one-to-one chat with the bot.
    #[serde(default)]
    pub is_private_chat: bool,
    /// Text, or the caption when the message has no text.
    #[serde(default)]
    pub text: String,
    /// Entities belonging to `text`.
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub media: MediaPayload,
    /// Album identifier shared by the members of one media group.
    #[serde(default)]
    pub media_group_id: Option<String>,
    /// Unix timestamp in seconds.
    pub timestamp: i64,
    #[serde(default)]
    pub command: Option<Command>,
}

impl MessageUnit {
    /// Create a plain text message in a private chat.
    pub fn text(sender_id: i64, chat_id: i64, text: impl Into<String>, timestamp: i64) -> Self {
        Self {
            message_id: 0,
            chat_id,
            sender_id,
            is_private_chat: true,
            text: text.into(),
            entities: Vec::new(),
            media: MediaPayload::default(),
            media_group_id: None,
            timestamp,
            command: None,
        }
    }

    /// Set the entities of this message.
    pub fn with_entities(mut self, entities: Vec<Entity>) -> Self {
        self.entities = entities;
        self
    }

    /// Set the media of this message.
    pub fn with_media(mut self, media: MediaPayload) -> Self {
        self.media = media;
        self
    }

    /// Mark this message as a member of a media group.
    pub fn in_group(mut self, group_id: impl Into<String>) -> Self {
        self.media_group_id = Some(group_id.into());
        self
    }

    /// Set the platform message id.
    pub fn with_message_id(mut self, message_id: i64) -> Self {
        self.message_id = message_id;
        self
    }

    /// Whether the message has non-blank text or caption.
    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }

    /// Whether the message carries any media.
    pub fn has_media(&self) -> bool {
        self.media.has_any()
    }
}

/// An ordered, non-empty set of message units submitted as one save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    units: Vec<MessageUnit>,
    group_id: Option<String>,
    representative: usize,
}

impl Batch {
    /// A batch holding one standalone message.
    pub fn single(unit: MessageUnit) -> Self {
        Self {
            units: vec![unit],
            group_id: None,
            representative: 0,
        }
    }

    /// A batch holding every member of one media group, in arrival order.
    ///
    /// Returns `None` when `units` is empty or a member belongs to another group.
    pub fn group(group_id: impl Into<String>, units: Vec<MessageUnit>) -> Option<Self> {
        let group_id = group_id.into();
        if units.is_empty()
            || units
                .iter()
                .any(|u| u.media_group_id.as_deref() != Some(group_id.as_str()))
        {
            return None;
        }
        // First member with text wins; albums with several captions keep the earliest.
        let representative = units.iter().position(MessageUnit::has_text).unwrap_or(0);
        Some(Self {
            units,
            group_id: Some(group_id),
            representative,
        })
    }

    /// The unit whose text/caption stands for the whole batch.
    pub fn representative(&self) -> &MessageUnit {
        &self.units[self.representative]
    }

    /// All units, in arrival order.
    pub fn units(&self) -> &[MessageUnit] {
        &self.units
    }

    /// The media group this batch was built from, if any.
    pub fn group_id(&self) -> Option<&str> {
        self.group_id.as_deref()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}
