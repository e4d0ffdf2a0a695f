//! Conversion of Bot API messages into platform-neutral message units.

use classifier::utf16_byte_range;
use keep_core::{Command, Entity, EntityKind, MediaFile, MediaPayload, MessageUnit};

use crate::types::{FileInfo, Message, MessageEntity, PhotoSize, Sticker};

/// Extension methods on [`Message`].
pub trait MessageExt {
    /// Convert into a [`MessageUnit`]. Returns `None` for messages without a sender.
    fn to_message_unit(&self) -> Option<MessageUnit>;

    /// The bot command at the start of the text, if any.
    fn command(&self) -> Option<Command>;
}

impl MessageExt for Message {
    fn to_message_unit(&self) -> Option<MessageUnit> {
        let sender = self.from.as_ref()?;

        let (text, entities) = match self.text.as_deref() {
            Some(text) if !text.is_empty() => (text, &self.entities),
            _ => (
                self.caption.as_deref().unwrap_or_default(),
                &self.caption_entities,
            ),
        };

        Some(MessageUnit {
            message_id: self.message_id,
            chat_id: self.chat.id,
            sender_id: sender.id,
            is_private_chat: self.chat.is_private(),
            text: text.to_string(),
            entities: entities.iter().map(convert_entity).collect(),
            media: media_payload(self),
            media_group_id: self.media_group_id.clone().filter(|id| !id.is_empty()),
            timestamp: self.date,
            command: self.command(),
        })
    }

    fn command(&self) -> Option<Command> {
        let text = self.text.as_deref()?;
        let entity = self
            .entities
            .iter()
            .find(|e| e.kind == "bot_command" && e.offset == 0)?;

        let span = utf16_byte_range(text, entity.offset, entity.length);
        let raw = text[span.clone()].trim_start_matches('/');
        let name = raw.split('@').next().unwrap_or_default().to_lowercase();

        Some(Command {
            name,
            arguments: text[span.end..].trim().to_string(),
        })
    }
}

fn convert_entity(entity: &MessageEntity) -> Entity {
    let kind = match entity.kind.as_str() {
        "url" => EntityKind::Url,
        "text_link" => EntityKind::TextLink,
        "bot_command" => EntityKind::BotCommand,
        other => EntityKind::Other(other.to_string()),
    };
    Entity {
        kind,
        offset: entity.offset,
        length: entity.length,
        url: entity.url.clone(),
    }
}

fn media_payload(message: &Message) -> MediaPayload {
    MediaPayload {
        photo: message.photo.iter().map(photo_file).collect(),
        document: message.document.as_ref().map(info_file),
        video: message.video.as_ref().map(info_file),
        audio: message.audio.as_ref().map(info_file),
        voice: message.voice.as_ref().map(info_file),
        animation: message.animation.as_ref().map(info_file),
        video_note: message.video_note.as_ref().map(info_file),
        sticker: message.sticker.as_ref().map(sticker),
    }
}

fn photo_file(photo: &PhotoSize) -> MediaFile {
    MediaFile::new(photo.file_id.clone(), photo.file_size.unwrap_or_default())
}

fn info_file(info: &FileInfo) -> MediaFile {
    MediaFile {
        file_id: info.file_id.clone(),
        file_name: info.file_name.clone(),
        mime_type: info.mime_type.clone(),
        file_size: info.file_size.unwrap_or_default(),
    }
}

fn sticker(sticker: &Sticker) -> keep_core::Sticker {
    keep_core::Sticker {
        file: MediaFile::new(sticker.file_id.clone(), sticker.file_size.unwrap_or_default()),
        is_animated: sticker.is_animated,
    }
}
