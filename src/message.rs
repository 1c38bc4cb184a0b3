use crate::i18n::Language;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;

/// Kind of content a chat message carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    Text,
    Image,
}

impl MessageType {
    /// Interpret a raw `type` value.
    ///
    /// The web client stores its enum ordinal (`0` text, `1` image); the
    /// lowercase names are accepted as well. Anything else is unknown.
    pub fn from_wire(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => match n.as_u64()? {
                0 => Some(MessageType::Text),
                1 => Some(MessageType::Image),
                _ => None,
            },
            Value::String(s) => match s.to_ascii_lowercase().as_str() {
                "text" => Some(MessageType::Text),
                "image" => Some(MessageType::Image),
                _ => None,
            },
            _ => None,
        }
    }
}

/// A chat message as stored by the web client.
///
/// Fields the service does not interpret are kept in `extra`, and the loosely
/// typed ones (`language`, `type`, `timestamp`) are kept as raw JSON, so a
/// pass-through copy is written back unchanged whatever the client sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,

    /// Registry id of the language the message was written in, as sent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<Value>,

    /// Text body, or a media URL for image messages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moderated: Option<bool>,

    /// Milliseconds since the Unix epoch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Message {
    /// Text handed to the translation provider.
    ///
    /// When the message has no (or an empty) `message` field the whole
    /// payload, serialized as JSON, is translated instead.
    pub fn translation_text(&self) -> Cow<'_, str> {
        match self.message.as_deref() {
            Some(text) if !text.is_empty() => Cow::Borrowed(text),
            _ => Cow::Owned(serde_json::to_string(self).unwrap_or_default()),
        }
    }

    /// Whether `translation_text` falls back to the whole payload.
    pub fn has_text(&self) -> bool {
        self.message.as_deref().is_some_and(|text| !text.is_empty())
    }

    /// Declared language id, when it is a non-negative integer that fits a `u32`.
    pub fn language_id(&self) -> Option<u32> {
        self.language
            .as_ref()?
            .as_u64()
            .and_then(|id| u32::try_from(id).ok())
    }

    pub fn message_type(&self) -> Option<MessageType> {
        self.kind.as_ref().and_then(MessageType::from_wire)
    }

    /// Copy of this message re-labelled as `target` with `translated` as body.
    pub fn translated_copy(&self, target: &Language, translated: String) -> Message {
        Message {
            language: Some(Value::from(target.id)),
            message: Some(translated),
            ..self.clone()
        }
    }

    /// Send time as a UTC timestamp, if present, numeric and in range.
    pub fn sent_at(&self) -> Option<DateTime<Utc>> {
        let millis = match self.timestamp.as_ref()? {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?,
            _ => return None,
        };
        DateTime::from_timestamp_millis(millis)
    }
}

/// Parse the new value of a staging record.
///
/// `null` (the record was deleted) yields `None`.
pub fn parse_payload(bytes: &[u8]) -> Result<Option<Message>, serde_json::Error> {
    serde_json::from_slice(bytes)
}

/// A write to a room's staging record (`room-messages/{room}/TRANSLATE/{id}`).
#[derive(Debug, Clone, PartialEq)]
pub struct StagingEvent {
    pub room_id: String,
    pub message_id: String,
    pub payload: Message,
}

impl StagingEvent {
    pub fn new(
        room_id: impl Into<String>,
        message_id: impl Into<String>,
        payload: Message,
    ) -> Self {
        Self {
            room_id: room_id.into(),
            message_id: message_id.into(),
            payload,
        }
    }
}
