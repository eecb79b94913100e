use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::models::chat::ChatTurn;

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct InterviewRequest {
    /// Absent history means a fresh conversation.
    #[serde(default)]
    pub history: Vec<ChatTurn>,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct TeacherRequest {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Field name the model text is returned under. The clients expect a
/// different key per route even though the payload shape is the same, so one
/// reply type carries the name instead of three near-duplicate structs.
#[derive(Clone, Copy, Debug)]
pub enum ReplyField {
    Answer,
    Reply,
    Correction,
}

impl ReplyField {
    pub fn as_str(self) -> &'static str {
        match self {
            ReplyField::Answer => "answer",
            ReplyField::Reply => "reply",
            ReplyField::Correction => "correction",
        }
    }
}

/// A single model reply, serialized as `{ "<field>": text }` with an
/// optional sibling `transcription` when the input was audio.
#[derive(Debug)]
pub struct ChatReply {
    field: ReplyField,
    text: String,
    transcription: Option<String>,
}

impl ChatReply {
    pub fn new(field: ReplyField, text: impl Into<String>) -> Self {
        Self {
            field,
            text: text.into(),
            transcription: None,
        }
    }

    pub fn with_transcription(mut self, transcription: impl Into<String>) -> Self {
        self.transcription = Some(transcription.into());
        self
    }
}

impl Serialize for ChatReply {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = 1 + usize::from(self.transcription.is_some());
        let mut map = serializer.serialize_map(Some(len))?;
        if let Some(transcription) = &self.transcription {
            map.serialize_entry("transcription", transcription)?;
        }
        map.serialize_entry(self.field.as_str(), &self.text)?;
        map.end()
    }
}
