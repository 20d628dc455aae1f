use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Longest accepted message body, in characters, after trimming.
pub const MAX_TEXT_CHARS: usize = 1000;

/// Shortest accepted message body, in characters, after trimming.
pub const MIN_TEXT_CHARS: usize = 3;

/// Most messages ever returned by a listing.
pub const RECENT_WINDOW: usize = 100;

/// Emoji reactions a message may carry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Emoji {
    Happy,
    Sad,
    Angry,
    Anxious,
    Down,
    Hug,
    Relieved,
    #[default]
    Thought,
}

impl Emoji {
    pub const ALL: [Emoji; 8] = [
        Emoji::Happy,
        Emoji::Sad,
        Emoji::Angry,
        Emoji::Anxious,
        Emoji::Down,
        Emoji::Hug,
        Emoji::Relieved,
        Emoji::Thought,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Emoji::Happy => "😊",
            Emoji::Sad => "😢",
            Emoji::Angry => "😤",
            Emoji::Anxious => "😰",
            Emoji::Down => "😔",
            Emoji::Hug => "🤗",
            Emoji::Relieved => "😌",
            Emoji::Thought => "💭",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|emoji| emoji.as_str() == value)
    }

    /// Resolve a submitted emoji, falling back to the default when it is
    /// missing or outside the fixed set.
    pub fn resolve(value: Option<&str>) -> Self {
        value.and_then(|v| Self::parse(v.trim())).unwrap_or_default()
    }
}

impl Serialize for Emoji {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Emoji {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Emoji::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown emoji {:?}", raw)))
    }
}

/// A stored message, including the hashed client identifier.
///
/// Never serialize this into a response; use [`MessageView`] instead.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub id: String,
    pub text: String,
    pub emoji: Emoji,
    pub timestamp: DateTime<Utc>,
    pub client_hash: String,
}

impl Message {
    pub fn new(text: String, emoji: Emoji, client_hash: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            text,
            emoji,
            timestamp: Utc::now(),
            client_hash,
        }
    }

    pub fn view(&self) -> MessageView {
        MessageView {
            id: self.id.clone(),
            text: self.text.clone(),
            emoji: self.emoji,
            timestamp: self.timestamp,
        }
    }
}

/// Outward-facing projection of a message
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct MessageView {
    pub id: String,
    pub text: String,
    pub emoji: Emoji,
    pub timestamp: DateTime<Utc>,
}

/// Body of `POST /api/messages`. The emoji stays a raw string so that an
/// unknown value falls back to the default instead of failing the request.
#[derive(Debug, Deserialize)]
pub struct PostMessageRequest {
    pub text: Option<String>,
    #[serde(default)]
    pub emoji: Option<String>,
}

/// Event pushed to WebSocket subscribers
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent<'a> {
    NewMessage { message: &'a MessageView },
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub storage: &'static str,
    pub active_connections: i64,
}
