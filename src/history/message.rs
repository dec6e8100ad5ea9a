use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of characters accepted from a single user input
pub const MAX_INPUT_CHARS: usize = 1000;

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

/// A persisted chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Store-assigned identifier, monotonic within a store
    pub id: i64,

    /// Owner of the message
    pub user_id: String,

    pub sender: Sender,

    /// Message body
    #[serde(alias = "message")]
    pub text: String,

    /// Creation instant (millisecond precision)
    pub timestamp: DateTime<Utc>,

    /// Client-assigned conversation key, if any
    pub session_id: Option<String>,
}

/// A message that has not been stored yet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMessage {
    pub user_id: String,
    pub sender: Sender,
    pub text: String,

    /// When `None` the store assigns the current time
    pub timestamp: Option<DateTime<Utc>>,

    pub session_id: Option<String>,
}

impl NewMessage {
    pub fn user(user_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            sender: Sender::User,
            text: text.into(),
            timestamp: None,
            session_id: None,
        }
    }

    pub fn bot(user_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            sender: Sender::Bot,
            ..Self::user(user_id, text)
        }
    }

    pub fn in_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

/// Truncate `text` to at most `max_chars` characters, appending "..." when cut
pub fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Trim user input and cap it at [`MAX_INPUT_CHARS`]. Returns `None` for blank input.
pub fn normalize_input(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    Some(match trimmed.char_indices().nth(MAX_INPUT_CHARS) {
        Some((cut, _)) => trimmed[..cut].to_string(),
        None => trimmed.to_string(),
    })
}
