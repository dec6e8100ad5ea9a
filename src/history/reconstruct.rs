// Conversation reconstruction
//
// Chat history is stored as one flat log per user. This module splits that log
// into conversation sessions: consecutive messages stay in the same session
// while the gap between them is at most the session gap (30 minutes by
// default). Sessions are a view and are recomputed on every fetch.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::message::{truncate_with_ellipsis, Message, Sender};

/// Default gap (in minutes) after which a new session starts
pub const DEFAULT_SESSION_GAP_MINUTES: i64 = 30;

/// Title used when a session holds no user message
pub const UNTITLED_SESSION: &str = "New Conversation";

const TITLE_MAX_CHARS: usize = 50;
const PREVIEW_MAX_CHARS: usize = 100;

pub fn default_session_gap() -> Duration {
    Duration::minutes(DEFAULT_SESSION_GAP_MINUTES)
}

/// A derived group of messages exchanged without a long pause
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// `session-<first message id>`
    pub id: String,

    /// Messages in chronological order
    pub messages: Vec<Message>,

    pub start_time: DateTime<Utc>,

    /// Timestamp of the newest message
    pub last_message: DateTime<Utc>,

    pub message_count: usize,
}

impl Session {
    fn seed(message: Message) -> Self {
        Self {
            id: session_id_for(&message),
            start_time: message.timestamp,
            last_message: message.timestamp,
            message_count: 1,
            messages: vec![message],
        }
    }

    fn push(&mut self, message: Message) {
        self.last_message = message.timestamp;
        self.message_count += 1;
        self.messages.push(message);
    }

    /// First user message, truncated for display
    pub fn title(&self) -> String {
        self.messages
            .iter()
            .find(|msg| msg.sender == Sender::User)
            .map(|msg| truncate_with_ellipsis(&msg.text, TITLE_MAX_CHARS))
            .unwrap_or_else(|| UNTITLED_SESSION.to_string())
    }

    /// Text of the last message, truncated for display
    pub fn preview(&self) -> String {
        self.messages
            .last()
            .map(|msg| truncate_with_ellipsis(&msg.text, PREVIEW_MAX_CHARS))
            .unwrap_or_default()
    }

    /// Whether the user said anything in this session
    pub fn has_user_message(&self) -> bool {
        self.messages.iter().any(|msg| msg.sender == Sender::User)
    }

    pub fn message_ids(&self) -> Vec<i64> {
        self.messages.iter().map(|msg| msg.id).collect()
    }

    /// Conversation key to continue this session with
    ///
    /// Prefers the key the messages were written with; sessions built from
    /// unkeyed messages fall back to the derived id.
    pub fn resume_key(&self) -> String {
        self.messages
            .iter()
            .find_map(|msg| msg.session_id.clone())
            .unwrap_or_else(|| self.id.clone())
    }
}

fn session_id_for(message: &Message) -> String {
    format!("session-{}", message.id)
}

/// Group an ascending-timestamp message log into sessions, newest activity first
///
/// A new session starts whenever the gap to the previous message is strictly
/// greater than `gap`.
pub fn reconstruct_sessions(messages: Vec<Message>, gap: Duration) -> Vec<Session> {
    let mut iter = messages.into_iter();
    let Some(first) = iter.next() else {
        return Vec::new();
    };

    let mut sessions = Vec::new();
    let mut current = Session::seed(first);

    for message in iter {
        if message.timestamp - current.last_message > gap {
            let finished = std::mem::replace(&mut current, Session::seed(message));
            sessions.push(finished);
        } else {
            current.push(message);
        }
    }
    sessions.push(current);

    // Stable sort keeps equal-activity sessions in chronological order
    sessions.sort_by(|a, b| b.last_message.cmp(&a.last_message));
    sessions
}

/// Summary line shown in the history list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: String,
    /// Key new turns for this session are stored under
    pub resume_key: String,
    pub title: String,
    pub preview: String,
    pub start_time: DateTime<Utc>,
    pub last_message: DateTime<Utc>,
    pub message_count: usize,
}

impl From<&Session> for SessionSummary {
    fn from(session: &Session) -> Self {
        Self {
            id: session.id.clone(),
            resume_key: session.resume_key(),
            title: session.title(),
            preview: session.preview(),
            start_time: session.start_time,
            last_message: session.last_message,
            message_count: session.message_count,
        }
    }
}
