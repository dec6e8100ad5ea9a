use std::time::Duration;
use thiserror::Error;

/// Which runtime speech capability an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    /// Speech-to-text
    Capture,
    /// Text-to-speech
    Playback,
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Capability::Capture => write!(f, "speech recognition"),
            Capability::Playback => write!(f, "speech synthesis"),
        }
    }
}

/// Failures surfaced by the voice turn controller
#[derive(Debug, Clone, Error, PartialEq)]
pub enum VoiceError {
    #[error("{0} is not supported in this environment")]
    CapabilityUnavailable(Capability),

    #[error("{capability} engine error: {message}")]
    Engine {
        capability: Capability,
        message: String,
    },

    #[error("reply failed: {0}")]
    RemoteReply(#[from] ReplyError),

    #[error("cannot {action} while {phase}")]
    InvalidTransition {
        phase: &'static str,
        action: &'static str,
    },

    #[error("nothing to submit")]
    EmptyTranscript,
}

/// Failures talking to the reply endpoint
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ReplyError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("endpoint returned status {0}")]
    Status(u16),

    #[error("invalid response body: {0}")]
    Decode(String),

    #[error("no reply within {0:?}")]
    Timeout(Duration),
}

/// Failures of the message store
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PersistenceError {
    #[error("message store unavailable: {0}")]
    Backend(String),

    #[error("deleted {deleted} of {requested} messages")]
    PartialDelete { requested: usize, deleted: usize },
}

/// Failures of history browsing operations
#[derive(Debug, Clone, Error, PartialEq)]
pub enum HistoryError {
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error("session {0} not found")]
    SessionNotFound(String),

    #[error("message is empty")]
    EmptyMessage,
}
