//! Chat history
//!
//! This module provides:
//! - The persisted `Message` record and the `MessageStore` service
//! - Session reconstruction from a flat message log
//! - `ChatHistory`, the per-owner session view (browse, delete, clear)
//! - `Conversation`, for starting or resuming a chat and appending turns

mod conversation;
mod message;
mod reconstruct;
mod store;
mod view;

pub use conversation::{new_session_key, Conversation, SEND_FAILED_REPLY, UNSAVED_MESSAGE_ID};
pub use message::{normalize_input, truncate_with_ellipsis, Message, NewMessage, Sender, MAX_INPUT_CHARS};
pub use reconstruct::{
    default_session_gap, reconstruct_sessions, Session, SessionSummary,
    DEFAULT_SESSION_GAP_MINUTES, UNTITLED_SESSION,
};
pub use store::{InMemoryMessageStore, MessageFilter, MessageStore, SortOrder};
pub use view::{ChatHistory, HistoryStats};
