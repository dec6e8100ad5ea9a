pub mod config;
pub mod error;
pub mod history;
pub mod http;
pub mod reply;
pub mod voice;

pub use config::Config;
pub use error::{Capability, HistoryError, PersistenceError, ReplyError, VoiceError};
pub use history::{
    reconstruct_sessions, ChatHistory, Conversation, InMemoryMessageStore, Message,
    MessageFilter, MessageStore, NewMessage, Sender, Session, SortOrder,
};
pub use http::{create_router, AppState};
pub use reply::{HttpReplyClient, KeywordReplyClient, ReplyClient};
pub use voice::{
    CaptureEngine, PlaybackEngine, TurnPhase, VoiceEvent, VoiceNotice, VoiceTurnConfig,
    VoiceTurnController, VoiceTurnState,
};
