use crate::history::{default_session_gap, ChatHistory, InMemoryMessageStore, MessageStore};
use crate::reply::{KeywordReplyClient, ReplyClient};
use std::sync::Arc;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Message persistence service
    pub store: Arc<dyn MessageStore>,

    /// Source of assistant replies
    pub replies: Arc<dyn ReplyClient>,

    /// Pause that separates two sessions
    pub session_gap: chrono::Duration,
}

impl AppState {
    pub fn new(
        store: Arc<dyn MessageStore>,
        replies: Arc<dyn ReplyClient>,
        session_gap: chrono::Duration,
    ) -> Self {
        Self {
            store,
            replies,
            session_gap,
        }
    }

    /// Session view for one owner (not yet loaded)
    pub fn history(&self, user_id: &str) -> ChatHistory {
        ChatHistory::new(Arc::clone(&self.store), user_id, self.session_gap)
    }
}

impl Default for AppState {
    /// In-memory store with offline triage replies
    fn default() -> Self {
        Self::new(
            Arc::new(InMemoryMessageStore::new()),
            Arc::new(KeywordReplyClient::new()),
            default_session_gap(),
        )
    }
}
