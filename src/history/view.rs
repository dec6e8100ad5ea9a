use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

use super::reconstruct::{reconstruct_sessions, Session};
use super::store::{MessageFilter, MessageStore, SortOrder};
use crate::error::{HistoryError, PersistenceError};

/// Aggregate figures shown above the history list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HistoryStats {
    /// Number of sessions
    pub conversations: usize,

    /// Messages across all sessions
    pub total_messages: usize,

    /// Sessions in which the user wrote at least one message
    pub active_chats: usize,
}

impl HistoryStats {
    pub fn from_sessions(sessions: &[Session]) -> Self {
        Self {
            conversations: sessions.len(),
            total_messages: sessions.iter().map(|s| s.message_count).sum(),
            active_chats: sessions.iter().filter(|s| s.has_user_message()).count(),
        }
    }
}

/// One owner's chat history, grouped into sessions
///
/// The session list is only replaced after the store confirms an operation,
/// so a failed delete never hides messages that still exist.
pub struct ChatHistory {
    store: Arc<dyn MessageStore>,
    user_id: String,
    session_gap: Duration,
    sessions: Vec<Session>,
}

impl ChatHistory {
    pub fn new(store: Arc<dyn MessageStore>, user_id: impl Into<String>, session_gap: Duration) -> Self {
        Self {
            store,
            user_id: user_id.into(),
            session_gap,
            sessions: Vec::new(),
        }
    }

    /// Load and regroup history for this owner
    pub async fn open(
        store: Arc<dyn MessageStore>,
        user_id: impl Into<String>,
        session_gap: Duration,
    ) -> Result<Self, HistoryError> {
        let mut history = Self::new(store, user_id, session_gap);
        history.refresh().await?;
        Ok(history)
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Sessions, most recently active first
    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn find(&self, session_id: &str) -> Option<&Session> {
        self.sessions.iter().find(|s| s.id == session_id)
    }

    pub fn stats(&self) -> HistoryStats {
        HistoryStats::from_sessions(&self.sessions)
    }

    /// Re-read the owner's log and rebuild the session list
    pub async fn refresh(&mut self) -> Result<&[Session], HistoryError> {
        let messages = self
            .store
            .select(&MessageFilter::Owner(self.user_id.clone()), SortOrder::Ascending)
            .await
            .map_err(|e| {
                error!("Error fetching chat history for {}: {}", self.user_id, e);
                e
            })?;

        self.sessions = reconstruct_sessions(messages, self.session_gap);

        info!(
            "Loaded {} sessions for {}",
            self.sessions.len(),
            self.user_id
        );

        Ok(&self.sessions)
    }

    /// Delete every message of one session
    ///
    /// The session stays in the view unless the store reports that all of
    /// its messages were removed.
    pub async fn delete_session(&mut self, session_id: &str) -> Result<(), HistoryError> {
        let session = self
            .find(session_id)
            .ok_or_else(|| HistoryError::SessionNotFound(session_id.to_string()))?;

        let ids = session.message_ids();
        let requested = ids.len();

        let deleted = self.store.delete(&MessageFilter::Ids(ids)).await.map_err(|e| {
            error!("Error deleting session {}: {}", session_id, e);
            e
        })?;

        if deleted != requested {
            warn!(
                "Session {} only partially deleted ({} of {})",
                session_id, deleted, requested
            );
            return Err(PersistenceError::PartialDelete { requested, deleted }.into());
        }

        self.sessions.retain(|s| s.id != session_id);
        info!("Deleted session {} ({} messages)", session_id, deleted);

        Ok(())
    }

    /// Delete the owner's whole history
    pub async fn clear(&mut self) -> Result<usize, HistoryError> {
        let deleted = self
            .store
            .delete(&MessageFilter::Owner(self.user_id.clone()))
            .await
            .map_err(|e| {
                error!("Error clearing history for {}: {}", self.user_id, e);
                e
            })?;

        self.sessions.clear();
        info!("Cleared {} messages for {}", deleted, self.user_id);

        Ok(deleted)
    }
}
