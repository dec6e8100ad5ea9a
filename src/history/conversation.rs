use chrono::{SubsecRound, Utc};
use std::sync::Arc;
use tracing::{error, info, warn};

use super::message::{normalize_input, Message, NewMessage, Sender};
use super::reconstruct::Session;
use super::store::{MessageFilter, MessageStore, SortOrder};
use crate::error::{HistoryError, PersistenceError};
use crate::reply::{reply_or_fallback, ReplyClient};

/// Shown in place of a reply when the turn could not be stored
pub const SEND_FAILED_REPLY: &str =
    "Sorry, there was an error processing your message. Please try again.";

/// Id carried by local notices that were never written to the store
pub const UNSAVED_MESSAGE_ID: i64 = 0;

/// An open chat conversation that new turns are appended to
pub struct Conversation {
    store: Arc<dyn MessageStore>,
    user_id: String,
    session_key: String,
    messages: Vec<Message>,
}

/// Generate a fresh conversation key
pub fn new_session_key() -> String {
    format!("session-{}", uuid::Uuid::new_v4())
}

impl Conversation {
    /// Start an empty conversation under a new key
    pub fn start(store: Arc<dyn MessageStore>, user_id: impl Into<String>) -> Self {
        let session_key = new_session_key();
        info!("Starting conversation {}", session_key);

        Self {
            store,
            user_id: user_id.into(),
            session_key,
            messages: Vec::new(),
        }
    }

    /// Continue a conversation from its stored messages
    ///
    /// Falls back to a fresh conversation when the store cannot be read.
    pub async fn resume(
        store: Arc<dyn MessageStore>,
        user_id: impl Into<String>,
        session_key: &str,
    ) -> Self {
        let user_id = user_id.into();

        match Self::load(&store, &user_id, session_key).await {
            Ok(messages) => {
                info!(
                    "Resumed conversation {} ({} messages)",
                    session_key,
                    messages.len()
                );
                Self {
                    store,
                    user_id,
                    session_key: session_key.to_string(),
                    messages,
                }
            }
            Err(e) => {
                warn!("Error loading session {}: {}; starting a new one", session_key, e);
                Self::start(store, user_id)
            }
        }
    }

    /// Continue a session picked from the history view
    pub fn from_session(store: Arc<dyn MessageStore>, session: &Session) -> Option<Self> {
        let first = session.messages.first()?;

        Some(Self {
            user_id: first.user_id.clone(),
            session_key: session.resume_key(),
            messages: session.messages.clone(),
            store,
        })
    }

    async fn load(
        store: &Arc<dyn MessageStore>,
        user_id: &str,
        session_key: &str,
    ) -> Result<Vec<Message>, PersistenceError> {
        let messages = store
            .select(
                &MessageFilter::SessionKey(session_key.to_string()),
                SortOrder::Ascending,
            )
            .await?;

        Ok(messages.into_iter().filter(|m| m.user_id == user_id).collect())
    }

    pub fn session_key(&self) -> &str {
        &self.session_key
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Send one user message and record the assistant's reply
    ///
    /// Reply failures become the fallback reply text. Storage failures are
    /// answered with a local [`SEND_FAILED_REPLY`] message that is not persisted.
    pub async fn send(
        &mut self,
        text: &str,
        replies: &dyn ReplyClient,
    ) -> Result<Message, HistoryError> {
        let input = normalize_input(text).ok_or(HistoryError::EmptyMessage)?;

        match self.exchange(input, replies).await {
            Ok(reply) => Ok(reply),
            Err(e) => {
                error!("Error sending message in {}: {}", self.session_key, e);
                let notice = Message {
                    id: UNSAVED_MESSAGE_ID,
                    user_id: self.user_id.clone(),
                    sender: Sender::Bot,
                    text: SEND_FAILED_REPLY.to_string(),
                    timestamp: Utc::now().trunc_subsecs(3),
                    session_id: Some(self.session_key.clone()),
                };
                self.messages.push(notice.clone());
                Ok(notice)
            }
        }
    }

    async fn exchange(
        &mut self,
        input: String,
        replies: &dyn ReplyClient,
    ) -> Result<Message, PersistenceError> {
        let question = self
            .store
            .insert(NewMessage::user(&self.user_id, input).in_session(&self.session_key))
            .await?;
        self.messages.push(question.clone());

        let reply_text = reply_or_fallback(replies, &question.text).await;

        let reply = self
            .store
            .insert(NewMessage::bot(&self.user_id, reply_text).in_session(&self.session_key))
            .await?;
        self.messages.push(reply.clone());

        Ok(reply)
    }
}
