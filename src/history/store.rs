use async_trait::async_trait;
use chrono::{SubsecRound, Utc};
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;
use tracing::debug;

use super::message::{Message, NewMessage};
use crate::error::PersistenceError;

/// Row selection for store operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageFilter {
    /// Every message of one owner
    Owner(String),
    /// Messages with these ids
    Ids(Vec<i64>),
    /// Messages written under one conversation key
    SessionKey(String),
}

impl MessageFilter {
    fn matches(&self, message: &Message) -> bool {
        match self {
            MessageFilter::Owner(user_id) => &message.user_id == user_id,
            MessageFilter::Ids(ids) => ids.contains(&message.id),
            MessageFilter::SessionKey(key) => message.session_id.as_deref() == Some(key),
        }
    }
}

/// Result ordering by timestamp (ties broken by id)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Message persistence service
///
/// Implementations:
/// - `InMemoryMessageStore`: process-local store (tests, console chat, demo server)
/// - Remote database adapters live outside this crate
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Store a message, assigning its id (and timestamp when absent)
    async fn insert(&self, message: NewMessage) -> Result<Message, PersistenceError>;

    /// Fetch matching messages in the given order
    async fn select(
        &self,
        filter: &MessageFilter,
        order: SortOrder,
    ) -> Result<Vec<Message>, PersistenceError>;

    /// Delete matching messages, returning how many were removed
    async fn delete(&self, filter: &MessageFilter) -> Result<usize, PersistenceError>;
}

/// Process-local message store
pub struct InMemoryMessageStore {
    messages: RwLock<Vec<Message>>,
    next_id: AtomicI64,
}

impl InMemoryMessageStore {
    pub fn new() -> Self {
        Self {
            messages: RwLock::new(Vec::new()),
            next_id: AtomicI64::new(1),
        }
    }

    pub async fn len(&self) -> usize {
        self.messages.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.messages.read().await.is_empty()
    }
}

impl Default for InMemoryMessageStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn insert(&self, message: NewMessage) -> Result<Message, PersistenceError> {
        let stored = Message {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            user_id: message.user_id,
            sender: message.sender,
            text: message.text,
            timestamp: message
                .timestamp
                .unwrap_or_else(|| Utc::now().trunc_subsecs(3)),
            session_id: message.session_id,
        };

        debug!("Stored message {} for {}", stored.id, stored.user_id);

        self.messages.write().await.push(stored.clone());
        Ok(stored)
    }

    async fn select(
        &self,
        filter: &MessageFilter,
        order: SortOrder,
    ) -> Result<Vec<Message>, PersistenceError> {
        let mut selected: Vec<Message> = self
            .messages
            .read()
            .await
            .iter()
            .filter(|m| filter.matches(m))
            .cloned()
            .collect();

        selected.sort_by(|a, b| (a.timestamp, a.id).cmp(&(b.timestamp, b.id)));
        if order == SortOrder::Descending {
            selected.reverse();
        }

        Ok(selected)
    }

    async fn delete(&self, filter: &MessageFilter) -> Result<usize, PersistenceError> {
        let mut messages = self.messages.write().await;
        let before = messages.len();
        messages.retain(|m| !filter.matches(m));
        let removed = before - messages.len();

        debug!("Deleted {} messages ({:?})", removed, filter);

        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[tokio::test]
    async fn test_insert_assigns_monotonic_ids() {
        let store = InMemoryMessageStore::new();

        let a = store.insert(NewMessage::user("u1", "cough")).await.unwrap();
        let b = store.insert(NewMessage::bot("u1", "See a GP")).await.unwrap();

        assert!(b.id > a.id);
        assert!(b.timestamp >= a.timestamp);
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_select_orders_by_timestamp() {
        let store = InMemoryMessageStore::new();
        let t0 = Utc.with_ymd_and_hms(2025, 1, 1, 8, 0, 0).unwrap();

        // Inserted out of order on purpose
        store
            .insert(NewMessage::user("u1", "later").at(t0 + Duration::minutes(5)))
            .await
            .unwrap();
        store.insert(NewMessage::user("u1", "earlier").at(t0)).await.unwrap();
        store.insert(NewMessage::user("u2", "other owner").at(t0)).await.unwrap();

        let owner = MessageFilter::Owner("u1".to_string());
        let asc = store.select(&owner, SortOrder::Ascending).await.unwrap();
        let texts: Vec<_> = asc.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["earlier", "later"]);

        let desc = store.select(&owner, SortOrder::Descending).await.unwrap();
        assert_eq!(desc[0].text, "later");
    }

    #[tokio::test]
    async fn test_delete_by_ids_and_session_key() {
        let store = InMemoryMessageStore::new();
        let a = store.insert(NewMessage::user("u1", "a").in_session("k1")).await.unwrap();
        store.insert(NewMessage::user("u1", "b").in_session("k1")).await.unwrap();
        store.insert(NewMessage::user("u1", "c").in_session("k2")).await.unwrap();

        let removed = store.delete(&MessageFilter::Ids(vec![a.id, 999])).await.unwrap();
        assert_eq!(removed, 1);

        let removed = store
            .delete(&MessageFilter::SessionKey("k1".to_string()))
            .await
            .unwrap();
        assert_eq!(removed, 1);

        assert_eq!(store.len().await, 1);
    }
}
