// Integration tests for chat history browsing and conversations
//
// A fault-injecting store wraps the in-memory store to check that failed or
// partial deletions never change the session view.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use triage_assist::error::{HistoryError, PersistenceError, ReplyError};
use triage_assist::history::{
    default_session_gap, ChatHistory, Conversation, InMemoryMessageStore, Message, MessageFilter,
    MessageStore, NewMessage, SortOrder, SEND_FAILED_REPLY, UNSAVED_MESSAGE_ID,
};
use triage_assist::reply::{KeywordReplyClient, ReplyClient, FALLBACK_REPLY, GENERAL_PRACTICE_REPLY};

#[derive(Default)]
struct FlakyStore {
    inner: InMemoryMessageStore,
    fail_insert: AtomicBool,
    fail_select: AtomicBool,
    fail_delete: AtomicBool,
    /// Delete only the first targeted message
    partial_delete: AtomicBool,
}

#[async_trait]
impl MessageStore for FlakyStore {
    async fn insert(&self, message: NewMessage) -> Result<Message, PersistenceError> {
        if self.fail_insert.load(Ordering::SeqCst) {
            return Err(PersistenceError::Backend("insert refused".to_string()));
        }
        self.inner.insert(message).await
    }

    async fn select(
        &self,
        filter: &MessageFilter,
        order: SortOrder,
    ) -> Result<Vec<Message>, PersistenceError> {
        if self.fail_select.load(Ordering::SeqCst) {
            return Err(PersistenceError::Backend("select refused".to_string()));
        }
        self.inner.select(filter, order).await
    }

    async fn delete(&self, filter: &MessageFilter) -> Result<usize, PersistenceError> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(PersistenceError::Backend("delete refused".to_string()));
        }
        match filter {
            MessageFilter::Ids(ids) if self.partial_delete.load(Ordering::SeqCst) => {
                self.inner.delete(&MessageFilter::Ids(ids[..1].to_vec())).await
            }
            _ => self.inner.delete(filter).await,
        }
    }
}

struct FailingReply;

#[async_trait]
impl ReplyClient for FailingReply {
    async fn reply(&self, _query: &str) -> Result<String, ReplyError> {
        Err(ReplyError::Transport("connection refused".to_string()))
    }

    fn name(&self) -> &str {
        "failing"
    }
}

fn at(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 10, 27, 9, 0, 0).unwrap() + Duration::minutes(minutes)
}

/// Two conversations for "patient-1" (t=0..5 and t=40..42) and one for another user
async fn seeded(store: &dyn MessageStore) -> Result<()> {
    store.insert(NewMessage::user("patient-1", "I have a cough").at(at(0))).await?;
    store.insert(NewMessage::bot("patient-1", GENERAL_PRACTICE_REPLY).at(at(5))).await?;
    store.insert(NewMessage::user("patient-1", "Now chest pain").at(at(40))).await?;
    store.insert(NewMessage::bot("patient-1", "Please see emergency.").at(at(42))).await?;
    store.insert(NewMessage::user("patient-2", "hello").at(at(1))).await?;
    Ok(())
}

#[tokio::test]
async fn test_history_groups_sessions() -> Result<()> {
    let store = Arc::new(InMemoryMessageStore::new());
    seeded(store.as_ref()).await?;

    let history = ChatHistory::open(store, "patient-1", default_session_gap()).await?;
    let sessions = history.sessions();

    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions[0].title(), "Now chest pain");
    assert_eq!(sessions[0].preview(), "Please see emergency.");
    assert_eq!(sessions[1].title(), "I have a cough");
    assert!(sessions.iter().all(|s| s.messages.iter().all(|m| m.user_id == "patient-1")));

    let stats = history.stats();
    assert_eq!(stats.conversations, 2);
    assert_eq!(stats.total_messages, 4);
    assert_eq!(stats.active_chats, 2);

    Ok(())
}

#[tokio::test]
async fn test_session_ids_stable_across_refresh() -> Result<()> {
    let store = Arc::new(InMemoryMessageStore::new());
    seeded(store.as_ref()).await?;

    let mut history = ChatHistory::open(store, "patient-1", default_session_gap()).await?;
    let first: Vec<_> = history.sessions().iter().map(|s| (s.id.clone(), s.message_count)).collect();

    history.refresh().await?;
    let second: Vec<_> = history.sessions().iter().map(|s| (s.id.clone(), s.message_count)).collect();

    assert_eq!(first, second);
    Ok(())
}

#[tokio::test]
async fn test_delete_session_removes_messages_and_view() -> Result<()> {
    let store = Arc::new(InMemoryMessageStore::new());
    seeded(store.as_ref()).await?;

    let mut history = ChatHistory::open(store.clone(), "patient-1", default_session_gap()).await?;
    let target = history.sessions()[1].id.clone();

    history.delete_session(&target).await?;

    assert_eq!(history.sessions().len(), 1);
    assert!(history.find(&target).is_none());
    assert_eq!(store.len().await, 3);

    // The store agrees with the view
    history.refresh().await?;
    assert_eq!(history.sessions().len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_delete_unknown_session() -> Result<()> {
    let store = Arc::new(InMemoryMessageStore::new());
    seeded(store.as_ref()).await?;
    let mut history = ChatHistory::open(store, "patient-1", default_session_gap()).await?;

    let err = history.delete_session("session-999").await.unwrap_err();

    assert_eq!(err, HistoryError::SessionNotFound("session-999".to_string()));
    assert_eq!(history.sessions().len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_partial_delete_keeps_session_in_view() -> Result<()> {
    let store = Arc::new(FlakyStore::default());
    seeded(store.as_ref()).await?;
    let mut history = ChatHistory::open(store.clone(), "patient-1", default_session_gap()).await?;
    let target = history.sessions()[0].id.clone();

    store.partial_delete.store(true, Ordering::SeqCst);
    let err = history.delete_session(&target).await.unwrap_err();

    assert_eq!(
        err,
        HistoryError::Persistence(PersistenceError::PartialDelete {
            requested: 2,
            deleted: 1
        })
    );
    assert!(history.find(&target).is_some(), "view must not change on partial failure");
    assert_eq!(history.sessions().len(), 2);

    Ok(())
}

#[tokio::test]
async fn test_failed_delete_keeps_session_in_view() -> Result<()> {
    let store = Arc::new(FlakyStore::default());
    seeded(store.as_ref()).await?;
    let mut history = ChatHistory::open(store.clone(), "patient-1", default_session_gap()).await?;
    let target = history.sessions()[0].id.clone();

    store.fail_delete.store(true, Ordering::SeqCst);

    assert!(matches!(
        history.delete_session(&target).await,
        Err(HistoryError::Persistence(PersistenceError::Backend(_)))
    ));
    assert!(history.find(&target).is_some());

    assert!(history.clear().await.is_err());
    assert_eq!(history.sessions().len(), 2);

    Ok(())
}

#[tokio::test]
async fn test_clear_history_only_touches_owner() -> Result<()> {
    let store = Arc::new(InMemoryMessageStore::new());
    seeded(store.as_ref()).await?;
    let mut history = ChatHistory::open(store.clone(), "patient-1", default_session_gap()).await?;

    let deleted = history.clear().await?;

    assert_eq!(deleted, 4);
    assert!(history.sessions().is_empty());
    assert_eq!(history.stats().conversations, 0);
    assert_eq!(store.len().await, 1, "other users keep their history");

    Ok(())
}

#[tokio::test]
async fn test_refresh_failure_is_surfaced() {
    let store = Arc::new(FlakyStore::default());
    store.fail_select.store(true, Ordering::SeqCst);

    let result = ChatHistory::open(store, "patient-1", default_session_gap()).await;

    assert!(matches!(result, Err(HistoryError::Persistence(_))));
}

// ============================================================================
// Conversations
// ============================================================================

#[tokio::test]
async fn test_conversation_persists_both_sides() -> Result<()> {
    let store: Arc<dyn MessageStore> = Arc::new(InMemoryMessageStore::new());
    let mut conversation = Conversation::start(store.clone(), "patient-1");
    let key = conversation.session_key().to_string();
    assert!(key.starts_with("session-"));

    let reply = conversation.send("  dry cough  ", &KeywordReplyClient).await?;

    assert_eq!(reply.text, GENERAL_PRACTICE_REPLY);
    assert_eq!(conversation.messages().len(), 2);
    assert_eq!(conversation.messages()[0].text, "dry cough");

    let stored = store
        .select(&MessageFilter::SessionKey(key.clone()), SortOrder::Ascending)
        .await?;
    assert_eq!(stored.len(), 2);

    // The history view resumes with the same key
    let history = ChatHistory::open(store.clone(), "patient-1", default_session_gap()).await?;
    assert_eq!(history.sessions()[0].resume_key(), key);

    let resumed = Conversation::from_session(store, &history.sessions()[0]).expect("non-empty session");
    assert_eq!(resumed.session_key(), key);
    assert_eq!(resumed.messages().len(), 2);

    Ok(())
}

#[tokio::test]
async fn test_resume_loads_stored_messages() -> Result<()> {
    let store: Arc<dyn MessageStore> = Arc::new(InMemoryMessageStore::new());
    let mut conversation = Conversation::start(store.clone(), "patient-1");
    conversation.send("hello", &KeywordReplyClient).await?;
    let key = conversation.session_key().to_string();

    let mut resumed = Conversation::resume(store.clone(), "patient-1", &key).await;
    assert_eq!(resumed.session_key(), key);
    assert_eq!(resumed.messages().len(), 2);

    resumed.send("chest pain", &KeywordReplyClient).await?;
    assert_eq!(resumed.messages().len(), 4);

    // Another user cannot read this conversation
    let foreign = Conversation::resume(store, "patient-2", &key).await;
    assert!(foreign.messages().is_empty());

    Ok(())
}

#[tokio::test]
async fn test_resume_falls_back_to_new_conversation() {
    let store = Arc::new(FlakyStore::default());
    store.fail_select.store(true, Ordering::SeqCst);

    let conversation = Conversation::resume(store, "patient-1", "session-old").await;

    assert_ne!(conversation.session_key(), "session-old");
    assert!(conversation.messages().is_empty());
}

#[tokio::test]
async fn test_reply_failure_stores_fallback() -> Result<()> {
    let store: Arc<dyn MessageStore> = Arc::new(InMemoryMessageStore::new());
    let mut conversation = Conversation::start(store.clone(), "patient-1");

    let reply = conversation.send("fever", &FailingReply).await?;

    assert_eq!(reply.text, FALLBACK_REPLY);
    let stored = store
        .select(&MessageFilter::Owner("patient-1".to_string()), SortOrder::Ascending)
        .await?;
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[1].text, FALLBACK_REPLY);

    Ok(())
}

#[tokio::test]
async fn test_store_failure_yields_local_error_message() -> Result<()> {
    let store = Arc::new(FlakyStore::default());
    store.fail_insert.store(true, Ordering::SeqCst);
    let mut conversation = Conversation::start(store.clone(), "patient-1");

    let reply = conversation.send("rash", &KeywordReplyClient).await?;

    assert_eq!(reply.text, SEND_FAILED_REPLY);
    assert_eq!(reply.id, UNSAVED_MESSAGE_ID);
    assert_eq!(conversation.messages().len(), 1);
    assert!(store.inner.is_empty().await);

    Ok(())
}

#[tokio::test]
async fn test_failed_turn_notice_never_reuses_store_id() -> Result<()> {
    let store = Arc::new(FlakyStore::default());
    let mut conversation = Conversation::start(store.clone(), "patient-1");
    conversation.send("hello", &KeywordReplyClient).await?;

    store.fail_insert.store(true, Ordering::SeqCst);
    let notice = conversation.send("rash", &KeywordReplyClient).await?;
    assert_eq!(notice.id, UNSAVED_MESSAGE_ID);

    store.fail_insert.store(false, Ordering::SeqCst);
    conversation.send("still itchy", &KeywordReplyClient).await?;

    let stored = store
        .select(&MessageFilter::Owner("patient-1".to_string()), SortOrder::Ascending)
        .await?;
    assert_eq!(stored.len(), 4);
    assert!(stored.iter().all(|m| m.id != notice.id));

    Ok(())
}

#[tokio::test]
async fn test_blank_message_rejected() {
    let store: Arc<dyn MessageStore> = Arc::new(InMemoryMessageStore::new());
    let mut conversation = Conversation::start(store, "patient-1");

    let err = conversation.send("   ", &KeywordReplyClient).await.unwrap_err();

    assert_eq!(err, HistoryError::EmptyMessage);
    assert!(conversation.messages().is_empty());
}
