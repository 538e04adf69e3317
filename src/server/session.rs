//! Conversation sessions owned by the HTTP layer
//!
//! A session lives from its first message until the turn that completes the
//! profile, an explicit delete, or `idle_ttl` without messages. The store
//! also holds at most `max_sessions`; opening one more evicts the session
//! touched least recently.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tracing::debug;

use augur_engine::{Conversation, ConversationStep, Turn};

pub const DEFAULT_IDLE_TTL: Duration = Duration::from_secs(30 * 60);
pub const DEFAULT_MAX_SESSIONS: usize = 10_000;

#[derive(Debug)]
struct Entry {
    conversation: Conversation,
    touched: Instant,
    /// Monotonic touch order, used for eviction
    seq: u64,
}

#[derive(Debug, Default)]
struct Sessions {
    entries: HashMap<String, Entry>,
    next_seq: u64,
}

impl Sessions {
    fn sweep_expired(&mut self, now: Instant, idle_ttl: Duration) {
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| now.saturating_duration_since(entry.touched) < idle_ttl);
        let expired = before - self.entries.len();
        if expired > 0 {
            debug!(expired, "Idle sessions dropped");
        }
    }

    fn evict_to(&mut self, capacity: usize) {
        while self.entries.len() >= capacity {
            let Some(oldest) = self
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.seq)
                .map(|(id, _)| id.clone())
            else {
                break;
            };
            self.entries.remove(&oldest);
            debug!(session_id = %oldest, "Session evicted");
        }
    }
}

/// Session id to conversation map, shared by every request handler.
///
/// The lock is held only while a message is applied; predictions run after
/// it is released.
#[derive(Debug, Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<Sessions>>,
    idle_ttl: Duration,
    max_sessions: usize,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_limits(DEFAULT_IDLE_TTL, DEFAULT_MAX_SESSIONS)
    }
}

impl SessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_limits(idle_ttl: Duration, max_sessions: usize) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(Sessions::default())),
            idle_ttl,
            max_sessions: max_sessions.max(1),
        }
    }

    /// Apply one message, creating the session on first contact.
    ///
    /// The session is dropped on the turn that completes the profile; the
    /// returned step is still `Complete`.
    pub async fn advance(&self, session_id: &str, message: &str) -> (Turn, ConversationStep) {
        let mut guard = self.sessions.write().await;
        let sessions = &mut *guard;
        let now = Instant::now();

        let expired = sessions
            .entries
            .get(session_id)
            .is_some_and(|entry| now.saturating_duration_since(entry.touched) >= self.idle_ttl);
        if expired {
            sessions.entries.remove(session_id);
        }
        if !sessions.entries.contains_key(session_id) {
            sessions.sweep_expired(now, self.idle_ttl);
            sessions.evict_to(self.max_sessions);
        }

        let seq = sessions.next_seq;
        sessions.next_seq += 1;
        let entry = sessions
            .entries
            .entry(session_id.to_string())
            .or_insert_with(|| Entry {
                conversation: Conversation::new(),
                touched: now,
                seq,
            });
        entry.touched = now;
        entry.seq = seq;

        let turn = entry.conversation.advance(message);
        let step = entry.conversation.step();
        if turn.is_complete() {
            sessions.entries.remove(session_id);
        }
        (turn, step)
    }

    /// Forget a session. Returns whether it existed.
    pub async fn remove(&self, session_id: &str) -> bool {
        self.sessions.write().await.entries.remove(session_id).is_some()
    }

    pub async fn step(&self, session_id: &str) -> Option<ConversationStep> {
        self.sessions
            .read()
            .await
            .entries
            .get(session_id)
            .map(|entry| entry.conversation.step())
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CAREER_FLOW: [&str; 5] = ["hi", "Anna", "15.03.1990", "career", "Should I change jobs?"];

    #[tokio::test]
    async fn test_sessions_are_independent() {
        let store = SessionStore::new();
        store.advance("a", "hi").await;
        store.advance("a", "Anna").await;
        store.advance("b", "hi").await;

        assert_eq!(store.step("a").await, Some(ConversationStep::BirthDate));
        assert_eq!(store.step("b").await, Some(ConversationStep::Name));
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_remove_forgets_session() {
        let store = SessionStore::new();
        store.advance("a", "hi").await;
        assert!(store.remove("a").await);
        assert!(!store.remove("a").await);
        assert!(store.is_empty().await);
        assert_eq!(store.step("a").await, None);
    }

    #[tokio::test]
    async fn test_clones_share_sessions() {
        let store = SessionStore::new();
        let clone = store.clone();
        clone.advance("shared", "hi").await;
        assert_eq!(store.step("shared").await, Some(ConversationStep::Name));
    }

    #[tokio::test]
    async fn test_completed_session_is_dropped() {
        let store = SessionStore::new();
        let mut last = None;
        for message in CAREER_FLOW {
            last = Some(store.advance("s1", message).await);
        }
        let (turn, step) = last.unwrap();

        assert!(turn.is_complete());
        assert_eq!(step, ConversationStep::Complete);
        assert_eq!(store.step("s1").await, None);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_store_is_bounded() {
        let store = SessionStore::with_limits(DEFAULT_IDLE_TTL, 3);
        store.advance("a", "hi").await;
        store.advance("b", "hi").await;
        store.advance("c", "hi").await;
        // Touching "a" makes "b" the least recently used.
        store.advance("a", "Anna").await;

        for i in 0..100 {
            store.advance(&format!("junk-{i}"), "hi").await;
        }
        assert_eq!(store.len().await, 3);

        let store = SessionStore::with_limits(DEFAULT_IDLE_TTL, 3);
        store.advance("a", "hi").await;
        store.advance("b", "hi").await;
        store.advance("c", "hi").await;
        store.advance("a", "Anna").await;
        store.advance("d", "hi").await;
        assert_eq!(store.step("a").await, Some(ConversationStep::BirthDate));
        assert_eq!(store.step("b").await, None);
        assert_eq!(store.step("d").await, Some(ConversationStep::Name));
    }

    #[tokio::test]
    async fn test_idle_sessions_expire() {
        let store = SessionStore::with_limits(Duration::ZERO, DEFAULT_MAX_SESSIONS);
        store.advance("a", "hi").await;
        store.advance("b", "hi").await;
        assert_eq!(store.step("a").await, None);
        assert_eq!(store.len().await, 1);

        // An expired session starts over instead of resuming.
        let (turn, step) = store.advance("b", "Anna").await;
        assert!(turn.reply.contains("What is your name?"));
        assert_eq!(step, ConversationStep::Name);
    }
}
