//! In-memory conversation sessions keyed by Telegram chat id.
//!
//! [`SessionStore`] is the teloxide dialogue storage of the bot. A session
//! that has been idle for longer than the configured TTL is dropped; the
//! next update from that chat starts in [`DialogueState::Ended`].

use std::collections::HashMap;
use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use teloxide::dispatching::dialogue::Storage;
use teloxide::types::ChatId;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::dialogue::DialogueState;

#[derive(Debug)]
struct SessionEntry {
    state: DialogueState,
    last_seen: Instant,
}

#[derive(Debug)]
pub struct SessionStore {
    sessions: Mutex<HashMap<i64, SessionEntry>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Current state of a chat, `Ended` when unknown or expired
    pub async fn load(&self, chat_id: i64) -> DialogueState {
        self.load_at(chat_id, Instant::now()).await
    }

    pub async fn load_at(&self, chat_id: i64, now: Instant) -> DialogueState {
        let mut sessions = self.sessions.lock().await;
        match sessions.get(&chat_id) {
            Some(entry) if now.saturating_duration_since(entry.last_seen) > self.ttl => {
                debug!(chat_id = %chat_id, "Session expired on access");
                sessions.remove(&chat_id);
                DialogueState::Ended
            }
            Some(entry) => entry.state.clone(),
            None => DialogueState::Ended,
        }
    }

    /// Replace the state of a chat and refresh its activity timestamp
    pub async fn store(&self, chat_id: i64, state: DialogueState) {
        self.store_at(chat_id, state, Instant::now()).await
    }

    pub async fn store_at(&self, chat_id: i64, state: DialogueState, now: Instant) {
        let mut sessions = self.sessions.lock().await;
        if state.is_active() {
            sessions.insert(chat_id, SessionEntry { state, last_seen: now });
        } else {
            sessions.remove(&chat_id);
        }
    }

    /// Drop every session idle for longer than the TTL, returning how many went
    pub async fn evict_expired(&self) -> usize {
        self.evict_expired_at(Instant::now()).await
    }

    pub async fn evict_expired_at(&self, now: Instant) -> usize {
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        let ttl = self.ttl;
        sessions.retain(|_, entry| now.saturating_duration_since(entry.last_seen) <= ttl);
        before - sessions.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }

    /// Periodically evict idle sessions until the runtime shuts down
    pub fn spawn_sweeper(self: Arc<Self>, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                let evicted = self.evict_expired().await;
                if evicted > 0 {
                    info!(evicted, "Evicted idle sessions");
                }
            }
        })
    }
}

type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

impl Storage<DialogueState> for SessionStore {
    type Error = Infallible;

    fn remove_dialogue(self: Arc<Self>, chat_id: ChatId) -> BoxFuture<Result<(), Self::Error>> {
        Box::pin(async move {
            self.sessions.lock().await.remove(&chat_id.0);
            Ok(())
        })
    }

    fn update_dialogue(
        self: Arc<Self>,
        chat_id: ChatId,
        dialogue: DialogueState,
    ) -> BoxFuture<Result<(), Self::Error>> {
        Box::pin(async move {
            self.store(chat_id.0, dialogue).await;
            Ok(())
        })
    }

    /// Expired and ended sessions read as absent
    fn get_dialogue(self: Arc<Self>, chat_id: ChatId) -> BoxFuture<Result<Option<DialogueState>, Self::Error>> {
        Box::pin(async move {
            let state = self.load(chat_id.0).await;
            Ok(state.is_active().then_some(state))
        })
    }
}
