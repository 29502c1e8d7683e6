//! In-memory chat session registry.
//!
//! Each session is locked independently; the registry lock is only held long
//! enough to look an id up. Removing a session, explicitly or through the idle
//! sweep, marks it closed and wakes any turn still waiting on the gateway so
//! it can be abandoned without committing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, Notify, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::info;
use uuid::Uuid;

use crate::chat::history::ConversationState;

/// Upper bound on how often the idle sweep runs.
const MAX_SWEEP_PERIOD: Duration = Duration::from_secs(60);

pub struct Session {
    pub id: Uuid,
    pub state: Mutex<ConversationState>,
    closed: Notify,
    is_closed: AtomicBool,
    last_active: std::sync::Mutex<Instant>,
}

impl Session {
    fn new(id: Uuid) -> Self {
        Self {
            id,
            state: Mutex::new(ConversationState::new()),
            closed: Notify::new(),
            is_closed: AtomicBool::new(false),
            last_active: std::sync::Mutex::new(Instant::now()),
        }
    }

    /// Resolves once the session has been removed from the registry.
    /// Create the future before checking [`Session::is_closed`], so a close
    /// landing in between is still observed.
    pub fn closed(&self) -> tokio::sync::futures::Notified<'_> {
        self.closed.notified()
    }

    pub fn is_closed(&self) -> bool {
        self.is_closed.load(Ordering::Acquire)
    }

    fn close(&self) {
        self.is_closed.store(true, Ordering::Release);
        self.closed.notify_waiters();
    }

    fn touch(&self) {
        *self
            .last_active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Instant::now();
    }

    fn idle_for(&self) -> Duration {
        self.last_active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .elapsed()
    }
}

#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, Arc<Session>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(&self) -> Arc<Session> {
        let session = Arc::new(Session::new(Uuid::new_v4()));
        self.sessions
            .write()
            .await
            .insert(session.id, session.clone());
        session
    }

    /// Looks a session up and counts the lookup as activity.
    pub async fn get(&self, id: Uuid) -> Option<Arc<Session>> {
        let session = self.sessions.read().await.get(&id).cloned()?;
        session.touch();
        Some(session)
    }

    /// Drops the session and signals in-flight turns. Returns false for an
    /// unknown id.
    pub async fn remove(&self, id: Uuid) -> bool {
        let removed = self.sessions.write().await.remove(&id);
        match removed {
            Some(session) => {
                session.close();
                true
            }
            None => false,
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Closes every session idle for longer than `ttl`. A session with a turn
    /// in flight is never evicted. Returns how many were dropped.
    pub async fn evict_idle(&self, ttl: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| {
            let keep = session.idle_for() <= ttl || session.state.try_lock().is_err();
            if !keep {
                session.close();
            }
            keep
        });
        before - sessions.len()
    }

    /// Runs [`SessionStore::evict_idle`] on an interval until the runtime
    /// shuts down.
    pub fn spawn_idle_sweeper(&self, ttl: Duration) -> JoinHandle<()> {
        let store = self.clone();
        let period = ttl.clamp(Duration::from_secs(1), MAX_SWEEP_PERIOD);
        tokio::spawn(async move {
            let mut ticker = time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let evicted = store.evict_idle(ttl).await;
                if evicted > 0 {
                    info!("Evicted {evicted} idle chat sessions");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_get_remove() {
        let store = SessionStore::new();
        let session = store.create().await;

        let fetched = store.get(session.id).await.unwrap();
        assert_eq!(fetched.state.lock().await.history().len(), 1);
        assert_eq!(store.len().await, 1);

        assert!(store.remove(session.id).await);
        assert!(!store.remove(session.id).await);
        assert!(store.get(session.id).await.is_none());
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_sessions_are_independent() {
        let store = SessionStore::new();
        let a = store.create().await;
        let b = store.create().await;
        assert_ne!(a.id, b.id);

        let _held = a.state.lock().await;
        assert!(b.state.try_lock().is_ok());
        assert!(a.state.try_lock().is_err());
    }

    #[tokio::test]
    async fn test_remove_wakes_waiters() {
        let store = SessionStore::new();
        let session = store.create().await;
        let closed = session.closed();

        let remover = {
            let store = store.clone();
            let id = session.id;
            tokio::spawn(async move { store.remove(id).await })
        };

        tokio::time::timeout(Duration::from_secs(1), closed)
            .await
            .expect("close signal");
        assert!(remover.await.unwrap());
    }

    #[tokio::test]
    async fn test_remove_marks_session_closed() {
        let store = SessionStore::new();
        let session = store.create().await;
        assert!(!session.is_closed());
        store.remove(session.id).await;
        assert!(session.is_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_evict_idle_keeps_recently_used_sessions() {
        let store = SessionStore::new();
        let ttl = Duration::from_secs(30 * 60);
        let stale = store.create().await;
        let active = store.create().await;

        time::advance(Duration::from_secs(20 * 60)).await;
        assert!(store.get(active.id).await.is_some());
        time::advance(Duration::from_secs(15 * 60)).await;

        assert_eq!(store.evict_idle(ttl).await, 1);
        assert!(stale.is_closed());
        assert!(!active.is_closed());
        assert!(store.get(stale.id).await.is_none());
        assert!(store.get(active.id).await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_evict_idle_skips_session_mid_turn() {
        let store = SessionStore::new();
        let session = store.create().await;
        let _turn = session.state.lock().await;

        time::advance(Duration::from_secs(120)).await;
        assert_eq!(store.evict_idle(Duration::from_secs(60)).await, 0);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_evicts_abandoned_sessions() {
        let store = SessionStore::new();
        for _ in 0..50 {
            store.create().await;
        }
        let sweeper = store.spawn_idle_sweeper(Duration::from_secs(60));

        // the paused clock auto-advances through the sweeper's ticks
        time::sleep(Duration::from_secs(150)).await;
        assert_eq!(store.len().await, 0);
        sweeper.abort();
    }
}
