use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;
use tokio::task::JoinHandle;

use crate::chat::assistant::Assistant;
use crate::chat::gateway::CompletionGateway;
use crate::chat::sessions::SessionStore;
use crate::config::Config;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Absent when `DATABASE_URL` is unset; context then comes from requests only.
    pub db: Option<PgPool>,
    pub config: Config,
    /// Pluggable reply source. Default: RemoteCompletionGateway over Gemini.
    pub gateway: Arc<dyn CompletionGateway>,
    pub assistant: Arc<Assistant>,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(config: Config, db: Option<PgPool>, gateway: Arc<dyn CompletionGateway>) -> Self {
        Self {
            db,
            config,
            assistant: Arc::new(Assistant::new(gateway.clone())),
            gateway,
            sessions: SessionStore::new(),
        }
    }

    /// Starts the background eviction of idle chat sessions.
    pub fn spawn_session_sweeper(&self) -> JoinHandle<()> {
        let ttl = Duration::from_secs(self.config.session_idle_ttl_secs);
        self.sessions.spawn_idle_sweeper(ttl)
    }
}
