mod chat;
mod config;
mod db;
mod errors;
mod llm_client;
mod models;
mod routes;
mod state;
mod store;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::chat::gateway::RemoteCompletionGateway;
use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Career Assistant API v{}", env!("CARGO_PKG_VERSION"));

    // PostgreSQL is optional: it only backs context lookups by user_id
    let db = match &config.database_url {
        Some(url) => Some(create_pool(url).await?),
        None => {
            info!("DATABASE_URL not set, context must be sent with each request");
            None
        }
    };

    // Initialize LLM client
    let llm = LlmClient::new(
        config.google_api_key.clone(),
        config.llm_api_base.clone(),
        Duration::from_secs(config.llm_timeout_secs),
    );
    if llm.has_credential() {
        info!("LLM client initialized (model: {})", llm_client::MODEL);
    } else {
        warn!("GOOGLE_API_KEY not set, all replies will come from templates");
    }
    let gateway = Arc::new(RemoteCompletionGateway::new(llm));

    let state = AppState::new(config.clone(), db, gateway);
    let _sweeper = state.spawn_session_sweeper();
    info!(
        "Idle chat sessions expire after {}s",
        config.session_idle_ttl_secs
    );

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins to the web app's host

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
