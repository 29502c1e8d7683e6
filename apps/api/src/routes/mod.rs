pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::chat::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Session chat API
        .route("/api/v1/chat/sessions", post(handlers::handle_create_session))
        .route(
            "/api/v1/chat/sessions/:id",
            get(handlers::handle_get_session).delete(handlers::handle_end_session),
        )
        .route(
            "/api/v1/chat/sessions/:id/messages",
            post(handlers::handle_send_message),
        )
        .route(
            "/api/v1/chat/sessions/:id/context",
            post(handlers::handle_refresh_context),
        )
        .route(
            "/api/v1/chat/quick-actions",
            get(handlers::handle_list_quick_actions),
        )
        .route(
            "/api/v1/chat/sessions/:id/quick-actions/:action",
            post(handlers::handle_quick_action),
        )
        // Stateless completion API
        .route("/api/v1/ai-chat", post(handlers::handle_stateless_chat))
        .with_state(state)
}
