use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::chat::assistant::ReplySource;
use crate::chat::gateway::ChatError;
use crate::chat::history::{Message, HISTORY_WINDOW};
use crate::chat::intent::Topic;
use crate::chat::notify::{Notice, NoticeBuffer};
use crate::chat::quick_actions::{self, QuickAction, QUICK_ACTIONS};
use crate::chat::sessions::Session;
use crate::chat::snapshot::{ChatContext, ContextSnapshot};
use crate::errors::AppError;
use crate::state::AppState;
use crate::store::load_context;

/// Where a request's documents and jobs come from. An explicit `context`
/// wins over a `user_id` lookup.
#[derive(Debug, Default, Deserialize)]
pub struct ContextRequest {
    #[serde(default)]
    pub context: Option<ChatContext>,
    #[serde(default)]
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub utterance: String,
    #[serde(default)]
    pub context: Option<ChatContext>,
    #[serde(default)]
    pub user_id: Option<Uuid>,
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub session_id: Uuid,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub announcement: Option<Message>,
}

#[derive(Serialize)]
pub struct TurnResponse {
    pub reply: Message,
    pub topic: Topic,
    pub source: ReplySource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub announcement: Option<Message>,
    pub notices: Vec<Notice>,
}

#[derive(Serialize)]
pub struct RefreshResponse {
    pub announcement: Option<Message>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
    /// Accepted for compatibility and dropped: the preamble is server-owned.
    System,
}

#[derive(Debug, Deserialize)]
pub struct ChatLine {
    pub role: ChatRole,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct StatelessChatRequest {
    pub messages: Vec<ChatLine>,
    #[serde(default)]
    pub context: ChatContext,
}

#[derive(Serialize)]
pub struct StatelessChatResponse {
    pub reply: String,
}

/// POST /api/v1/chat/sessions
pub async fn handle_create_session(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<SessionResponse>), AppError> {
    let req: ContextRequest = optional_json(&body)?;
    let context = resolve_context(&state, req.context, req.user_id).await?;

    let session = state.sessions.create().await;
    let mut conversation = session.state.lock().await;
    let announcement = state.assistant.refresh_context(&mut conversation, &context);
    info!(
        "Chat session {} started ({} active)",
        session.id,
        state.sessions.len().await
    );

    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            session_id: session.id,
            messages: conversation.history().messages().to_vec(),
            announcement,
        }),
    ))
}

/// GET /api/v1/chat/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionResponse>, AppError> {
    let session = find_session(&state, id).await?;
    let conversation = session.state.lock().await;
    Ok(Json(SessionResponse {
        session_id: id,
        messages: conversation.history().messages().to_vec(),
        announcement: None,
    }))
}

/// DELETE /api/v1/chat/sessions/:id
pub async fn handle_end_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if !state.sessions.remove(id).await {
        return Err(AppError::NotFound(format!("Session {id} not found")));
    }
    info!("Chat session {id} ended");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/chat/sessions/:id/messages
pub async fn handle_send_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<SendMessageRequest>,
) -> Result<Json<TurnResponse>, AppError> {
    let session = find_session(&state, id).await?;
    let context = resolve_context(&state, req.context, req.user_id).await?;
    Ok(Json(run_turn(&state, &session, &req.utterance, &context).await?))
}

/// POST /api/v1/chat/sessions/:id/context
pub async fn handle_refresh_context(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ContextRequest>,
) -> Result<Json<RefreshResponse>, AppError> {
    let session = find_session(&state, id).await?;
    let context = resolve_context(&state, req.context, req.user_id).await?;
    let mut conversation = session.state.lock().await;
    ensure_open(&session)?;
    let announcement = state.assistant.refresh_context(&mut conversation, &context);
    Ok(Json(RefreshResponse { announcement }))
}

/// GET /api/v1/chat/quick-actions
pub async fn handle_list_quick_actions() -> Json<&'static [QuickAction]> {
    Json(QUICK_ACTIONS)
}

/// POST /api/v1/chat/sessions/:id/quick-actions/:action
pub async fn handle_quick_action(
    State(state): State<AppState>,
    Path((id, action)): Path<(Uuid, String)>,
    body: Bytes,
) -> Result<Json<TurnResponse>, AppError> {
    let action = quick_actions::find(&action)
        .ok_or_else(|| AppError::NotFound(format!("Quick action {action} not found")))?;
    let session = find_session(&state, id).await?;
    let req: ContextRequest = optional_json(&body)?;
    let context = resolve_context(&state, req.context, req.user_id).await?;
    Ok(Json(run_turn(&state, &session, action.prompt, &context).await?))
}

/// POST /api/v1/ai-chat
///
/// Stateless: the caller owns the transcript. No template fallback here, a
/// gateway failure is the caller's to handle. `system` lines are dropped.
pub async fn handle_stateless_chat(
    State(state): State<AppState>,
    Json(req): Json<StatelessChatRequest>,
) -> Result<Json<StatelessChatResponse>, AppError> {
    let lines: Vec<&ChatLine> = req
        .messages
        .iter()
        .filter(|line| line.role != ChatRole::System)
        .collect();
    let has_utterance = lines
        .last()
        .is_some_and(|line| !line.content.trim().is_empty());
    if !has_utterance {
        return Err(ChatError::EmptyInput.into());
    }

    let start = lines.len().saturating_sub(HISTORY_WINDOW);
    let transcript: Vec<Message> = lines[start..]
        .iter()
        .filter_map(|line| match line.role {
            ChatRole::User => Some(Message::user(line.content.trim())),
            ChatRole::Assistant => Some(Message::assistant(line.content.trim(), None)),
            ChatRole::System => None,
        })
        .collect();
    let snapshot = ContextSnapshot::build(&req.context.documents, &req.context.jobs);

    let reply = state.gateway.complete(&transcript, &snapshot).await?;
    Ok(Json(StatelessChatResponse { reply }))
}

async fn find_session(state: &AppState, id: Uuid) -> Result<std::sync::Arc<Session>, AppError> {
    state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))
}

/// An absent body means "no context"; a body that is present must parse.
fn optional_json<T: DeserializeOwned + Default>(body: &[u8]) -> Result<T, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| AppError::Validation(format!("Invalid request body: {e}")))
}

fn ensure_open(session: &Session) -> Result<(), AppError> {
    if session.is_closed() {
        return Err(AppError::NotFound(format!("Session {} was closed", session.id)));
    }
    Ok(())
}

async fn resolve_context(
    state: &AppState,
    context: Option<ChatContext>,
    user_id: Option<Uuid>,
) -> Result<ChatContext, AppError> {
    if let Some(context) = context {
        return Ok(context);
    }
    match (user_id, &state.db) {
        (Some(user_id), Some(pool)) => Ok(load_context(pool, user_id).await?),
        _ => Ok(ChatContext::default()),
    }
}

/// One turn against a session. A second turn while one is in flight is a
/// conflict; closing the session abandons the turn without committing.
async fn run_turn(
    state: &AppState,
    session: &Session,
    utterance: &str,
    context: &ChatContext,
) -> Result<TurnResponse, AppError> {
    let closed = session.closed();
    let mut conversation = session.state.try_lock().map_err(|_| {
        AppError::Conflict(format!("Session {} is already answering a message", session.id))
    })?;
    // a close before `closed` was created is only visible through the flag
    ensure_open(session)?;

    let notices = NoticeBuffer::default();
    let mut rng = StdRng::from_entropy();
    let turn = state
        .assistant
        .converse(&mut conversation, utterance, context, &notices, &mut rng);

    let reply = tokio::select! {
        reply = turn => reply?,
        _ = closed => {
            info!("Session {} closed mid-turn, reply discarded", session.id);
            return Err(AppError::NotFound(format!("Session {} was closed", session.id)));
        }
    };

    Ok(TurnResponse {
        reply: reply.message,
        topic: reply.topic,
        source: reply.source,
        announcement: reply.announcement,
        notices: notices.into_notices(),
    })
}
