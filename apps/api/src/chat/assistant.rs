//! Assistant: one conversational turn, remote first with a local fallback.
//!
//! Flow: validate → build snapshot → decide announcement → classify →
//!       gateway.complete() (only await point) → on error: notify + render
//!       template → commit announcement, utterance and reply to history.
//!
//! Nothing is written to the `ConversationState` before the gateway call
//! resolves, so dropping the future mid-flight leaves the session untouched.

use std::sync::Arc;

use rand::Rng;
use serde::Serialize;
use tracing::{info, warn};

use crate::chat::gateway::{ChatError, CompletionGateway};
use crate::chat::history::{ConversationState, Message, HISTORY_WINDOW};
use crate::chat::intent::{classify_with_context, Topic};
use crate::chat::notify::{Notice, Notifier};
use crate::chat::snapshot::{ChatContext, ContextSnapshot};
use crate::chat::templates::render;

/// Where a reply came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplySource {
    Remote,
    Template,
}

/// Result of a successful turn.
#[derive(Debug, Clone, Serialize)]
pub struct Reply {
    pub message: Message,
    pub topic: Topic,
    pub source: ReplySource,
    /// Set on the turn that first saw the user's data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub announcement: Option<Message>,
}

#[derive(Clone)]
pub struct Assistant {
    gateway: Arc<dyn CompletionGateway>,
}

impl Assistant {
    pub fn new(gateway: Arc<dyn CompletionGateway>) -> Self {
        Self { gateway }
    }

    /// Runs one turn. Only `EmptyInput` is ever returned as an error; gateway
    /// failures are reported through `notifier` and answered from templates.
    pub async fn converse<R: Rng + Send>(
        &self,
        state: &mut ConversationState,
        utterance: &str,
        context: &ChatContext,
        notifier: &dyn Notifier,
        rng: &mut R,
    ) -> Result<Reply, ChatError> {
        let utterance = utterance.trim();
        if utterance.is_empty() {
            return Err(ChatError::EmptyInput);
        }

        let snapshot = ContextSnapshot::build(&context.documents, &context.jobs);
        let announcement = state.pending_announcement(&snapshot);
        let user_message = Message::user(utterance);
        let topic = classify_with_context(utterance, &snapshot);

        let pending: Vec<Message> = announcement
            .iter()
            .cloned()
            .chain(std::iter::once(user_message.clone()))
            .collect();
        let transcript = state.history().window_with(&pending, HISTORY_WINDOW);

        let (content, source) = match self.gateway.complete(&transcript, &snapshot).await {
            Ok(text) => (text, ReplySource::Remote),
            Err(err) => {
                warn!("Falling back to template reply ({:?}): {err}", topic);
                notifier.notify(Notice::from_upstream_error(&err));
                (render(topic, &snapshot, rng), ReplySource::Template)
            }
        };

        let reply = Message::assistant(content, Some(topic));
        state.commit_turn(announcement.clone(), user_message, reply.clone());

        info!(
            "Turn complete: topic={}, source={:?}, history={} messages",
            topic.as_str(),
            source,
            state.history().len()
        );

        Ok(Reply {
            message: reply,
            topic,
            source,
            announcement,
        })
    }

    /// Applies a data refresh to the session outside of a turn.
    pub fn refresh_context(
        &self,
        state: &mut ConversationState,
        context: &ChatContext,
    ) -> Option<Message> {
        let snapshot = ContextSnapshot::build(&context.documents, &context.jobs);
        state.refresh_context(&snapshot)
    }
}
