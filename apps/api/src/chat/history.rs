//! Conversation history: the ordered transcript of one chat session.
//!
//! History is append-only and never truncated; only the window handed to the
//! completion gateway is bounded. The context-announcement guard lives here as
//! a single flag so nobody has to scan message text to find out whether the
//! user was already told we can see their data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::chat::intent::Topic;
use crate::chat::snapshot::ContextSnapshot;
use crate::chat::templates::context_announcement;

/// Messages exported to the completion gateway per turn.
pub const HISTORY_WINDOW: usize = 10;

pub const WELCOME_MESSAGE: &str = "Hi! I'm your AI Career Assistant. I can help you optimize \
    your resume, analyze job descriptions, and provide personalized career advice. \
    What would you like to work on today?";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    Assistant,
}

impl Sender {
    /// Role label used in prompts.
    pub fn role(&self) -> &'static str {
        match self {
            Sender::User => "USER",
            Sender::Assistant => "ASSISTANT",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub sender: Sender,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<Topic>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Sender::User, content.into(), None)
    }

    pub fn assistant(content: impl Into<String>, topic: Option<Topic>) -> Self {
        Self::new(Sender::Assistant, content.into(), topic)
    }

    fn new(sender: Sender, content: String, topic: Option<Topic>) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender,
            content,
            timestamp: Utc::now(),
            topic,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConversationHistory {
    messages: Vec<Message>,
    context_announced: bool,
}

impl ConversationHistory {
    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// The last `n` messages, oldest first.
    pub fn window(&self, n: usize) -> &[Message] {
        let start = self.messages.len().saturating_sub(n);
        &self.messages[start..]
    }

    /// The last `n` messages of history followed by `pending`, oldest first.
    /// Used to build a transcript for a turn that has not been committed yet.
    pub fn window_with(&self, pending: &[Message], n: usize) -> Vec<Message> {
        let from_history = n.saturating_sub(pending.len());
        let pending_start = pending.len().saturating_sub(n);
        self.window(from_history)
            .iter()
            .chain(&pending[pending_start..])
            .cloned()
            .collect()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn has_announced_context(&self) -> bool {
        self.context_announced
    }

    /// Appends a context announcement and flips the guard. Callers decide
    /// whether one is due via [`ConversationState::pending_announcement`].
    fn append_announcement(&mut self, message: Message) {
        self.context_announced = true;
        self.messages.push(message);
    }
}

/// Everything a single chat session owns.
#[derive(Debug, Clone)]
pub struct ConversationState {
    history: ConversationHistory,
}

impl Default for ConversationState {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationState {
    /// Starts a session seeded with the welcome message.
    pub fn new() -> Self {
        let mut history = ConversationHistory::default();
        history.append(Message::assistant(WELCOME_MESSAGE, Some(Topic::General)));
        Self { history }
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    /// The announcement owed for this snapshot, if any: only the first time a
    /// non-empty snapshot is seen in the session. Does not mutate.
    pub fn pending_announcement(&self, snapshot: &ContextSnapshot) -> Option<Message> {
        if self.history.has_announced_context() || snapshot.is_empty() {
            return None;
        }
        Some(Message::assistant(
            context_announcement(snapshot),
            Some(Topic::General),
        ))
    }

    /// Records a data refresh outside of a turn. Returns the announcement if
    /// this refresh was the one that triggered it.
    pub fn refresh_context(&mut self, snapshot: &ContextSnapshot) -> Option<Message> {
        let announcement = self.pending_announcement(snapshot)?;
        self.history.append_announcement(announcement.clone());
        Some(announcement)
    }

    /// Commits a finished turn in order: announcement, user message, reply.
    pub(crate) fn commit_turn(
        &mut self,
        announcement: Option<Message>,
        utterance: Message,
        reply: Message,
    ) {
        if let Some(announcement) = announcement {
            if !self.history.has_announced_context() {
                self.history.append_announcement(announcement);
            }
        }
        self.history.append(utterance);
        self.history.append(reply);
    }
}
