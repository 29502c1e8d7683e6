//! User-facing notices raised while a turn degrades to the local generator.

use std::sync::Mutex;

use serde::Serialize;
use tracing::warn;

use crate::chat::gateway::ChatError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Warning,
    Error,
}

/// A toast-style notice: short title plus a human-readable description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub description: String,
}

impl Notice {
    pub fn from_upstream_error(err: &ChatError) -> Self {
        let (level, description) = match err {
            ChatError::MalformedResponse(_) => (
                NoticeLevel::Warning,
                "The AI service returned an empty answer. Showing a built-in reply instead.",
            ),
            _ => (
                NoticeLevel::Error,
                "The AI service is unavailable right now. Showing a built-in reply instead.",
            ),
        };
        Notice {
            level,
            title: "AI assistant unavailable".to_string(),
            description: description.to_string(),
        }
    }
}

/// Receives notices. Transport is up to the implementor.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Logs notices and nothing else.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: Notice) {
        warn!("{}: {}", notice.title, notice.description);
    }
}

/// Collects notices for the duration of one request so they can be returned
/// alongside the reply.
#[derive(Default)]
pub struct NoticeBuffer {
    notices: Mutex<Vec<Notice>>,
}

impl NoticeBuffer {
    pub fn into_notices(self) -> Vec<Notice> {
        self.notices
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Notifier for NoticeBuffer {
    fn notify(&self, notice: Notice) {
        LogNotifier.notify(notice.clone());
        self.notices
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(notice);
    }
}
