//! Preset prompts offered next to the chat input.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuickAction {
    pub id: &'static str,
    pub label: &'static str,
    pub prompt: &'static str,
}

pub const QUICK_ACTIONS: &[QuickAction] = &[
    QuickAction {
        id: "resume-review",
        label: "Resume Review",
        prompt: "Can you review my resume and provide optimization suggestions?",
    },
    QuickAction {
        id: "job-match",
        label: "Job Match Analysis",
        prompt: "Help me analyze how well I match a job posting",
    },
    QuickAction {
        id: "interview-prep",
        label: "Interview Prep",
        prompt: "Help me prepare for upcoming job interviews",
    },
];

pub fn find(id: &str) -> Option<&'static QuickAction> {
    QUICK_ACTIONS.iter().find(|a| a.id == id)
}
