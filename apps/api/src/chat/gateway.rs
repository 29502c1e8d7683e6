//! Remote completion gateway: pluggable, trait-based reply source.
//!
//! Default: `RemoteCompletionGateway`, a single attempt against the LLM client.
//! The assistant holds an `Arc<dyn CompletionGateway>` and falls back to the
//! template engine on any error, so this layer never retries.

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::chat::history::Message;
use crate::chat::snapshot::ContextSnapshot;
use crate::llm_client::prompts::{CAREER_ASSISTANT_PREAMBLE, NONE_PLACEHOLDER, RESPOND_INSTRUCTION};
use crate::llm_client::{LlmClient, LlmError};

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Message cannot be empty")]
    EmptyInput,

    #[error("Completion service unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Completion service returned no usable text: {0}")]
    MalformedResponse(String),
}

impl From<LlmError> for ChatError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Parse(_) | LlmError::EmptyContent => {
                ChatError::MalformedResponse(err.to_string())
            }
            LlmError::MissingCredential | LlmError::Http(_) | LlmError::Api { .. } => {
                ChatError::UpstreamUnavailable(err.to_string())
            }
        }
    }
}

/// Produces a reply for the windowed transcript.
///
/// Carried by the assistant as `Arc<dyn CompletionGateway>`.
#[async_trait]
pub trait CompletionGateway: Send + Sync {
    async fn complete(
        &self,
        transcript: &[Message],
        snapshot: &ContextSnapshot,
    ) -> Result<String, ChatError>;
}

pub struct RemoteCompletionGateway {
    llm: LlmClient,
}

impl RemoteCompletionGateway {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl CompletionGateway for RemoteCompletionGateway {
    async fn complete(
        &self,
        transcript: &[Message],
        snapshot: &ContextSnapshot,
    ) -> Result<String, ChatError> {
        let prompt = build_prompt(transcript, snapshot);
        debug!(
            "Requesting completion: {} transcript messages, {} prompt chars",
            transcript.len(),
            prompt.len()
        );
        Ok(self.llm.call_text(&prompt).await?)
    }
}

/// Renders the preamble, the user's context and the transcript into one prompt.
pub fn build_prompt(transcript: &[Message], snapshot: &ContextSnapshot) -> String {
    let documents = lines_or_none(snapshot.document_lines());
    let jobs = lines_or_none(snapshot.job_lines());
    let conversation = transcript
        .iter()
        .map(|m| format!("{}: {}", m.sender.role(), m.content))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "{CAREER_ASSISTANT_PREAMBLE}\n\n\
        USER CONTEXT\nDocuments:\n{documents}\n\nJobs:\n{jobs}\n\n\
        CONVERSATION\n{conversation}\n\n\
        {RESPOND_INSTRUCTION}"
    )
}

fn lines_or_none(lines: Vec<String>) -> String {
    if lines.is_empty() {
        NONE_PLACEHOLDER.to_string()
    } else {
        lines.join("\n")
    }
}
