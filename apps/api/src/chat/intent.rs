//! Intent classification by keyword precedence.
//!
//! Checks run in a fixed order and the first hit wins, so a compound utterance
//! such as "resume for this job posting" is a `Resume` question.

use serde::{Deserialize, Serialize};

use crate::chat::snapshot::ContextSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    Resume,
    Job,
    Interview,
    Analysis,
    General,
}

impl Topic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::Resume => "resume",
            Topic::Job => "job",
            Topic::Interview => "interview",
            Topic::Analysis => "analysis",
            Topic::General => "general",
        }
    }
}

/// Keyword table in precedence order.
const KEYWORD_TABLE: &[(Topic, &[&str])] = &[
    (Topic::Resume, &["resume", "cv"]),
    (Topic::Job, &["job", "match", "posting"]),
    (Topic::Interview, &["interview", "prep"]),
];

/// Maps an utterance to a topic. Callers reject blank input beforehand.
pub fn classify(utterance: &str) -> Topic {
    let lower = utterance.to_lowercase();
    KEYWORD_TABLE
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(topic, _)| *topic)
        .unwrap_or(Topic::General)
}

/// Like [`classify`], but a general question becomes `Analysis` once the user
/// has both a résumé and a tracked job to compare.
pub fn classify_with_context(utterance: &str, snapshot: &ContextSnapshot) -> Topic {
    match classify(utterance) {
        Topic::General if snapshot.has_resumes() && snapshot.has_jobs() => Topic::Analysis,
        topic => topic,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::snapshot::tests::{doc, job};

    #[test]
    fn test_keyword_topics() {
        assert_eq!(classify("Can you review my resume?"), Topic::Resume);
        assert_eq!(classify("Is my CV too long"), Topic::Resume);
        assert_eq!(classify("Find me a JOB"), Topic::Job);
        assert_eq!(classify("How well do I match this?"), Topic::Job);
        assert_eq!(classify("saw a new posting today"), Topic::Job);
        assert_eq!(classify("Interview tomorrow!"), Topic::Interview);
        assert_eq!(classify("help me prepare"), Topic::Interview);
        assert_eq!(classify("What should I do next?"), Topic::General);
    }

    #[test]
    fn test_precedence_is_resume_then_job_then_interview() {
        assert_eq!(classify("resume for this job posting"), Topic::Resume);
        assert_eq!(classify("interview for this job"), Topic::Job);
        assert_eq!(classify("interview about my cv"), Topic::Resume);
    }

    #[test]
    fn test_classify_is_deterministic() {
        for utterance in ["hello", "resume", "job interview", "salary tips"] {
            assert_eq!(classify(utterance), classify(utterance));
        }
    }

    #[test]
    fn test_general_upgrades_to_analysis_with_resume_and_job() {
        let both = ContextSnapshot::build(
            &[doc("CV", "resume", 1)],
            &[job("SRE", "Acme", "applied", 1)],
        );
        let resume_only = ContextSnapshot::build(&[doc("CV", "resume", 1)], &[]);

        assert_eq!(classify_with_context("any advice?", &both), Topic::Analysis);
        assert_eq!(classify_with_context("any advice?", &resume_only), Topic::General);
        // keyword hits are never upgraded
        assert_eq!(classify_with_context("check my resume", &both), Topic::Resume);
    }
}
