use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::lenient;

/// A stored résumé or cover letter, as handed over by the document store.
/// Every field is optional; the assistant only ever reads these.
#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
pub struct DocumentRecord {
    #[serde(default, deserialize_with = "lenient")]
    pub title: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "lenient")]
    #[sqlx(rename = "type")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub is_current: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentKind {
    Resume,
    CoverLetter,
}

impl DocumentKind {
    /// Lenient parse of the free-form `type` column. Unknown kinds are `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized: String = raw
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();

        match normalized.as_str() {
            "resume" | "cv" => Some(DocumentKind::Resume),
            "coverletter" => Some(DocumentKind::CoverLetter),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Resume => "resume",
            DocumentKind::CoverLetter => "cover-letter",
        }
    }
}

impl DocumentRecord {
    pub fn document_kind(&self) -> Option<DocumentKind> {
        self.kind.as_deref().and_then(DocumentKind::parse)
    }
}
