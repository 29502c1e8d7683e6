//! Context snapshot: a compact, bounded view of the user's documents and jobs.
//!
//! Rebuilt on every turn from whatever the document store and job tracker hand
//! over. Pure: the records are only read, missing fields fall back to
//! placeholders, nothing here can fail.

use std::cmp::Reverse;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::models::document::{DocumentKind, DocumentRecord};
use crate::models::job::JobRecord;

/// How many documents / jobs / titles a snapshot keeps.
pub const SNAPSHOT_LIMIT: usize = 5;

const UNTITLED_DOCUMENT: &str = "Untitled";
const UNTITLED_JOB: &str = "Role";
const UNKNOWN_COMPANY: &str = "Company";
const UNKNOWN_STATUS: &str = "unknown";

/// The user's documents and jobs for one turn, as supplied by the collaborators.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatContext {
    #[serde(default)]
    pub documents: Vec<DocumentRecord>,
    #[serde(default)]
    pub jobs: Vec<JobRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentSummary {
    pub title: String,
    pub kind: Option<DocumentKind>,
    pub is_current: bool,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobSummary {
    pub title: String,
    pub company: String,
    pub status: String,
    pub applied_at: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    pub status: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContextSnapshot {
    /// Newest-first, at most `SNAPSHOT_LIMIT`.
    pub documents: Vec<DocumentSummary>,
    /// Newest-first, at most `SNAPSHOT_LIMIT`.
    pub jobs: Vec<JobSummary>,
    pub resume_titles: Vec<String>,
    pub cover_letter_titles: Vec<String>,
    pub resume_count: usize,
    pub cover_letter_count: usize,
    /// All documents, including kinds that are neither résumé nor cover letter.
    pub document_count: usize,
    pub job_count: usize,
    /// Jobs grouped by status, in first-seen order.
    pub status_tally: Vec<StatusCount>,
}

impl ContextSnapshot {
    pub fn build(documents: &[DocumentRecord], jobs: &[JobRecord]) -> Self {
        let documents = newest_first(documents, |d| d.created_at);
        let jobs = newest_first(jobs, |j| j.created_at);

        let mut snapshot = ContextSnapshot {
            document_count: documents.len(),
            job_count: jobs.len(),
            ..Default::default()
        };

        for doc in &documents {
            let title = non_blank(doc.title.as_deref()).unwrap_or(UNTITLED_DOCUMENT);
            match doc.document_kind() {
                Some(DocumentKind::Resume) => {
                    snapshot.resume_count += 1;
                    if snapshot.resume_titles.len() < SNAPSHOT_LIMIT {
                        snapshot.resume_titles.push(title.to_string());
                    }
                }
                Some(DocumentKind::CoverLetter) => {
                    snapshot.cover_letter_count += 1;
                    if snapshot.cover_letter_titles.len() < SNAPSHOT_LIMIT {
                        snapshot.cover_letter_titles.push(title.to_string());
                    }
                }
                None => {}
            }
        }

        snapshot.documents = documents
            .iter()
            .take(SNAPSHOT_LIMIT)
            .map(|doc| DocumentSummary {
                title: non_blank(doc.title.as_deref())
                    .unwrap_or(UNTITLED_DOCUMENT)
                    .to_string(),
                kind: doc.document_kind(),
                is_current: doc.is_current.unwrap_or(false),
                created_at: doc.created_at,
            })
            .collect();

        for job in &jobs {
            let status = job_status(job);
            match snapshot.status_tally.iter_mut().find(|s| s.status == status) {
                Some(existing) => existing.count += 1,
                None => snapshot.status_tally.push(StatusCount {
                    status: status.to_string(),
                    count: 1,
                }),
            }
        }

        snapshot.jobs = jobs
            .iter()
            .take(SNAPSHOT_LIMIT)
            .map(|job| JobSummary {
                title: non_blank(job.title.as_deref())
                    .unwrap_or(UNTITLED_JOB)
                    .to_string(),
                company: non_blank(job.company.as_deref())
                    .unwrap_or(UNKNOWN_COMPANY)
                    .to_string(),
                status: job_status(job).to_string(),
                applied_at: job.applied_date,
            })
            .collect();

        snapshot
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty() && self.jobs.is_empty()
    }

    pub fn has_resumes(&self) -> bool {
        self.resume_count > 0
    }

    pub fn has_jobs(&self) -> bool {
        self.job_count > 0
    }

    pub fn other_document_count(&self) -> usize {
        self.document_count - self.resume_count - self.cover_letter_count
    }

    /// The current résumé, if one is flagged among the kept documents.
    pub fn current_resume(&self) -> Option<&str> {
        self.documents
            .iter()
            .find(|d| d.is_current && d.kind == Some(DocumentKind::Resume))
            .map(|d| d.title.as_str())
    }

    /// Distinct company names among the kept jobs, in order.
    pub fn companies(&self) -> Vec<&str> {
        let mut companies: Vec<&str> = Vec::new();
        for job in &self.jobs {
            if !companies.contains(&job.company.as_str()) {
                companies.push(&job.company);
            }
        }
        companies
    }

    pub fn status_count(&self, status: &str) -> usize {
        self.status_tally
            .iter()
            .find(|s| s.status.eq_ignore_ascii_case(status))
            .map(|s| s.count)
            .unwrap_or(0)
    }

    /// Numbered document lines for prompts, e.g. `#1 Backend CV [resume] (current)`.
    pub fn document_lines(&self) -> Vec<String> {
        self.documents
            .iter()
            .enumerate()
            .map(|(i, d)| {
                format!(
                    "#{} {} [{}]{}",
                    i + 1,
                    d.title,
                    d.kind.map(|k| k.as_str()).unwrap_or("document"),
                    if d.is_current { " (current)" } else { "" }
                )
            })
            .collect()
    }

    /// Numbered job lines for prompts, e.g. `#1 SRE at Acme (status: applied)`.
    pub fn job_lines(&self) -> Vec<String> {
        self.jobs
            .iter()
            .enumerate()
            .map(|(i, j)| {
                let applied = j
                    .applied_at
                    .map(|d| format!(", applied {d}"))
                    .unwrap_or_default();
                format!(
                    "#{} {} at {} (status: {}{})",
                    i + 1,
                    j.title,
                    j.company,
                    j.status,
                    applied
                )
            })
            .collect()
    }
}

/// Stable newest-first ordering; undated records keep their relative order
/// after the dated ones.
fn newest_first<T, F>(records: &[T], created_at: F) -> Vec<&T>
where
    F: Fn(&T) -> Option<DateTime<Utc>>,
{
    let mut ordered: Vec<&T> = records.iter().collect();
    ordered.sort_by_key(|r| match created_at(r) {
        Some(ts) => (0, Reverse(ts)),
        None => (1, Reverse(DateTime::<Utc>::MIN_UTC)),
    });
    ordered
}

fn job_status(job: &JobRecord) -> &str {
    non_blank(job.status.as_deref()).unwrap_or(UNKNOWN_STATUS)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::TimeZone;

    pub(crate) fn doc(title: &str, kind: &str, day: u32) -> DocumentRecord {
        DocumentRecord {
            title: Some(title.to_string()),
            kind: Some(kind.to_string()),
            is_current: Some(false),
            created_at: Some(Utc.with_ymd_and_hms(2024, 1, day, 9, 0, 0).unwrap()),
        }
    }

    pub(crate) fn job(title: &str, company: &str, status: &str, day: u32) -> JobRecord {
        JobRecord {
            title: Some(title.to_string()),
            company: Some(company.to_string()),
            status: Some(status.to_string()),
            applied_date: None,
            created_at: Some(Utc.with_ymd_and_hms(2024, 2, day, 9, 0, 0).unwrap()),
        }
    }

    #[test]
    fn test_empty_inputs_yield_empty_snapshot() {
        let snapshot = ContextSnapshot::build(&[], &[]);
        assert!(snapshot.is_empty());
        assert_eq!(snapshot, ContextSnapshot::default());
    }

    #[test]
    fn test_counts_cover_full_set_and_titles_are_truncated() {
        let documents: Vec<_> = (1..=7)
            .map(|i| doc(&format!("Resume {i}"), "resume", i))
            .chain([doc("Letter", "cover-letter", 20), doc("Notes", "other", 21)])
            .collect();
        let snapshot = ContextSnapshot::build(&documents, &[]);

        assert_eq!(snapshot.resume_count, 7);
        assert_eq!(snapshot.cover_letter_count, 1);
        assert_eq!(snapshot.document_count, 9);
        assert_eq!(snapshot.other_document_count(), 1);
        assert_eq!(snapshot.resume_titles.len(), SNAPSHOT_LIMIT);
        assert_eq!(snapshot.documents.len(), SNAPSHOT_LIMIT);
        // newest first
        assert_eq!(snapshot.documents[0].title, "Notes");
        assert_eq!(snapshot.documents[0].kind, None);
        assert_eq!(snapshot.resume_titles[0], "Resume 7");
    }

    #[test]
    fn test_jobs_sorted_newest_first_with_undated_last() {
        let mut undated = job("Undated", "Nowhere", "saved", 1);
        undated.created_at = None;
        let jobs = vec![
            undated,
            job("Old", "Acme", "applied", 1),
            job("New", "Globex", "interviewing", 9),
        ];
        let snapshot = ContextSnapshot::build(&[], &jobs);
        let titles: Vec<_> = snapshot.jobs.iter().map(|j| j.title.as_str()).collect();
        assert_eq!(titles, vec!["New", "Old", "Undated"]);
    }

    #[test]
    fn test_status_tally_keeps_first_seen_order() {
        let jobs = vec![
            job("A", "Acme", "interviewing", 9),
            job("B", "Acme", "applied", 8),
            job("C", "Initech", "interviewing", 7),
            job("D", "Hooli", "", 6),
        ];
        let snapshot = ContextSnapshot::build(&[], &jobs);
        let tally: Vec<_> = snapshot
            .status_tally
            .iter()
            .map(|s| (s.status.as_str(), s.count))
            .collect();
        assert_eq!(
            tally,
            vec![("interviewing", 2), ("applied", 1), ("unknown", 1)]
        );
        assert_eq!(snapshot.companies(), vec!["Acme", "Initech", "Hooli"]);
        assert_eq!(snapshot.status_count("Interviewing"), 2);
        assert_eq!(snapshot.status_count("offered"), 0);
    }

    #[test]
    fn test_missing_fields_use_placeholders() {
        let snapshot = ContextSnapshot::build(
            &[DocumentRecord::default()],
            &[JobRecord::default()],
        );
        assert_eq!(snapshot.documents[0].title, "Untitled");
        assert!(!snapshot.documents[0].is_current);
        assert_eq!(snapshot.jobs[0].title, "Role");
        assert_eq!(snapshot.jobs[0].company, "Company");
        assert_eq!(snapshot.jobs[0].status, "unknown");
        assert_eq!(snapshot.document_lines(), vec!["#1 Untitled [document]"]);
    }

    #[test]
    fn test_build_is_idempotent() {
        let documents = vec![doc("CV", "resume", 3), doc("Letter", "cover-letter", 4)];
        let jobs = vec![job("SRE", "Acme", "applied", 2)];
        assert_eq!(
            ContextSnapshot::build(&documents, &jobs),
            ContextSnapshot::build(&documents, &jobs)
        );
    }

    #[test]
    fn test_prompt_lines() {
        let mut current = doc("Backend CV", "resume", 5);
        current.is_current = Some(true);
        let mut applied = job("SRE", "Acme", "applied", 2);
        applied.applied_date = NaiveDate::from_ymd_opt(2024, 2, 3);
        let snapshot = ContextSnapshot::build(&[current], &[applied]);

        assert_eq!(
            snapshot.document_lines(),
            vec!["#1 Backend CV [resume] (current)"]
        );
        assert_eq!(
            snapshot.job_lines(),
            vec!["#1 SRE at Acme (status: applied, applied 2024-02-03)"]
        );
    }
}
