//! Read-only access to the document store and job tracker tables.

use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::chat::snapshot::ChatContext;
use crate::models::document::DocumentRecord;
use crate::models::job::JobRecord;

/// Loads a user's documents and jobs, newest first.
pub async fn load_context(pool: &PgPool, user_id: Uuid) -> Result<ChatContext, sqlx::Error> {
    let documents = sqlx::query_as::<_, DocumentRecord>(
        r#"
        SELECT title, type, is_current, created_at
        FROM documents
        WHERE user_id = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    let jobs = sqlx::query_as::<_, JobRecord>(
        r#"
        SELECT title, company, status, applied_date, created_at
        FROM jobs
        WHERE user_id = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    debug!(
        "Loaded context for {user_id}: {} documents, {} jobs",
        documents.len(),
        jobs.len()
    );
    Ok(ChatContext { documents, jobs })
}
