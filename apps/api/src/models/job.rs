use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::lenient;

/// A tracked job application, as handed over by the job tracker.
///
/// `status` is free-form; the tracker uses saved / applied / interviewing /
/// offered / rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
pub struct JobRecord {
    #[serde(default, deserialize_with = "lenient")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub company: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub applied_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient")]
    pub created_at: Option<DateTime<Utc>>,
}
