use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::progress::ProgressSource;

#[derive(Debug, Clone, FromRow)]
pub struct ProjectProgressRow {
    pub id: Uuid,
    pub status: String,
    pub start_date: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub progress: Option<i32>,
    pub client_email: Option<String>,
}

/// A project's progress inputs plus the client email used for access checks
#[derive(Debug, Clone)]
pub struct ProjectProgress {
    pub project_id: Uuid,
    pub client_email: Option<String>,
    pub source: ProgressSource,
}
