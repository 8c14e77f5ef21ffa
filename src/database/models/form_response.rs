use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use sqlx::types::Json;
use sqlx::FromRow;
use std::collections::BTreeMap;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct FormResponseRow {
    pub id: Uuid,
    pub form_id: Uuid,
    pub respondent_id: Uuid,
    pub answers: Json<Value>,
    pub secure_answers: Json<BTreeMap<String, String>>,
    pub created_at: DateTime<Utc>,
}

/// A stored response. `secure_answers` holds encrypted payloads.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormResponseRecord {
    pub id: Uuid,
    pub form_id: Uuid,
    pub respondent_id: Uuid,
    pub answers: Value,
    pub secure_answers: BTreeMap<String, String>,
    pub created_at: DateTime<Utc>,
}

impl From<FormResponseRow> for FormResponseRecord {
    fn from(row: FormResponseRow) -> Self {
        Self {
            id: row.id,
            form_id: row.form_id,
            respondent_id: row.respondent_id,
            answers: row.answers.0,
            secure_answers: row.secure_answers.0,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewFormResponse {
    pub form_id: Uuid,
    pub respondent_id: Uuid,
    pub answers: Value,
    pub secure_answers: BTreeMap<String, String>,
}
