use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

use crate::api::AppState;
use crate::database::models::NewFormResponse;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::policy::{self, PolicyDenied};
use crate::types::Actor;

#[derive(Debug, Deserialize)]
pub struct SubmitResponseRequest {
    #[serde(default)]
    pub answers: Option<Value>,
    /// Answers stored only in encrypted form
    #[serde(default)]
    pub secure_answers: BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
pub struct FormResponseReceipt {
    pub id: Uuid,
    pub form_id: Uuid,
    pub secure_fields: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct FormResponseView {
    pub id: Uuid,
    pub form_id: Uuid,
    pub respondent_id: Uuid,
    pub answers: Value,
    pub secure_answers: BTreeMap<String, String>,
    pub created_at: DateTime<Utc>,
}

/// POST /api/forms/:id/responses
pub async fn response_post(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(form_id): Path<Uuid>,
    Json(request): Json<SubmitResponseRequest>,
) -> ApiResult<FormResponseReceipt> {
    let answers = match request.answers {
        None | Some(Value::Null) => Value::Object(Map::new()),
        Some(Value::Object(map)) => Value::Object(map),
        Some(_) => {
            let mut field_errors = HashMap::new();
            field_errors.insert("answers".to_string(), "must be an object".to_string());
            return Err(ApiError::validation_error("Invalid form response", Some(field_errors)));
        }
    };

    let mut secure_answers = BTreeMap::new();
    if !request.secure_answers.is_empty() {
        let codec = state.codec()?;
        for (field, plaintext) in &request.secure_answers {
            secure_answers.insert(field.clone(), codec.encrypt(plaintext)?);
        }
    }

    let record = state
        .store
        .insert_form_response(NewFormResponse {
            form_id,
            respondent_id: actor.id,
            answers,
            secure_answers,
        })
        .await?;

    tracing::info!("Form {} response {} submitted by {}", form_id, record.id, actor.id);

    Ok(ApiResponse::created(FormResponseReceipt {
        id: record.id,
        form_id: record.form_id,
        secure_fields: record.secure_answers.keys().cloned().collect(),
        created_at: record.created_at,
    }))
}

/// GET /api/form-responses/:id - secure answers come back decrypted
pub async fn response_get(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<FormResponseView> {
    let record = state
        .store
        .find_form_response(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Form response {} not found", id)))?;

    if !policy::can_read_form_response(&actor, record.respondent_id) {
        tracing::warn!("Denied {} {} form response {}", actor.role, actor.id, id);
        return Err(PolicyDenied::ResponseNotVisible.into());
    }

    let mut secure_answers = BTreeMap::new();
    if !record.secure_answers.is_empty() {
        let codec = state.codec()?;
        for (field, payload) in &record.secure_answers {
            let plaintext = codec.decrypt(payload).map_err(|e| {
                tracing::error!("Secure field '{}' of form response {} failed to decrypt", field, id);
                ApiError::from(e)
            })?;
            secure_answers.insert(field.clone(), plaintext);
        }
    }

    Ok(ApiResponse::success(FormResponseView {
        id: record.id,
        form_id: record.form_id,
        respondent_id: record.respondent_id,
        answers: record.answers,
        secure_answers,
        created_at: record.created_at,
    }))
}
