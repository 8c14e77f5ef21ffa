use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::Utc;
use uuid::Uuid;

use crate::api::AppState;
use crate::database::models::{ActionItem, ActionItemPatch};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::policy::{self, PolicyDenied};
use crate::services::refresh_project_progress;
use crate::types::Actor;

fn deny(actor: &Actor, item_id: Uuid, reason: PolicyDenied) -> ApiError {
    tracing::warn!(
        "Denied {} {} on action item {}: {}",
        actor.role,
        actor.id,
        item_id,
        reason
    );
    reason.into()
}

async fn load_item(state: &AppState, id: Uuid) -> Result<ActionItem, ApiError> {
    state
        .store
        .find_action_item(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Action item {} not found", id)))
}

async fn refresh_progress_after_change(state: &AppState, project_id: Uuid) {
    if let Err(e) = refresh_project_progress(state.store.as_ref(), project_id, Utc::now()).await {
        tracing::warn!("Failed to refresh progress for project {}: {}", project_id, e);
    }
}

/// GET /api/projects/:id/action-items - items of a project the caller may see
pub async fn list_for_project(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Vec<ActionItem>> {
    let items = state.store.list_action_items(project_id).await?;
    Ok(ApiResponse::success(policy::visible_items(&actor, items)))
}

/// GET /api/action-items/:id
pub async fn show(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<ActionItem> {
    let item = load_item(&state, id).await?;
    policy::authorize_view(&actor, &item).map_err(|reason| deny(&actor, id, reason))?;
    Ok(ApiResponse::success(item))
}

/// PATCH /api/action-items/:id - staff edit
pub async fn update(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(patch): Json<ActionItemPatch>,
) -> ApiResult<ActionItem> {
    policy::authorize_staff_mutation(&actor).map_err(|reason| deny(&actor, id, reason))?;

    if patch.is_empty() {
        return Err(ApiError::bad_request("No fields to update"));
    }

    let item = state.store.update_action_item(id, &patch, Utc::now()).await?;
    tracing::info!("Action item {} updated by {}", id, actor.id);

    if patch.status.is_some() {
        refresh_progress_after_change(&state, item.project_id).await;
    }

    Ok(ApiResponse::success(item))
}

/// POST /api/action-items/:id/complete
///
/// Staff may always complete. Clients go through the client completion rules.
/// Completing an already completed item returns it unchanged.
pub async fn complete(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<ActionItem> {
    let item = load_item(&state, id).await?;

    let decision = if actor.is_staff() {
        policy::authorize_staff_mutation(&actor)
    } else {
        policy::authorize_client_completion(&actor, &item)
    };
    decision.map_err(|reason| deny(&actor, id, reason))?;

    if item.status.is_completed() {
        return Ok(ApiResponse::success(item));
    }

    let item = state.store.complete_action_item(id, Utc::now()).await?;
    tracing::info!("Action item {} completed by {} {}", id, actor.role, actor.id);

    refresh_progress_after_change(&state, item.project_id).await;

    Ok(ApiResponse::success(item))
}
