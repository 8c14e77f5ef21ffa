use axum::{
    extract::{Path, State},
    Extension,
};
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::api::AppState;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::policy::{self, PolicyDenied};
use crate::progress::compute_progress_now;
use crate::services::refresh_project_progress;
use crate::types::Actor;

#[derive(Debug, Serialize)]
pub struct ProgressView {
    pub project_id: Uuid,
    pub progress: u8,
}

/// GET /api/projects/:id/progress
pub async fn progress_get(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<ProgressView> {
    let project = state
        .store
        .load_project_progress(project_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Project {} not found", project_id)))?;

    if !policy::can_view_project(&actor, project.client_email.as_deref()) {
        tracing::warn!("Denied {} {} progress of project {}", actor.role, actor.id, project_id);
        return Err(PolicyDenied::ProjectNotVisible.into());
    }

    Ok(ApiResponse::success(ProgressView {
        project_id,
        progress: compute_progress_now(&project.source),
    }))
}

/// POST /api/projects/:id/progress/refresh - staff only, persists the result
pub async fn progress_refresh(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<ProgressView> {
    policy::authorize_staff_mutation(&actor)?;

    let progress = refresh_project_progress(state.store.as_ref(), project_id, Utc::now()).await?;
    tracing::info!("Project {} progress refreshed to {} by {}", project_id, progress, actor.id);

    Ok(ApiResponse::success(ProgressView { project_id, progress }))
}
