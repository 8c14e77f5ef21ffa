use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::database::{DatabaseError, PortalStore};
use crate::progress::compute_progress;

/// Recompute a project's progress and persist it when it changed
pub async fn refresh_project_progress(
    store: &dyn PortalStore,
    project_id: Uuid,
    now: DateTime<Utc>,
) -> Result<u8, DatabaseError> {
    let project = store
        .load_project_progress(project_id)
        .await?
        .ok_or_else(|| DatabaseError::NotFound(format!("Project {} not found", project_id)))?;

    let progress = compute_progress(&project.source, now);

    if project.source.progress != Some(progress as i32) {
        store.save_project_progress(project_id, progress).await?;
        tracing::debug!("Project {} progress updated to {}", project_id, progress);
    }

    Ok(progress)
}
