use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::{
    ActionItem, ActionItemPatch, ActionItemRow, FormResponseRecord, FormResponseRow, NewFormResponse,
    NewUser, ProjectProgress, ProjectProgressRow, User, UserRow,
};
use crate::progress::{MilestoneState, ProgressSource};
use crate::types::{ActionItemStatus, ProjectStatus};

/// Persistence operations the route layer depends on
#[async_trait]
pub trait PortalStore: Send + Sync {
    async fn health_check(&self) -> Result<(), DatabaseError>;

    async fn count_users(&self) -> Result<i64, DatabaseError>;

    /// Insert `user` only when the users table is empty; `None` when someone got there first
    async fn insert_first_user(&self, user: NewUser) -> Result<Option<User>, DatabaseError>;

    async fn find_action_item(&self, id: Uuid) -> Result<Option<ActionItem>, DatabaseError>;

    async fn list_action_items(&self, project_id: Uuid) -> Result<Vec<ActionItem>, DatabaseError>;

    async fn update_action_item(
        &self,
        id: Uuid,
        patch: &ActionItemPatch,
        now: DateTime<Utc>,
    ) -> Result<ActionItem, DatabaseError>;

    async fn complete_action_item(&self, id: Uuid, completed_at: DateTime<Utc>) -> Result<ActionItem, DatabaseError>;

    async fn load_project_progress(&self, project_id: Uuid) -> Result<Option<ProjectProgress>, DatabaseError>;

    async fn save_project_progress(&self, project_id: Uuid, progress: u8) -> Result<(), DatabaseError>;

    async fn insert_form_response(&self, response: NewFormResponse) -> Result<FormResponseRecord, DatabaseError>;

    async fn find_form_response(&self, id: Uuid) -> Result<Option<FormResponseRecord>, DatabaseError>;
}

/// Action item columns joined with the owning project's client email.
/// `source` is the relation aliased `ai`: the table, or an `ai` CTE.
fn action_item_select(source: &str) -> String {
    format!(
        r#"
        SELECT
            ai.id, ai.project_id, ai.title, ai.description, ai.status,
            ai.assigned_to, ai.visible_to_client, ai.client_can_complete,
            ai.due_date, ai.completed_at,
            c.email AS client_email
        FROM {source}
        JOIN projects p ON p.id = ai.project_id
        LEFT JOIN clients c ON c.id = p.client_id
        "#
    )
}

/// Postgres-backed store
#[derive(Clone)]
pub struct PgPortalStore {
    pool: PgPool,
}

impl PgPortalStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PortalStore for PgPortalStore {
    async fn health_check(&self) -> Result<(), DatabaseError> {
        DatabaseManager::health_check(&self.pool).await
    }

    async fn count_users(&self) -> Result<i64, DatabaseError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn insert_first_user(&self, user: NewUser) -> Result<Option<User>, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        // Serializes concurrent bootstraps; plain reads are not blocked
        sqlx::query("LOCK TABLE users IN SHARE ROW EXCLUSIVE MODE")
            .execute(&mut *tx)
            .await?;

        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (id, email, name, role)
            SELECT $1, $2, $3, $4
            WHERE NOT EXISTS (SELECT 1 FROM users)
            RETURNING id, email, name, role, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.email)
        .bind(&user.name)
        .bind(user.role.as_str())
        .fetch_optional(&mut *tx)
        .await?;

        tx.commit().await?;

        row.map(User::try_from).transpose().map_err(Into::into)
    }

    async fn find_action_item(&self, id: Uuid) -> Result<Option<ActionItem>, DatabaseError> {
        let sql = format!("{} WHERE ai.id = $1", action_item_select("action_items ai"));
        let row = sqlx::query_as::<_, ActionItemRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(ActionItem::try_from).transpose().map_err(Into::into)
    }

    async fn list_action_items(&self, project_id: Uuid) -> Result<Vec<ActionItem>, DatabaseError> {
        let sql = format!(
            "{} WHERE ai.project_id = $1 ORDER BY ai.due_date NULLS LAST, ai.created_at",
            action_item_select("action_items ai")
        );
        let rows = sqlx::query_as::<_, ActionItemRow>(&sql)
            .bind(project_id)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(|row| ActionItem::try_from(row).map_err(DatabaseError::from))
            .collect()
    }

    async fn update_action_item(
        &self,
        id: Uuid,
        patch: &ActionItemPatch,
        now: DateTime<Utc>,
    ) -> Result<ActionItem, DatabaseError> {
        // Single statement so a concurrent completion is never overwritten
        // with stale values. Nullable columns take a "present" flag plus value.
        let sql = format!(
            r#"
            WITH ai AS (
                UPDATE action_items SET
                    title = COALESCE($2, title),
                    description = CASE WHEN $3 THEN $4::text ELSE description END,
                    status = COALESCE($5::text, status),
                    completed_at = CASE
                        WHEN $5::text IS NULL THEN completed_at
                        WHEN $5::text = '{completed}' THEN COALESCE(completed_at, $12)
                        ELSE NULL
                    END,
                    assigned_to = CASE WHEN $6 THEN $7::uuid ELSE assigned_to END,
                    visible_to_client = COALESCE($8, visible_to_client),
                    client_can_complete = COALESCE($9, client_can_complete),
                    due_date = CASE WHEN $10 THEN $11::timestamptz ELSE due_date END,
                    updated_at = $12
                WHERE id = $1
                RETURNING *
            )
            {select}
            "#,
            completed = ActionItemStatus::Completed.as_str(),
            select = action_item_select("ai"),
        );

        let row = sqlx::query_as::<_, ActionItemRow>(&sql)
            .bind(id)
            .bind(patch.title.as_deref())
            .bind(patch.description.is_some())
            .bind(patch.description.clone().flatten())
            .bind(patch.status.map(|s| s.as_str()))
            .bind(patch.assigned_to.is_some())
            .bind(patch.assigned_to.flatten())
            .bind(patch.visible_to_client)
            .bind(patch.client_can_complete)
            .bind(patch.due_date.is_some())
            .bind(patch.due_date.flatten())
            .bind(now)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Action item {} not found", id)))?;

        Ok(ActionItem::try_from(row)?)
    }

    async fn complete_action_item(&self, id: Uuid, completed_at: DateTime<Utc>) -> Result<ActionItem, DatabaseError> {
        let sql = format!(
            r#"
            WITH ai AS (
                UPDATE action_items
                SET status = $2, completed_at = COALESCE(completed_at, $3), updated_at = $3
                WHERE id = $1
                RETURNING *
            )
            {}
            "#,
            action_item_select("ai")
        );

        let row = sqlx::query_as::<_, ActionItemRow>(&sql)
            .bind(id)
            .bind(ActionItemStatus::Completed.as_str())
            .bind(completed_at)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Action item {} not found", id)))?;

        Ok(ActionItem::try_from(row)?)
    }

    async fn load_project_progress(&self, project_id: Uuid) -> Result<Option<ProjectProgress>, DatabaseError> {
        let project = sqlx::query_as::<_, ProjectProgressRow>(
            r#"
            SELECT p.id, p.status, p.start_date, p.due_date, p.progress, c.email AS client_email
            FROM projects p
            LEFT JOIN clients c ON c.id = p.client_id
            WHERE p.id = $1
            "#,
        )
        .bind(project_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(project) = project else {
            return Ok(None);
        };

        let statuses: Vec<String> = sqlx::query_scalar("SELECT status FROM action_items WHERE project_id = $1")
            .bind(project_id)
            .fetch_all(&self.pool)
            .await?;

        let milestones: Vec<Option<DateTime<Utc>>> =
            sqlx::query_scalar("SELECT completed_at FROM milestones WHERE project_id = $1")
                .bind(project_id)
                .fetch_all(&self.pool)
                .await?;

        let action_items = statuses
            .iter()
            .map(|s| s.parse::<ActionItemStatus>())
            .collect::<Result<Vec<_>, _>>()?;

        let source = ProgressSource {
            action_items,
            milestones: milestones
                .into_iter()
                .map(|completed_at| MilestoneState { completed_at })
                .collect(),
            status: Some(project.status.parse::<ProjectStatus>()?),
            start_date: project.start_date,
            due_date: project.due_date,
            progress: project.progress,
        };

        Ok(Some(ProjectProgress {
            project_id: project.id,
            client_email: project.client_email,
            source,
        }))
    }

    async fn save_project_progress(&self, project_id: Uuid, progress: u8) -> Result<(), DatabaseError> {
        let result = sqlx::query("UPDATE projects SET progress = $2, updated_at = now() WHERE id = $1")
            .bind(project_id)
            .bind(progress as i32)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("Project {} not found", project_id)));
        }
        Ok(())
    }

    async fn insert_form_response(&self, response: NewFormResponse) -> Result<FormResponseRecord, DatabaseError> {
        let row = sqlx::query_as::<_, FormResponseRow>(
            r#"
            INSERT INTO form_responses (id, form_id, respondent_id, answers, secure_answers)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, form_id, respondent_id, answers, secure_answers, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(response.form_id)
        .bind(response.respondent_id)
        .bind(Json(&response.answers))
        .bind(Json(&response.secure_answers))
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn find_form_response(&self, id: Uuid) -> Result<Option<FormResponseRecord>, DatabaseError> {
        let row = sqlx::query_as::<_, FormResponseRow>(
            r#"
            SELECT id, form_id, respondent_id, answers, secure_answers, created_at
            FROM form_responses
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }
}
