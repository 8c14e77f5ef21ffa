use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::types::{ActionItemStatus, UnknownVariant};

/// Raw row joined with the owning project's client email
#[derive(Debug, Clone, FromRow)]
pub struct ActionItemRow {
    pub id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub assigned_to: Option<Uuid>,
    pub visible_to_client: bool,
    pub client_can_complete: bool,
    pub due_date: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub client_email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionItem {
    pub id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: ActionItemStatus,
    pub assigned_to: Option<Uuid>,
    pub visible_to_client: bool,
    pub client_can_complete: bool,
    pub due_date: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Email on the client record of the parent project
    #[serde(skip_serializing)]
    pub client_email: Option<String>,
}

impl TryFrom<ActionItemRow> for ActionItem {
    type Error = UnknownVariant;

    fn try_from(row: ActionItemRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            project_id: row.project_id,
            title: row.title,
            description: row.description,
            status: row.status.parse()?,
            assigned_to: row.assigned_to,
            visible_to_client: row.visible_to_client,
            client_can_complete: row.client_can_complete,
            due_date: row.due_date,
            completed_at: row.completed_at,
            client_email: row.client_email,
        })
    }
}

/// Staff edit of an action item; absent fields are left unchanged.
///
/// Nullable columns use `Option<Option<_>>`: an absent key is `None`, an
/// explicit JSON `null` is `Some(None)` and clears the column.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActionItemPatch {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    pub status: Option<ActionItemStatus>,
    #[serde(default, deserialize_with = "nullable")]
    pub assigned_to: Option<Option<Uuid>>,
    pub visible_to_client: Option<bool>,
    pub client_can_complete: Option<bool>,
    #[serde(default, deserialize_with = "nullable")]
    pub due_date: Option<Option<DateTime<Utc>>>,
}

fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl ActionItemPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.assigned_to.is_none()
            && self.visible_to_client.is_none()
            && self.client_can_complete.is_none()
            && self.due_date.is_none()
    }

    /// Apply to an in-memory item; completion timestamps follow the status
    pub fn apply_to(&self, item: &mut ActionItem, now: DateTime<Utc>) {
        if let Some(title) = &self.title {
            item.title = title.clone();
        }
        if let Some(description) = &self.description {
            item.description = description.clone();
        }
        if let Some(status) = self.status {
            if status.is_completed() && !item.status.is_completed() {
                item.completed_at = Some(now);
            } else if !status.is_completed() {
                item.completed_at = None;
            }
            item.status = status;
        }
        if let Some(assigned_to) = self.assigned_to {
            item.assigned_to = assigned_to;
        }
        if let Some(flag) = self.visible_to_client {
            item.visible_to_client = flag;
        }
        if let Some(flag) = self.client_can_complete {
            item.client_can_complete = flag;
        }
        if let Some(due) = self.due_date {
            item.due_date = due;
        }
    }
}
