#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use chrono::{DateTime, Utc};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use client_portal_api::api::{self, AppState};
use client_portal_api::auth::JwtKeys;
use client_portal_api::database::models::{
    ActionItem, ActionItemPatch, FormResponseRecord, NewFormResponse, NewUser, ProjectProgress, User,
};
use client_portal_api::database::{DatabaseError, PortalStore};
use client_portal_api::progress::{MilestoneState, ProgressSource};
use client_portal_api::secure::{SecureFieldCodec, SecureFieldError};
use client_portal_api::types::{ActionItemStatus, Actor, ProjectStatus, Role};

pub const JWT_SECRET: &str = "integration-test-secret";
pub const FIELD_KEY: [u8; 32] = [42u8; 32];

#[derive(Debug, Clone, Default)]
pub struct MemoryProject {
    pub client_email: Option<String>,
    pub status: Option<ProjectStatus>,
    pub start_date: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub progress: Option<i32>,
    pub milestones: Vec<MilestoneState>,
}

#[derive(Default)]
struct State {
    users: Vec<User>,
    projects: HashMap<Uuid, MemoryProject>,
    items: Vec<ActionItem>,
    responses: HashMap<Uuid, FormResponseRecord>,
}

/// In-memory stand-in for the Postgres store
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    unhealthy: bool,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            unhealthy: true,
            ..Self::default()
        })
    }

    pub fn add_project(&self, project: MemoryProject) -> Uuid {
        let id = Uuid::new_v4();
        self.state.lock().unwrap().projects.insert(id, project);
        id
    }

    /// Add an action item; the client email is taken from the parent project
    pub fn add_item(&self, project_id: Uuid, configure: impl FnOnce(&mut ActionItem)) -> ActionItem {
        let mut state = self.state.lock().unwrap();
        let client_email = state
            .projects
            .get(&project_id)
            .and_then(|p| p.client_email.clone());

        let mut item = ActionItem {
            id: Uuid::new_v4(),
            project_id,
            title: "Review proposal".to_string(),
            description: None,
            status: ActionItemStatus::Open,
            assigned_to: None,
            visible_to_client: false,
            client_can_complete: false,
            due_date: None,
            completed_at: None,
            client_email,
        };
        configure(&mut item);
        state.items.push(item.clone());
        item
    }

    pub fn item(&self, id: Uuid) -> Option<ActionItem> {
        self.state.lock().unwrap().items.iter().find(|i| i.id == id).cloned()
    }

    pub fn stored_progress(&self, project_id: Uuid) -> Option<i32> {
        self.state
            .lock()
            .unwrap()
            .projects
            .get(&project_id)
            .and_then(|p| p.progress)
    }

    pub fn raw_response(&self, id: Uuid) -> Option<FormResponseRecord> {
        self.state.lock().unwrap().responses.get(&id).cloned()
    }

    pub fn overwrite_secure_answer(&self, id: Uuid, field: &str, payload: String) {
        let mut state = self.state.lock().unwrap();
        if let Some(record) = state.responses.get_mut(&id) {
            record.secure_answers.insert(field.to_string(), payload);
        }
    }

    fn not_found(what: &str, id: Uuid) -> DatabaseError {
        DatabaseError::NotFound(format!("{} {} not found", what, id))
    }
}

#[async_trait]
impl PortalStore for MemoryStore {
    async fn health_check(&self) -> Result<(), DatabaseError> {
        if self.unhealthy {
            Err(DatabaseError::QueryError("connection refused".into()))
        } else {
            Ok(())
        }
    }

    async fn count_users(&self) -> Result<i64, DatabaseError> {
        Ok(self.state.lock().unwrap().users.len() as i64)
    }

    async fn insert_first_user(&self, user: NewUser) -> Result<Option<User>, DatabaseError> {
        let mut state = self.state.lock().unwrap();
        if !state.users.is_empty() {
            return Ok(None);
        }

        let user = User {
            id: Uuid::new_v4(),
            email: user.email,
            name: user.name,
            role: user.role,
            created_at: Utc::now(),
        };
        state.users.push(user.clone());
        Ok(Some(user))
    }

    async fn find_action_item(&self, id: Uuid) -> Result<Option<ActionItem>, DatabaseError> {
        Ok(self.item(id))
    }

    async fn list_action_items(&self, project_id: Uuid) -> Result<Vec<ActionItem>, DatabaseError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .items
            .iter()
            .filter(|i| i.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn update_action_item(
        &self,
        id: Uuid,
        patch: &ActionItemPatch,
        now: DateTime<Utc>,
    ) -> Result<ActionItem, DatabaseError> {
        let mut state = self.state.lock().unwrap();
        let item = state
            .items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| Self::not_found("Action item", id))?;
        patch.apply_to(item, now);
        Ok(item.clone())
    }

    async fn complete_action_item(&self, id: Uuid, completed_at: DateTime<Utc>) -> Result<ActionItem, DatabaseError> {
        let mut state = self.state.lock().unwrap();
        let item = state
            .items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| Self::not_found("Action item", id))?;
        item.status = ActionItemStatus::Completed;
        item.completed_at.get_or_insert(completed_at);
        Ok(item.clone())
    }

    async fn load_project_progress(&self, project_id: Uuid) -> Result<Option<ProjectProgress>, DatabaseError> {
        let state = self.state.lock().unwrap();
        let Some(project) = state.projects.get(&project_id) else {
            return Ok(None);
        };

        let source = ProgressSource {
            action_items: state
                .items
                .iter()
                .filter(|i| i.project_id == project_id)
                .map(|i| i.status)
                .collect(),
            milestones: project.milestones.clone(),
            status: project.status,
            start_date: project.start_date,
            due_date: project.due_date,
            progress: project.progress,
        };

        Ok(Some(ProjectProgress {
            project_id,
            client_email: project.client_email.clone(),
            source,
        }))
    }

    async fn save_project_progress(&self, project_id: Uuid, progress: u8) -> Result<(), DatabaseError> {
        let mut state = self.state.lock().unwrap();
        let project = state
            .projects
            .get_mut(&project_id)
            .ok_or_else(|| Self::not_found("Project", project_id))?;
        project.progress = Some(progress as i32);
        Ok(())
    }

    async fn insert_form_response(&self, response: NewFormResponse) -> Result<FormResponseRecord, DatabaseError> {
        let record = FormResponseRecord {
            id: Uuid::new_v4(),
            form_id: response.form_id,
            respondent_id: response.respondent_id,
            answers: response.answers,
            secure_answers: response.secure_answers,
            created_at: Utc::now(),
        };
        self.state
            .lock()
            .unwrap()
            .responses
            .insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_form_response(&self, id: Uuid) -> Result<Option<FormResponseRecord>, DatabaseError> {
        Ok(self.raw_response(id))
    }
}

pub fn jwt_keys() -> JwtKeys {
    JwtKeys::new(JWT_SECRET, 1)
}

pub fn app_with(store: Arc<MemoryStore>, codec: Result<SecureFieldCodec, SecureFieldError>) -> Router {
    api::app(AppState::new(store, codec, jwt_keys()))
}

pub fn app(store: Arc<MemoryStore>) -> Router {
    app_with(store, Ok(SecureFieldCodec::new(&FIELD_KEY)))
}

pub fn admin() -> Actor {
    Actor::new(Uuid::new_v4(), Role::Admin, Some("admin@studio.test".into()))
}

pub fn manager() -> Actor {
    Actor::new(Uuid::new_v4(), Role::Manager, Some("pm@studio.test".into()))
}

pub fn client(email: &str) -> Actor {
    Actor::new(Uuid::new_v4(), Role::Client, Some(email.to_string()))
}

/// Send a request through the router and decode the JSON body (Null when not JSON)
pub async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    actor: Option<&Actor>,
    body: Option<Value>,
) -> Result<(StatusCode, Value)> {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(actor) = actor {
        let token = jwt_keys().issue_token(actor)?;
        builder = builder.header("authorization", format!("Bearer {}", token));
    }

    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&json)?))?,
        None => builder.body(Body::empty())?,
    };

    let response = router.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    Ok((status, json))
}
