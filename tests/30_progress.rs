mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use chrono::{Duration, Utc};
use uuid::Uuid;

use client_portal_api::progress::MilestoneState;
use client_portal_api::types::{ActionItemStatus, ProjectStatus};
use common::{MemoryProject, MemoryStore};

const OWNER: &str = "owner@acme.test";

#[tokio::test]
async fn completed_project_reports_full_progress() -> Result<()> {
    let store = MemoryStore::new();
    let project = store.add_project(MemoryProject {
        client_email: Some(OWNER.into()),
        status: Some(ProjectStatus::Completed),
        ..Default::default()
    });
    store.add_item(project, |_| {});
    let router = common::app(store.clone());

    let uri = format!("/api/projects/{}/progress", project);
    let (status, body) = common::send(&router, Method::GET, &uri, Some(&common::client(OWNER)), None).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["progress"], 100);
    assert_eq!(body["data"]["project_id"], project.to_string());
    Ok(())
}

#[tokio::test]
async fn open_project_blends_work_and_schedule() -> Result<()> {
    let store = MemoryStore::new();
    let now = Utc::now();
    let project = store.add_project(MemoryProject {
        client_email: Some(OWNER.into()),
        status: Some(ProjectStatus::Active),
        start_date: Some(now - Duration::days(60)),
        due_date: Some(now - Duration::days(1)),
        milestones: vec![
            MilestoneState {
                completed_at: Some(now - Duration::days(10)),
            },
            MilestoneState::default(),
        ],
        ..Default::default()
    });
    store.add_item(project, |i| i.status = ActionItemStatus::Completed);
    store.add_item(project, |i| i.status = ActionItemStatus::Blocked);
    let router = common::app(store.clone());

    let uri = format!("/api/projects/{}/progress", project);
    let (status, body) = common::send(&router, Method::GET, &uri, Some(&common::manager()), None).await?;

    // half the segments done, window fully elapsed: 0.5 * 0.7 + 0.3
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["progress"], 65);
    // reading does not persist
    assert_eq!(store.stored_progress(project), None);
    Ok(())
}

#[tokio::test]
async fn open_project_never_reaches_full_progress() -> Result<()> {
    let store = MemoryStore::new();
    let project = store.add_project(MemoryProject {
        client_email: Some(OWNER.into()),
        status: Some(ProjectStatus::Active),
        due_date: Some(Utc::now() - Duration::days(5)),
        ..Default::default()
    });
    store.add_item(project, |i| i.status = ActionItemStatus::Completed);
    let router = common::app(store.clone());

    let uri = format!("/api/projects/{}/progress", project);
    let (_, body) = common::send(&router, Method::GET, &uri, Some(&common::admin()), None).await?;
    assert_eq!(body["data"]["progress"], 99);
    Ok(())
}

#[tokio::test]
async fn unaffiliated_client_cannot_read_progress() -> Result<()> {
    let store = MemoryStore::new();
    let project = store.add_project(MemoryProject {
        client_email: Some(OWNER.into()),
        ..Default::default()
    });
    let router = common::app(store.clone());

    let uri = format!("/api/projects/{}/progress", project);
    let (status, _) = common::send(
        &router,
        Method::GET,
        &uri,
        Some(&common::client("someone@else.test")),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let missing = format!("/api/projects/{}/progress", Uuid::new_v4());
    let (status, _) = common::send(&router, Method::GET, &missing, Some(&common::admin()), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn refresh_persists_and_is_staff_only() -> Result<()> {
    let store = MemoryStore::new();
    let project = store.add_project(MemoryProject {
        client_email: Some(OWNER.into()),
        status: Some(ProjectStatus::Active),
        progress: Some(12),
        ..Default::default()
    });
    store.add_item(project, |i| i.status = ActionItemStatus::Completed);
    for _ in 0..4 {
        store.add_item(project, |_| {});
    }
    let router = common::app(store.clone());

    let uri = format!("/api/projects/{}/progress/refresh", project);
    let (status, _) = common::send(&router, Method::POST, &uri, Some(&common::client(OWNER)), None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(store.stored_progress(project), Some(12));

    let (status, body) = common::send(&router, Method::POST, &uri, Some(&common::manager()), None).await?;
    assert_eq!(status, StatusCode::OK);
    // 1 of 5 done, no schedule
    assert_eq!(body["data"]["progress"], 14);
    assert_eq!(store.stored_progress(project), Some(14));
    Ok(())
}

#[tokio::test]
async fn stored_progress_is_used_when_nothing_to_count() -> Result<()> {
    let store = MemoryStore::new();
    let project = store.add_project(MemoryProject {
        status: Some(ProjectStatus::Planning),
        progress: Some(40),
        ..Default::default()
    });
    let router = common::app(store.clone());

    let uri = format!("/api/projects/{}/progress", project);
    let (_, body) = common::send(&router, Method::GET, &uri, Some(&common::admin()), None).await?;
    assert_eq!(body["data"]["progress"], 28);
    Ok(())
}
