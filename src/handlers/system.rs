use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::api::AppState;

/// GET / - service description
pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Client Portal API",
            "version": version,
            "endpoints": {
                "health": "/health (public)",
                "action_items": "/api/projects/:id/action-items, /api/action-items/:id[/complete] (protected)",
                "progress": "/api/projects/:id/progress[/refresh] (protected)",
                "forms": "/api/forms/:id/responses, /api/form-responses/:id (protected)",
            }
        }
    }))
}

/// GET /health - liveness plus database connectivity
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();
    let secure_fields = if state.codec.is_ok() { "ok" } else { "disabled" };

    match state.store.health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok",
                    "secure_fields": secure_fields
                }
            })),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "data": {
                        "status": "degraded",
                        "timestamp": now,
                        "secure_fields": secure_fields
                    }
                })),
            )
        }
    }
}
