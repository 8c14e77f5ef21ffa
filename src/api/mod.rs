use axum::{
    http::{HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::JwtKeys;
use crate::config::SecurityConfig;
use crate::database::PortalStore;
use crate::error::ApiError;
use crate::handlers::{action_items, forms, projects, system};
use crate::middleware::jwt_auth_middleware;
use crate::secure::{SecureFieldCodec, SecureFieldError};

/// Shared per-process dependencies handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn PortalStore>,
    /// Configured once at startup; a configuration error disables secure fields until restart
    pub codec: Result<Arc<SecureFieldCodec>, SecureFieldError>,
    pub jwt: Arc<JwtKeys>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn PortalStore>,
        codec: Result<SecureFieldCodec, SecureFieldError>,
        jwt: JwtKeys,
    ) -> Self {
        Self {
            store,
            codec: codec.map(Arc::new),
            jwt: Arc::new(jwt),
        }
    }

    pub fn codec(&self) -> Result<&SecureFieldCodec, ApiError> {
        self.codec
            .as_deref()
            .map_err(|e| ApiError::from(e.clone()))
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        // Public
        .route("/", get(system::root))
        .route("/health", get(system::health))
        // Protected API
        .merge(protected_routes(state.clone()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/projects/:id/action-items", get(action_items::list_for_project))
        .route(
            "/api/action-items/:id",
            get(action_items::show).patch(action_items::update),
        )
        .route("/api/action-items/:id/complete", post(action_items::complete))
        .route("/api/projects/:id/progress", get(projects::progress_get))
        .route("/api/projects/:id/progress/refresh", post(projects::progress_refresh))
        .route("/api/forms/:id/responses", post(forms::response_post))
        .route("/api/form-responses/:id", get(forms::response_get))
        .route_layer(middleware::from_fn_with_state(state, jwt_auth_middleware))
}

/// CORS policy from security config; disabled CORS sends no CORS headers at all
pub fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if !security.enable_cors {
        return CorsLayer::new();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
        .allow_headers(Any)
}
