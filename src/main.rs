use std::sync::Arc;

use anyhow::Context;
use axum::extract::DefaultBodyLimit;
use client_portal_api::{
    api::{self, AppState},
    auth::JwtKeys,
    config,
    database::{DatabaseManager, PgPortalStore},
    secure::SecureFieldCodec,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = config::config();
    tracing::info!("Starting Client Portal API in {:?} mode", config.environment);

    config.validate()?;

    let codec = SecureFieldCodec::from_encoded_secret(config.security.field_encryption_key.as_deref());
    if let Err(e) = &codec {
        tracing::error!("{}; secure form fields are disabled until restart", e);
    }

    let pool = DatabaseManager::connect(&config.database)
        .await
        .context("failed to connect to database")?;
    DatabaseManager::migrate(&pool).await?;

    let state = AppState::new(
        Arc::new(PgPortalStore::new(pool)),
        codec,
        JwtKeys::new(config.security.jwt_secret.clone(), config.security.jwt_expiry_hours),
    );

    let app = api::app(state)
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes))
        .layer(api::cors_layer(&config.security));

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Client Portal API listening on http://{}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
