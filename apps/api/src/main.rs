//! Classgate API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod api_router;
mod api_services;
mod auth;
mod dto;
mod error;
mod handlers;
mod middleware;
mod state;

use classgate_core::AppError;
use tracing::info;

use crate::api_config::{ApiCommand, ApiConfig, init_tracing};
use crate::api_services::{
    build_app_state, build_postgres_session_layer, connect_and_migrate, import_tree_file,
};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ApiConfig::load()?;
    let pool = connect_and_migrate(&config.database_url, config.database_max_connections).await?;

    match &config.command {
        ApiCommand::Migrate => {
            info!("database migrations applied successfully");
            return Ok(());
        }
        ApiCommand::ImportTree(path) => {
            let app_state = build_app_state(pool, &config);
            let written = import_tree_file(&app_state, path).await?;
            info!(written, "classification import finished");
            return Ok(());
        }
        ApiCommand::Serve => {}
    }

    if config.bootstrap_token.is_none() {
        tracing::warn!("AUTH_BOOTSTRAP_TOKEN is not set; sessions cannot be issued");
    }

    let session_layer = build_postgres_session_layer(pool.clone(), config.cookie_secure).await?;
    let app_state = build_app_state(pool, &config);
    let app = api_router::build_router(app_state, &config.frontend_url, session_layer)?;

    let address = config.socket_address()?;
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind API listener: {error}")))?;

    info!(%address, "classgate api listening");

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("api server failed: {error}")))
}
