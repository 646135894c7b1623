pub mod database;
pub mod files;
pub mod health;
pub mod identity;
pub mod landing;
pub mod storage;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::{AzlabConfig, SiteInfo};
use crate::factory::ServiceFactory;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Builds a fresh credential and client for every request.
    pub services: Arc<dyn ServiceFactory>,
    /// Resolved resource names and page details.
    pub settings: Arc<AppSettings>,
}

/// The configuration values handlers need, resolved once at startup.
#[derive(Debug, Clone)]
pub struct AppSettings {
    pub storage_account: Option<String>,
    pub storage_configured: bool,
    pub files_container: String,
    pub demo_container: String,
    pub demo_blob: String,
    pub postgres_server: Option<String>,
    pub postgres_database: String,
    pub database_configured: bool,
    pub site: SiteInfo,
    pub max_upload_bytes: usize,
}

impl AppSettings {
    pub fn from_config(config: &AzlabConfig) -> Self {
        Self {
            storage_account: config.storage.account_name.clone(),
            storage_configured: config.storage.is_configured(),
            files_container: config.storage.files_container.clone(),
            demo_container: config.storage.demo_container.clone(),
            demo_blob: config.storage.demo_blob.clone(),
            postgres_server: config.postgres.server.clone(),
            postgres_database: config.postgres.database.clone(),
            database_configured: config.postgres.to_postgres_config().is_configured(),
            site: config.site.clone(),
            max_upload_bytes: config.server.max_upload_bytes,
        }
    }
}

/// Body of every failed JSON operation.
#[derive(Debug, Serialize)]
pub struct FailureResponse {
    pub success: bool,
    pub error: String,
}

impl FailureResponse {
    pub fn new(error: impl std::fmt::Display) -> Self {
        Self {
            success: false,
            error: error.to_string(),
        }
    }
}

/// Build the Axum router with every demo route and the tracing and CORS layers.
pub fn router(state: AppState) -> Router {
    let upload_limit = DefaultBodyLimit::max(state.settings.max_upload_bytes);

    Router::new()
        .route("/", get(landing::index))
        .route("/health", get(health::health))
        .route("/check-identity", get(identity::check_identity))
        .route("/test-storage", get(storage::test_storage))
        .route("/upload", post(files::upload).layer(upload_limit))
        .route("/list-files", get(files::list_files))
        .route("/view/{filename}", get(files::view_file))
        .route("/delete/{filename}", delete(files::delete_file))
        .route("/test-database", get(database::test_database))
        .route("/get-users", get(database::get_users))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
