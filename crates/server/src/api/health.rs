use axum::Json;
use axum::extract::State;
use chrono::Utc;
use serde::Serialize;

use super::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Present when a database is configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<&'static str>,
    pub timestamp: String,
    pub services: ServicesStatus,
}

#[derive(Debug, Serialize)]
pub struct ServicesStatus {
    pub storage: &'static str,
    pub database: &'static str,
}

fn configured(flag: bool) -> &'static str {
    if flag { "configured" } else { "not_configured" }
}

/// `GET /health` -- always 200. Reports which backends are configured without
/// contacting them.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let settings = &state.settings;
    Json(HealthResponse {
        status: "healthy",
        database: settings.database_configured.then_some("postgresql"),
        timestamp: Utc::now().to_rfc3339(),
        services: ServicesStatus {
            storage: configured(settings.storage_configured),
            database: configured(settings.database_configured),
        },
    })
}
