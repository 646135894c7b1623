use axum::Json;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use azlab_postgres::{DatabaseError, DemoUser};
use serde::Serialize;
use tracing::{error, info};

use super::{AppState, FailureResponse};

/// Characters of `version()` echoed back by `GET /test-database`.
const VERSION_PREVIEW_CHARS: usize = 50;

#[derive(Debug, Serialize)]
pub struct DatabaseTestResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct UserEntry {
    pub id: i32,
    pub name: String,
    pub email: String,
    /// `%Y-%m-%d %H:%M:%S`, or `N/A` when unset.
    pub created_at: String,
}

impl From<DemoUser> for UserEntry {
    fn from(user: DemoUser) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            created_at: user.created_at.map_or_else(
                || "N/A".to_owned(),
                |t| t.format("%Y-%m-%d %H:%M:%S").to_string(),
            ),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UsersResponse {
    pub success: bool,
    pub users: Vec<UserEntry>,
    pub count: usize,
}

/// `GET /test-database` -- connect with a token and report the server version.
pub async fn test_database(State(state): State<AppState>) -> Response {
    let result: Result<String, DatabaseError> = async {
        let db = state.services.database()?;
        db.server_version().await
    }
    .await;

    match result {
        Ok(version) => {
            info!("PostgreSQL connection succeeded");
            let preview: String = version.chars().take(VERSION_PREVIEW_CHARS).collect();
            Json(DatabaseTestResponse {
                success: true,
                message: format!("Connection successful. Version: {preview}..."),
            })
            .into_response()
        }
        Err(e) => {
            error!(error = %e, "PostgreSQL connection failed");
            Json(FailureResponse::new(e)).into_response()
        }
    }
}

/// `GET /get-users` -- list the demo users, creating and seeding the table on
/// first use.
pub async fn get_users(State(state): State<AppState>) -> Response {
    let result: Result<Vec<DemoUser>, DatabaseError> = async {
        let db = state.services.database()?;
        db.list_users().await
    }
    .await;

    match result {
        Ok(users) => {
            let users: Vec<UserEntry> = users.into_iter().map(UserEntry::from).collect();
            info!(count = users.len(), "fetched users from PostgreSQL");
            Json(UsersResponse {
                success: true,
                count: users.len(),
                users,
            })
            .into_response()
        }
        Err(e) => {
            error!(error = %e, "fetching users failed");
            Json(FailureResponse::new(e)).into_response()
        }
    }
}
