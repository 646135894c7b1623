use axum::Json;
use axum::extract::State;
use azlab_azure::{AccessToken, AzureError, STORAGE_SCOPE, expires_on_utc};
use serde::Serialize;
use tracing::{error, info};

use super::AppState;

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum IdentityResponse {
    Ok {
        success: bool,
        status: String,
        token_type: &'static str,
        expires_on: String,
    },
    Failed {
        success: bool,
        status: String,
        error: String,
    },
}

/// `GET /check-identity` -- request a Storage token through the default
/// credential chain to show which identity is available.
pub async fn check_identity(State(state): State<AppState>) -> Json<IdentityResponse> {
    let result: Result<AccessToken, AzureError> = async {
        let credential = state.services.credential()?;
        Ok(credential.get_token(&[STORAGE_SCOPE], None).await?)
    }
    .await;

    match result {
        Ok(token) => {
            let expires_on = expires_on_utc(&token);
            info!(%expires_on, "managed identity check succeeded");
            Json(IdentityResponse::Ok {
                success: true,
                status: "Managed Identity is working correctly".to_owned(),
                token_type: "Bearer",
                expires_on: expires_on.to_rfc3339(),
            })
        }
        Err(e) => {
            error!(error = %e, "managed identity check failed");
            Json(IdentityResponse::Failed {
                success: false,
                status: format!("Error: {e}"),
                error: e.to_string(),
            })
        }
    }
}
