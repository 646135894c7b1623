use axum::Json;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use azlab_azure::AzureError;
use serde::Serialize;
use tracing::{error, info};

use super::{AppState, FailureResponse};

#[derive(Debug, Serialize)]
pub struct StorageTestResponse {
    pub success: bool,
    pub message: String,
    pub storage_account: Option<String>,
    pub container: String,
    pub blob: String,
}

/// `GET /test-storage` -- read the demo blob with a token-authorized client.
pub async fn test_storage(State(state): State<AppState>) -> Response {
    let settings = &state.settings;
    if !settings.storage_configured {
        return Json(FailureResponse::new("AZURE_STORAGE_ACCOUNT is not configured"))
            .into_response();
    }

    let result: Result<_, AzureError> = async {
        let store = state.services.blob_store()?;
        store
            .read_blob(&settings.demo_container, &settings.demo_blob)
            .await
    }
    .await;

    match result {
        Ok(content) => {
            let text = String::from_utf8_lossy(&content);
            info!(
                container = %settings.demo_container,
                blob = %settings.demo_blob,
                "demo blob read"
            );
            Json(StorageTestResponse {
                success: true,
                message: format!("Blob content: {text}"),
                storage_account: settings.storage_account.clone(),
                container: settings.demo_container.clone(),
                blob: settings.demo_blob.clone(),
            })
            .into_response()
        }
        Err(e) => {
            error!(error = %e, "storage access failed");
            Json(FailureResponse::new(e)).into_response()
        }
    }
}
