use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Errors that can occur when running the azlab server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// A configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// The landing page template failed to render.
    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),

    /// The request was malformed.
    #[error("bad request: {0}")]
    BadRequest(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Config(_) | Self::Template(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let message = match self {
            Self::BadRequest(msg) | Self::Config(msg) => msg,
            other => other.to_string(),
        };

        let body = serde_json::json!({ "success": false, "error": message });
        (status, axum::Json(body)).into_response()
    }
}
