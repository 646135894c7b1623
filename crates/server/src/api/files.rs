use axum::Json;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Redirect, Response};
use azlab_azure::{AzureError, BlobItem};
use bytes::Bytes;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use super::{AppState, FailureResponse};
use crate::error::ServerError;

/// Extensions accepted by `POST /upload`, compared case-insensitively.
pub const ALLOWED_EXTENSIONS: [&str; 9] = [
    "txt", "pdf", "png", "jpg", "jpeg", "gif", "csv", "json", "md",
];

/// Reduce a client-supplied name to a safe blob name.
///
/// Keeps only the last path component, replaces every character outside
/// `[A-Za-z0-9._-]` with `_` and strips leading dots.
pub fn secure_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    cleaned.trim_start_matches('.').to_owned()
}

/// Lower-cased extension of `name`, if it has one.
fn extension(name: &str) -> Option<String> {
    name.rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
}

pub fn allowed_file(name: &str) -> bool {
    extension(name).is_some_and(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
}

/// Content type served for a stored file.
pub fn content_type_for(name: &str) -> &'static str {
    match extension(name).as_deref() {
        Some("txt") => "text/plain; charset=utf-8",
        Some("md") => "text/markdown; charset=utf-8",
        Some("csv") => "text/csv; charset=utf-8",
        Some("json") => "application/json",
        Some("pdf") => "application/pdf",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    }
}

/// Characters left as-is in a flash message query value.
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

fn redirect_with(key: &str, text: &str) -> Response {
    let target = format!("/?{key}={}", utf8_percent_encode(text, QUERY_VALUE));
    Redirect::to(&target).into_response()
}

fn upload_failed(text: &str) -> Response {
    warn!(reason = %text, "upload rejected");
    redirect_with("error", text)
}

/// A validated upload waiting to be stored.
struct PendingUpload {
    name: String,
    content_type: String,
    data: Bytes,
}

/// Pull the `file` field out of the form and validate its name.
async fn read_upload(mut multipart: Multipart) -> Result<PendingUpload, String> {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => return Err("No file part in the request".to_owned()),
            Err(e) => return Err(format!("Invalid upload: {}", e.body_text())),
        };
        if field.name() != Some("file") {
            continue;
        }

        let original = field.file_name().unwrap_or_default().to_owned();
        if original.trim().is_empty() {
            return Err("No file selected".to_owned());
        }
        if !allowed_file(&original) {
            return Err(format!(
                "File type not allowed. Allowed types: {}",
                ALLOWED_EXTENSIONS.join(", ")
            ));
        }
        let name = secure_filename(&original);
        if name.is_empty() || !allowed_file(&name) {
            return Err("Invalid file name".to_owned());
        }

        let content_type = field
            .content_type()
            .filter(|ct| !ct.is_empty() && *ct != "application/octet-stream")
            .map_or_else(|| content_type_for(&name).to_owned(), str::to_owned);
        let data = field
            .bytes()
            .await
            .map_err(|e| format!("Invalid upload: {}", e.body_text()))?;

        return Ok(PendingUpload {
            name,
            content_type,
            data,
        });
    }
}

/// `POST /upload` -- store the multipart `file` field in the files container
/// and redirect back to the landing page with a flash message.
pub async fn upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let multipart = match multipart {
        Ok(m) => m,
        Err(e) => return upload_failed(&format!("Invalid upload: {}", e.body_text())),
    };
    let PendingUpload {
        name,
        content_type,
        data,
    } = match read_upload(multipart).await {
        Ok(p) => p,
        Err(text) => return upload_failed(&text),
    };
    debug!(name = %name, size = data.len(), "upload received");

    let container = &state.settings.files_container;
    let result: Result<(), AzureError> = async {
        let store = state.services.blob_store()?;
        store
            .upload_blob(container, &name, data, &content_type)
            .await
    }
    .await;

    match result {
        Ok(()) => {
            info!(name = %name, container = %container, "file uploaded");
            redirect_with("message", &format!("File '{name}' uploaded successfully"))
        }
        Err(e) => {
            error!(error = %e, name = %name, "upload failed");
            redirect_with("error", &format!("Upload failed: {e}"))
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FileEntry {
    pub name: String,
    pub size: u64,
    pub last_modified: Option<String>,
}

impl From<BlobItem> for FileEntry {
    fn from(item: BlobItem) -> Self {
        Self {
            name: item.name,
            size: item.size,
            last_modified: item
                .last_modified
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FileListResponse {
    pub success: bool,
    pub files: Vec<FileEntry>,
    pub count: usize,
    pub container: String,
}

/// `GET /list-files` -- every blob in the files container.
pub async fn list_files(State(state): State<AppState>) -> Response {
    let container = &state.settings.files_container;
    let result: Result<Vec<BlobItem>, AzureError> = async {
        let store = state.services.blob_store()?;
        store.list_blobs(container).await
    }
    .await;

    match result {
        Ok(items) => {
            let files: Vec<FileEntry> = items.into_iter().map(FileEntry::from).collect();
            info!(count = files.len(), container = %container, "files listed");
            Json(FileListResponse {
                success: true,
                count: files.len(),
                files,
                container: container.clone(),
            })
            .into_response()
        }
        Err(e) => {
            error!(error = %e, "listing files failed");
            Json(FailureResponse::new(e)).into_response()
        }
    }
}

/// Reject names that would change under [`secure_filename`].
fn validate_name(filename: &str) -> Result<(), Response> {
    if filename.is_empty() || secure_filename(filename) != filename {
        return Err(ServerError::BadRequest(format!("Invalid file name: {filename}")).into_response());
    }
    Ok(())
}

/// `GET /view/{filename}` -- stream a stored file back with its content type.
pub async fn view_file(State(state): State<AppState>, Path(filename): Path<String>) -> Response {
    if let Err(rejection) = validate_name(&filename) {
        return rejection;
    }

    let container = &state.settings.files_container;
    let result: Result<Bytes, AzureError> = async {
        let store = state.services.blob_store()?;
        store.read_blob(container, &filename).await
    }
    .await;

    match result {
        Ok(data) => {
            debug!(name = %filename, size = data.len(), "serving file");
            (
                [
                    (header::CONTENT_TYPE, content_type_for(&filename).to_owned()),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("inline; filename=\"{filename}\""),
                    ),
                ],
                data,
            )
                .into_response()
        }
        Err(e) => {
            error!(error = %e, name = %filename, "viewing file failed");
            Json(FailureResponse::new(e)).into_response()
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

/// `DELETE /delete/{filename}` -- remove a stored file.
pub async fn delete_file(State(state): State<AppState>, Path(filename): Path<String>) -> Response {
    if let Err(rejection) = validate_name(&filename) {
        return rejection;
    }

    let container = &state.settings.files_container;
    let result: Result<(), AzureError> = async {
        let store = state.services.blob_store()?;
        store.delete_blob(container, &filename).await
    }
    .await;

    match result {
        Ok(()) => {
            info!(name = %filename, container = %container, "file deleted");
            Json(DeleteResponse {
                success: true,
                message: format!("File '{filename}' deleted successfully"),
            })
            .into_response()
        }
        Err(e) => {
            error!(error = %e, name = %filename, "deleting file failed");
            Json(FailureResponse::new(e)).into_response()
        }
    }
}
