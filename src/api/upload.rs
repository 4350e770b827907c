use axum::extract::Multipart;
use serde::Serialize;

use crate::auth::models::{AuthenticatedUser, Role};
use crate::error::AppError;
use crate::storage::client::StorageClient;

/// Response from a successful image upload.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    /// The URL path where the image can be accessed.
    pub url: String,
}

fn require_storage(storage: Option<&dyn StorageClient>) -> Result<&dyn StorageClient, AppError> {
    storage.ok_or_else(|| AppError::Unavailable("Image storage is not configured".into()))
}

/// Storage key for an uploaded file: `images/{millis}_{sanitized name}`.
pub fn image_key(file_name: &str, timestamp_millis: i64) -> String {
    let sanitized: String = file_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
        .collect();
    format!("images/{timestamp_millis}_{sanitized}")
}

/// Infer an image content type from a file extension.
pub fn content_type_for(filename: &str) -> &'static str {
    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

/// Store an uploaded image and return its public path.
pub async fn process_upload_image(
    storage: Option<&dyn StorageClient>,
    user: &AuthenticatedUser,
    file_name: &str,
    content_type: &str,
    data: Vec<u8>,
) -> Result<UploadResponse, AppError> {
    user.require(Role::Author)?;
    let storage = require_storage(storage)?;

    if !content_type.starts_with("image/") {
        return Err(AppError::BadRequest("Only image files are allowed".into()));
    }
    if data.is_empty() {
        return Err(AppError::BadRequest("Uploaded file is empty".into()));
    }

    let key = image_key(file_name, chrono::Utc::now().timestamp_millis());
    storage.put_object(&key, data, content_type).await?;

    tracing::info!(key = %key, by = %user.uid, "Image uploaded");
    Ok(UploadResponse {
        url: format!("/api/v1/image/{}", key.trim_start_matches("images/")),
    })
}

/// Load a stored image: `(content type, bytes)`.
pub async fn process_get_image(
    storage: Option<&dyn StorageClient>,
    filename: &str,
) -> Result<(&'static str, Vec<u8>), AppError> {
    let storage = require_storage(storage)?;
    if filename.contains('/') || filename.contains("..") {
        return Err(AppError::NotFound("Image not found".into()));
    }

    let data = storage
        .get_object(&format!("images/{filename}"))
        .await?
        .ok_or_else(|| AppError::NotFound("Image not found".into()))?;
    Ok((content_type_for(filename), data))
}

/// Axum handler for `POST /api/v1/upload-image`.
///
/// Accepts a multipart form with a single file field named "file".
pub async fn upload_image_handler(
    axum::extract::State(state): axum::extract::State<crate::app::AppState>,
    user: AuthenticatedUser,
    mut multipart: Multipart,
) -> Result<axum::Json<UploadResponse>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Multipart error: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or("upload.bin").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read file: {e}")))?;

        let response = process_upload_image(
            state.storage_client.as_deref(),
            &user,
            &file_name,
            &content_type,
            data.to_vec(),
        )
        .await
        .map_err(|e| e.or_internal("Failed to upload image"))?;
        return Ok(axum::Json(response));
    }

    Err(AppError::BadRequest("No file field found in request".into()))
}

/// Axum handler for `GET /api/v1/image/{filename}`.
pub async fn serve_image_handler(
    axum::extract::State(state): axum::extract::State<crate::app::AppState>,
    axum::extract::Path(filename): axum::extract::Path<String>,
) -> Result<axum::response::Response, AppError> {
    use axum::response::IntoResponse;

    let (content_type, data) = process_get_image(state.storage_client.as_deref(), &filename)
        .await
        .map_err(|e| e.or_internal("Failed to fetch image"))?;

    Ok(([(axum::http::header::CONTENT_TYPE, content_type)], data).into_response())
}
