//! Media uploads, the public file proxy and stored-image deletion.

use crate::error::AppError;
use crate::state::AppState;
use crate::storage::{extract_file_id, is_valid_key, public_url, store_upload};
use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;

const FILE_FIELD: &str = "file";
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";
const IMMUTABLE: &str = "public, max-age=31536000, immutable";

/// `POST /api/cloud/upload` with a multipart `file` field.
pub async fn upload(State(state): State<AppState>, mut multipart: Multipart) -> Result<Response, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("malformed multipart body: {}", e)))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field.content_type().unwrap_or(DEFAULT_CONTENT_TYPE).to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("could not read upload: {}", e)))?;
        if bytes.is_empty() {
            return Err(AppError::BadRequest("uploaded file is empty".into()));
        }
        let stored = store_upload(state.storage.as_ref(), &file_name, &content_type, bytes.to_vec()).await?;
        let url = public_url(&state.settings.storage, &stored.id);
        let mut data = serde_json::to_value(&stored).map_err(|e| AppError::Storage(e.to_string()))?;
        data["publicUrl"] = json!(url);
        return Ok((StatusCode::CREATED, Json(json!({ "success": true, "data": data }))).into_response());
    }
    Err(AppError::BadRequest("No file provided".into()))
}

/// `GET /api/cloud/files/:file_id`
pub async fn serve_file(State(state): State<AppState>, Path(file_id): Path<String>) -> Result<Response, AppError> {
    if !is_valid_key(&file_id) {
        return Err(AppError::NotFound(file_id));
    }
    let Some(object) = state.storage.get(&file_id).await? else {
        return Err(AppError::NotFound(file_id));
    };
    if object.bytes.is_empty() {
        return Err(AppError::NotFound(file_id));
    }
    let content_type = object.content_type.unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());
    Ok((
        [(header::CONTENT_TYPE, content_type), (header::CACHE_CONTROL, IMMUTABLE.to_string())],
        object.bytes,
    )
        .into_response())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteImage {
    #[serde(default)]
    pub image_url: Option<String>,
}

/// `POST /api/delete-image` with `{imageUrl}`.
pub async fn delete_image(State(state): State<AppState>, Json(body): Json<DeleteImage>) -> Result<Response, AppError> {
    let url = body
        .image_url
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .ok_or_else(|| AppError::BadRequest("Image URL is required".into()))?;
    let deleted = match extract_file_id(&state.settings.storage, &url) {
        Some(key) => state.storage.delete(&key).await.unwrap_or_else(|e| {
            tracing::warn!(key = %key, error = %e, "image deletion failed");
            false
        }),
        None => {
            tracing::warn!(url = %url, "not a stored object");
            false
        }
    };
    if !deleted {
        return Ok((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": "Failed to delete image from cloud storage",
                "imageUrl": url,
                "success": false
            })),
        )
            .into_response());
    }
    Ok(Json(json!({
        "message": "Image deleted successfully",
        "deletedUrl": url,
        "success": true
    }))
    .into_response())
}
