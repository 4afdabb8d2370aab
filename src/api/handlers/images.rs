//! HTTP handlers for uploaded images.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use tracing::instrument;

use crate::{
    api::models::images::{ImageListResponse, ImageResponse, ListImagesQuery},
    auth::CurrentAdmin,
    errors::{Error, Result},
    AppState,
};

const DEFAULT_LIST_LIMIT: usize = 100;

/// Replace anything outside `[A-Za-z0-9._-]` so filenames are safe as
/// path segments.
fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '-' })
        .collect();
    if sanitized.is_empty() {
        "upload".to_string()
    } else {
        sanitized
    }
}

/// List stored images. Public, like fetching them.
#[utoipa::path(
    get,
    path = "/images",
    tag = "images",
    summary = "List images",
    params(ListImagesQuery),
    responses(
        (status = 200, description = "Stored images, newest key first", body = ImageListResponse),
    )
)]
#[instrument(skip_all)]
pub async fn list_images(
    State(state): State<AppState>,
    Query(query): Query<ListImagesQuery>,
) -> Result<Json<ImageListResponse>> {
    let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT);
    let objects = state.storage.list(query.prefix.as_deref(), limit).await?;
    Ok(Json(ImageListResponse {
        images: objects.into_iter().map(Into::into).collect(),
    }))
}

/// Upload an image via multipart form data.
///
/// Expects a `file` part; an optional `key` part overrides the generated
/// storage key.
#[utoipa::path(
    post,
    path = "/images",
    tag = "images",
    summary = "Upload image",
    responses(
        (status = 201, description = "Image stored", body = ImageResponse),
        (status = 400, description = "No file part in the upload"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
    )
)]
#[instrument(skip_all)]
pub async fn upload_image(
    State(state): State<AppState>,
    _admin: CurrentAdmin,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ImageResponse>)> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut explicit_key: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| Error::Validation {
        message: format!("Invalid multipart body: {e}"),
    })? {
        match field.name() {
            Some("file") => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let bytes = field.bytes().await.map_err(|e| Error::Validation {
                    message: format!("Failed to read file part: {e}"),
                })?;
                file = Some((filename, bytes.to_vec()));
            }
            Some("key") => {
                let value = field.text().await.map_err(|e| Error::Validation {
                    message: format!("Failed to read key part: {e}"),
                })?;
                explicit_key = Some(value);
            }
            _ => {}
        }
    }

    let (filename, content) = file.ok_or_else(|| Error::Validation {
        message: "Missing file part".to_string(),
    })?;

    let key = match explicit_key {
        Some(key) if !key.trim().is_empty() => key,
        _ => format!("uploads/{}-{}", Utc::now().timestamp_millis(), sanitize_filename(&filename)),
    };

    let size = content.len() as u64;
    state.storage.store(&key, &content).await?;

    Ok((
        StatusCode::CREATED,
        Json(ImageResponse {
            url: format!("/api/images/{key}"),
            key,
            size,
        }),
    ))
}

/// Serve a stored image. Public; keys may contain slashes.
#[utoipa::path(
    get,
    path = "/images/{key}",
    tag = "images",
    summary = "Get image",
    params(("key" = String, Path, description = "Storage key, may contain slashes")),
    responses(
        (status = 200, description = "Image bytes"),
        (status = 404, description = "No such image"),
    )
)]
#[instrument(skip_all, fields(key = %key))]
pub async fn get_image(State(state): State<AppState>, Path(key): Path<String>) -> Result<Response> {
    let content = state.storage.retrieve(&key).await?;
    let mime = mime_guess::from_path(&key).first_or_octet_stream();

    let response = (
        [
            (header::CONTENT_TYPE, mime.as_ref().to_string()),
            (header::CACHE_CONTROL, "public, max-age=31536000, immutable".to_string()),
        ],
        content,
    );
    Ok(response.into_response())
}

/// Delete a stored image.
#[utoipa::path(
    delete,
    path = "/images/{key}",
    tag = "images",
    summary = "Delete image",
    params(("key" = String, Path, description = "Storage key, may contain slashes")),
    responses(
        (status = 204, description = "Image deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "No such image"),
    )
)]
#[instrument(skip_all, fields(key = %key))]
pub async fn delete_image(
    State(state): State<AppState>,
    _admin: CurrentAdmin,
    Path(key): Path<String>,
) -> Result<StatusCode> {
    if !state.storage.exists(&key).await? {
        return Err(Error::NotFound {
            resource: "image".to_string(),
            id: key,
        });
    }
    state.storage.delete(&key).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("photo.jpg"), "photo.jpg");
        assert_eq!(sanitize_filename("my photo (1).png"), "my-photo--1-.png");
        assert_eq!(sanitize_filename("../../etc/passwd"), "..-..-etc-passwd");
        assert_eq!(sanitize_filename(""), "upload");
    }
}
