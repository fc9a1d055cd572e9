/// Avatar endpoints
///
/// Avatars are uploaded as the `avatar` field of a multipart form and stored
/// as raw bytes on the user row. They are served publicly by user ID.
///
/// # Endpoints
///
/// - `POST /users/me/avatar` - Upload or replace the caller's avatar
/// - `DELETE /users/me/avatar` - Remove the caller's avatar
/// - `GET /users/me/avatar` - Fetch the caller's own avatar image
/// - `GET /users/:id/avatar` - Fetch any user's avatar image

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Multipart, Path, State},
    http::{header, HeaderName, StatusCode},
    response::IntoResponse,
    Extension,
};
use bytes::Bytes;
use taskit_shared::{auth::middleware::AuthContext, models::user::User};
use uuid::Uuid;

/// Largest accepted upload in bytes
pub const MAX_AVATAR_BYTES: usize = 1_000_000;

/// Multipart field carrying the image
pub const AVATAR_FIELD: &str = "avatar";

const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Whether a file name ends in one of the accepted image extensions
pub fn has_image_extension(file_name: &str) -> bool {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| {
            let ext = ext.to_ascii_lowercase();
            ALLOWED_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Picks a content type from the image signature
pub fn detect_content_type(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        "image/png"
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        "image/jpeg"
    } else {
        "application/octet-stream"
    }
}

/// Upload an avatar for the caller
///
/// # Errors
///
/// - `400 Bad Request`: No `avatar` field, not a `.jpg`/`.jpeg`/`.png` file,
///   or larger than [`MAX_AVATAR_BYTES`]
pub async fn upload_avatar(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    mut multipart: Multipart,
) -> ApiResult<StatusCode> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(AVATAR_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        if !has_image_extension(&file_name) {
            return Err(ApiError::BadRequest("Please upload an image".to_string()));
        }

        let bytes: Bytes = field.bytes().await?;
        if bytes.len() > MAX_AVATAR_BYTES {
            return Err(ApiError::BadRequest("File too large".to_string()));
        }

        User::set_avatar(&state.db, auth.user.id, Some(bytes.to_vec()))
            .await
            .map_err(ApiError::from_write)?;

        tracing::info!(user_id = %auth.user.id, size = bytes.len(), "Avatar uploaded");

        return Ok(StatusCode::OK);
    }

    Err(ApiError::BadRequest("Please upload an image".to_string()))
}

/// Remove the caller's avatar
pub async fn delete_avatar(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<StatusCode> {
    User::set_avatar(&state.db, auth.user.id, None).await?;

    Ok(StatusCode::OK)
}

type AvatarResponse = ([(HeaderName, &'static str); 1], Bytes);

fn avatar_not_found() -> ApiError {
    ApiError::NotFound("Avatar not found".to_string())
}

async fn load_avatar(state: &AppState, user_id: Uuid) -> ApiResult<AvatarResponse> {
    let bytes = User::find_avatar(&state.db, user_id)
        .await?
        .ok_or_else(avatar_not_found)?;

    let content_type = detect_content_type(&bytes);

    Ok(([(header::CONTENT_TYPE, content_type)], Bytes::from(bytes)))
}

/// Serve a user's avatar
///
/// 404 when the user doesn't exist or has no avatar.
pub async fn get_avatar(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = Uuid::parse_str(&id).map_err(|_| avatar_not_found())?;

    load_avatar(&state, id).await
}

/// Serve the caller's own avatar
pub async fn get_own_avatar(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<impl IntoResponse> {
    load_avatar(&state, auth.user.id).await
}
