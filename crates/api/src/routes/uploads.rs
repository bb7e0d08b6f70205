//! ImageKit media routes.
//!
//! Browsers normally upload straight to ImageKit with the parameters from
//! `/imagekit-auth`. The `/uploads` routes cover clients that cannot.

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::StatusCode,
    routing::get,
};
use bytes::Bytes;
use tracing::{info, warn};

use super::projects::ListResponse;
use crate::{AppState, ApiError, ApiResult, middleware::AuthUser};
use contentforge_integrations::imagekit::{
    AuthenticationParameters, ImageKitFile, ListFilesOptions, UploadRequest,
};

/// Largest accepted upload.
pub const MAX_UPLOAD_BYTES: usize = 500 * 1024 * 1024;

/// Upload signing for the browser; needs no session.
pub fn public_routes() -> Router<AppState> {
    Router::new().route("/imagekit-auth", get(imagekit_auth))
}

/// Server-side uploads.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/uploads",
            get(list_files)
                .post(upload)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/uploads/{file_id}", get(file_details).delete(delete_file))
}

/// GET /imagekit-auth
async fn imagekit_auth(State(state): State<AppState>) -> ApiResult<Json<AuthenticationParameters>> {
    Ok(Json(state.storage()?.authentication_parameters()?))
}

fn is_media(content_type: Option<&str>) -> bool {
    content_type.is_some_and(|ct| ct.starts_with("video/") || ct.starts_with("audio/"))
}

pub(crate) struct UploadForm {
    pub(crate) file: Bytes,
    pub(crate) file_name: String,
    pub(crate) content_type: String,
    pub(crate) folder: Option<String>,
}

/// Reads a multipart form with a media `file` and an optional `folder`.
pub(crate) async fn read_form(mut multipart: Multipart) -> ApiResult<UploadForm> {
    let mut file = None;
    let mut folder = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(e.body_text()))?
    {
        match field.name() {
            Some("file") => {
                if !is_media(field.content_type()) {
                    return Err(ApiError::validation(
                        "Invalid file type. Only video and audio files are allowed",
                    ));
                }
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field.content_type().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::validation(e.body_text()))?;
                file = Some((bytes, file_name, content_type));
            }
            Some("folder") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::validation(e.body_text()))?;
                folder = Some(text).filter(|f| !f.trim().is_empty());
            }
            _ => {}
        }
    }

    let (file, file_name, content_type) =
        file.ok_or_else(|| ApiError::validation("No file uploaded"))?;
    Ok(UploadForm {
        file,
        file_name,
        content_type,
        folder,
    })
}

/// POST /uploads - multipart `file` plus optional `folder`.
async fn upload(
    State(state): State<AppState>,
    auth: AuthUser,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<ImageKitFile>)> {
    let storage = state.storage()?.clone();
    let form = read_form(multipart).await?;
    let size = form.file.len();

    let stored = storage
        .upload(UploadRequest {
            file: form.file,
            file_name: form.file_name,
            folder: form.folder,
        })
        .await?;

    info!(
        user_id = %auth.user_id(),
        file_id = %stored.file_id,
        size,
        "File uploaded"
    );
    Ok((StatusCode::CREATED, Json(stored)))
}

/// GET /uploads/{fileId}
async fn file_details(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(file_id): Path<String>,
) -> ApiResult<Json<ImageKitFile>> {
    Ok(Json(state.storage()?.file_details(&file_id).await?))
}

/// DELETE /uploads/{fileId}
async fn delete_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(file_id): Path<String>,
) -> ApiResult<StatusCode> {
    state.storage()?.delete_file(&file_id).await?;
    warn!(user_id = %auth.user_id(), %file_id, "File deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /uploads?skip&limit&searchQuery&path - Admin only.
async fn list_files(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(options): Query<ListFilesOptions>,
) -> ApiResult<Json<ListResponse<ImageKitFile>>> {
    auth.require_admin()?;
    let data = state.storage()?.list_files(options).await?;
    Ok(Json(ListResponse { data }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Some("video/mp4"), true)]
    #[case(Some("audio/mpeg"), true)]
    #[case(Some("image/png"), false)]
    #[case(Some("application/octet-stream"), false)]
    #[case(None, false)]
    fn test_is_media(#[case] content_type: Option<&str>, #[case] expected: bool) {
        assert_eq!(is_media(content_type), expected);
    }
}
