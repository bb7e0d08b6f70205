//! Content project routes: create, transcribe, generate, insights.

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    routing::{get, post},
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;
use validator::Validate;

use super::brands::brand_voice;
use super::uploads::{MAX_UPLOAD_BYTES, read_form};
use crate::{AppState, ApiError, ApiResult, middleware::AuthUser};
use contentforge_core::content::{
    ContentKind, DEFAULT_SEGMENT_SECONDS, Insights, Tone, TranscriptionResult,
    extract_timestamped_segments, format_with_speakers,
};
use contentforge_db::entities::{
    output, project,
    sea_orm_active_enums::{ContentType, OutputType},
};
use contentforge_db::repositories::{NewOutput, NewProject, ProcessingStatus};
use contentforge_db::{BrandRepository, OutputRepository, ProjectRepository};
use contentforge_integrations::{Transcriber, generate_multiple};

/// Most pieces a single content type may ask for.
pub const MAX_PIECES_PER_TYPE: u32 = 10;

/// Creates the project router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/projects", post(create_project).get(list_projects))
        .route("/projects/{id}", get(get_project))
        .route("/projects/{id}/transcribe", post(transcribe))
        .route(
            "/projects/{id}/transcribe/upload",
            post(transcribe_upload).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/projects/{id}/generate", post(generate))
        .route("/projects/{id}/outputs", get(list_outputs))
        .route("/projects/{id}/insights", get(insights))
}

/// Body of `POST /projects`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectBody {
    /// Project title.
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    /// Free-form notes.
    #[serde(default)]
    pub description: Option<String>,
    /// Kind of source media.
    pub content_type: ContentType,
    /// Public link to the media.
    #[serde(default)]
    #[validate(url)]
    pub source_url: Option<String>,
    /// Uploaded file location.
    #[serde(default)]
    #[validate(url)]
    pub file_url: Option<String>,
    /// Uploaded file size in bytes.
    #[serde(default)]
    #[validate(range(min = 0))]
    pub file_size: Option<i32>,
    /// Brand whose voice generation should use.
    #[serde(default)]
    pub brand_id: Option<Uuid>,
}

/// One requested content type.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ContentRequest {
    /// Content type.
    #[serde(rename = "type")]
    pub kind: ContentKind,
    /// Pieces wanted.
    #[serde(default = "default_count")]
    pub count: u32,
}

const fn default_count() -> u32 {
    1
}

/// Body of `POST /projects/{id}/generate`.
#[derive(Debug, Deserialize)]
pub struct GenerateBody {
    /// Types to generate.
    pub types: Vec<ContentRequest>,
    /// Writing tone, professional when omitted.
    #[serde(default)]
    pub tone: Option<Tone>,
}

/// Generation result.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    /// Stored outputs.
    pub outputs: Vec<output::Model>,
    /// Summaries, returned but not stored.
    pub summaries: Vec<String>,
    /// Types that produced nothing.
    pub failed_types: Vec<ContentKind>,
}

/// List wrapper.
#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    /// Items.
    pub data: Vec<T>,
}

async fn owned_project(state: &AppState, id: Uuid, user_id: Uuid) -> ApiResult<project::Model> {
    ProjectRepository::new(state.conn())
        .find_owned(id, user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Project"))
}

fn require_transcript(project: &project::Model) -> ApiResult<&str> {
    project
        .transcript_text
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ApiError::validation("Project has not been transcribed yet"))
}

/// POST /projects
async fn create_project(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<CreateProjectBody>,
) -> ApiResult<(StatusCode, Json<project::Model>)> {
    body.validate()?;

    if let Some(brand_id) = body.brand_id {
        BrandRepository::new(state.conn())
            .find_owned(brand_id, auth.user_id())
            .await?
            .ok_or_else(|| ApiError::not_found("Brand"))?;
    }

    let project = ProjectRepository::new(state.conn())
        .create(
            auth.user_id(),
            NewProject {
                title: body.title,
                description: body.description,
                content_type: body.content_type,
                source_url: body.source_url,
                file_url: body.file_url,
                file_size: body.file_size,
                brand_id: body.brand_id,
            },
        )
        .await?;

    info!(project_id = %project.id, user_id = %auth.user_id(), "Project created");
    Ok((StatusCode::CREATED, Json(project)))
}

/// GET /projects
async fn list_projects(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<ListResponse<project::Model>>> {
    let data = ProjectRepository::new(state.conn())
        .list_by_user(auth.user_id())
        .await?;
    Ok(Json(ListResponse { data }))
}

/// GET /projects/{id}
async fn get_project(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<project::Model>> {
    Ok(Json(owned_project(&state, id, auth.user_id()).await?))
}

/// Whole seconds of audio, for the integer `duration` column.
#[allow(clippy::cast_possible_truncation)]
fn duration_seconds(result: &TranscriptionResult) -> Option<i32> {
    let secs = result.metadata.duration.round();
    (secs.is_finite() && secs >= 0.0 && secs <= f64::from(i32::MAX)).then(|| secs as i32)
}

fn transcript_metadata(result: &TranscriptionResult) -> serde_json::Value {
    json!({
        "confidence": result.confidence,
        "model": result.metadata.model,
        "channels": result.metadata.channels,
        "segments": extract_timestamped_segments(result, DEFAULT_SEGMENT_SECONDS),
    })
}

/// Where the media to transcribe comes from.
enum Media {
    /// A URL Deepgram fetches itself.
    Url(String),
    /// Bytes sent with the request.
    Upload { bytes: Bytes, content_type: String },
}

/// Transcribes `media` and stores the transcript on `project`.
async fn run_transcription(
    state: &AppState,
    transcriber: &dyn Transcriber,
    project: project::Model,
    media: Media,
) -> ApiResult<project::Model> {
    let repo = ProjectRepository::new(state.conn());
    let project = repo.set_status(project, ProcessingStatus::Processing).await?;

    let result = match media {
        Media::Url(url) => transcriber.transcribe_url(&url).await,
        Media::Upload {
            bytes,
            content_type,
        } => transcriber.transcribe_bytes(bytes, &content_type).await,
    };
    let result = match result {
        Ok(result) => result,
        Err(e) => {
            error!(project_id = %project.id, error = %e, "Transcription failed");
            repo.mark_failed(project, &e.provider_message()).await?;
            return Err(e.into());
        }
    };

    let project = repo
        .store_transcript(
            project,
            format_with_speakers(&result),
            duration_seconds(&result),
            Some(transcript_metadata(&result)),
        )
        .await?;

    info!(
        project_id = %project.id,
        duration = ?project.duration,
        "Transcript stored"
    );
    Ok(project)
}

/// POST /projects/{id}/transcribe - Run Deepgram over the project's media.
async fn transcribe(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<project::Model>> {
    let transcriber = state.transcriber()?.clone();
    let project = owned_project(&state, id, auth.user_id()).await?;

    let Some(url) = project
        .file_url
        .clone()
        .or_else(|| project.source_url.clone())
    else {
        return Err(ApiError::validation("Project has no media to transcribe"));
    };

    run_transcription(&state, transcriber.as_ref(), project, Media::Url(url))
        .await
        .map(Json)
}

/// POST /projects/{id}/transcribe/upload - Transcribe media sent as the
/// multipart `file` field, for media with no public URL.
async fn transcribe_upload(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> ApiResult<Json<project::Model>> {
    let transcriber = state.transcriber()?.clone();
    let project = owned_project(&state, id, auth.user_id()).await?;
    let form = read_form(multipart).await?;

    let media = Media::Upload {
        bytes: form.file,
        content_type: form.content_type,
    };
    run_transcription(&state, transcriber.as_ref(), project, media)
        .await
        .map(Json)
}

/// POST /projects/{id}/generate - Generate content from the transcript.
async fn generate(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<GenerateBody>,
) -> ApiResult<Json<GenerateResponse>> {
    if body.types.is_empty() {
        return Err(ApiError::validation("At least one content type is required"));
    }
    if body
        .types
        .iter()
        .any(|t| t.count == 0 || t.count > MAX_PIECES_PER_TYPE)
    {
        return Err(ApiError::validation(format!(
            "Count must be between 1 and {MAX_PIECES_PER_TYPE}"
        )));
    }

    let generator = state.content()?.clone();
    let project = owned_project(&state, id, auth.user_id()).await?;
    let transcript = require_transcript(&project)?;

    let voice = match project.brand_id {
        Some(brand_id) => BrandRepository::new(state.conn())
            .find_owned(brand_id, auth.user_id())
            .await?
            .as_ref()
            .and_then(brand_voice),
        None => None,
    };

    let types: Vec<(ContentKind, u32)> = body.types.iter().map(|t| (t.kind, t.count)).collect();
    let results = generate_multiple(
        generator.as_ref(),
        transcript,
        &types,
        body.tone.unwrap_or_default(),
        voice.as_deref(),
    )
    .await;

    let mut summaries = Vec::new();
    let mut failed_types = Vec::new();
    let mut pending = Vec::new();
    for (kind, pieces) in results {
        if pieces.is_empty() {
            failed_types.push(kind);
            continue;
        }
        match OutputType::from_kind(kind) {
            Some(output_type) => pending.extend(pieces.into_iter().map(|content| NewOutput {
                output_type,
                title: None,
                content,
            })),
            None => summaries.extend(pieces),
        }
    }

    let outputs = if pending.is_empty() {
        Vec::new()
    } else {
        OutputRepository::new(state.conn())
            .create_many(project.id, auth.user_id(), pending)
            .await?
    };

    info!(
        project_id = %project.id,
        stored = outputs.len(),
        failed = failed_types.len(),
        "Content generated"
    );

    Ok(Json(GenerateResponse {
        outputs,
        summaries,
        failed_types,
    }))
}

/// GET /projects/{id}/outputs
async fn list_outputs(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ListResponse<output::Model>>> {
    let project = owned_project(&state, id, auth.user_id()).await?;
    let data = OutputRepository::new(state.conn())
        .list_by_project(project.id, auth.user_id())
        .await?;
    Ok(Json(ListResponse { data }))
}

/// GET /projects/{id}/insights - Topics, quotes, summary and sentiment.
async fn insights(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Insights>> {
    let generator = state.content()?.clone();
    let project = owned_project(&state, id, auth.user_id()).await?;
    let transcript = require_transcript(&project)?;

    Ok(Json(generator.extract_insights(transcript).await?))
}
