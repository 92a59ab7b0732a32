//! Project state endpoint handlers.

use std::time::Instant;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use codeloom_types::project::{ProjectPatch, ProjectState};

use crate::http::error::AppError;
use crate::http::extractors::auth::Authenticated;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Sandbox policy for previewed files: scripts run, but in an opaque origin.
pub const PREVIEW_CSP: &str = "sandbox allow-scripts";

/// Request body for writing one file.
#[derive(Debug, Deserialize)]
pub struct PutFileRequest {
    pub name: String,
    pub content: String,
}

fn envelope(state: ProjectState, start: Instant) -> Json<ApiResponse<ProjectState>> {
    let resp = ApiResponse::success(
        state,
        uuid::Uuid::now_v7().to_string(),
        start.elapsed().as_millis() as u64,
    )
    .with_link("self", "/api/v1/project");
    Json(resp)
}

/// GET /api/v1/project - The caller's project (default when none stored).
pub async fn get_project(
    State(state): State<AppState>,
    Authenticated(user_id): Authenticated,
) -> Result<Json<ApiResponse<ProjectState>>, AppError> {
    let start = Instant::now();
    let project = state.project_service.load_or_default(&user_id).await?;
    Ok(envelope(project, start))
}

/// PUT /api/v1/project - Replace the whole state.
pub async fn replace_project(
    State(state): State<AppState>,
    Authenticated(user_id): Authenticated,
    Json(body): Json<ProjectState>,
) -> Result<Json<ApiResponse<ProjectState>>, AppError> {
    let start = Instant::now();
    let project = state.project_service.replace(&user_id, body).await?;
    Ok(envelope(project, start))
}

/// PATCH /api/v1/project - Union technologies/libraries, overwrite metadata keys.
pub async fn patch_project(
    State(state): State<AppState>,
    Authenticated(user_id): Authenticated,
    Json(body): Json<ProjectPatch>,
) -> Result<Json<ApiResponse<ProjectState>>, AppError> {
    let start = Instant::now();
    let project = state.project_service.apply_patch(&user_id, body).await?;
    Ok(envelope(project, start))
}

/// DELETE /api/v1/project - Reset to the default project.
pub async fn reset_project(
    State(state): State<AppState>,
    Authenticated(user_id): Authenticated,
) -> Result<Json<ApiResponse<ProjectState>>, AppError> {
    let start = Instant::now();
    state.project_service.reset(&user_id).await?;
    Ok(envelope(ProjectState::default(), start))
}

/// PUT /api/v1/project/files - Merge one file into the stored state.
pub async fn put_file(
    State(state): State<AppState>,
    Authenticated(user_id): Authenticated,
    Json(body): Json<PutFileRequest>,
) -> Result<Json<ApiResponse<ProjectState>>, AppError> {
    let start = Instant::now();
    let project = state
        .project_service
        .apply_generated_file(&user_id, &body.name, &body.content)
        .await?;
    Ok(envelope(project, start))
}

/// DELETE /api/v1/project/files/{name} - Remove one file.
pub async fn delete_file(
    State(state): State<AppState>,
    Authenticated(user_id): Authenticated,
    Path(name): Path<String>,
) -> Result<Json<ApiResponse<ProjectState>>, AppError> {
    let start = Instant::now();
    let project = state.project_service.delete_file(&user_id, &name).await?;
    Ok(envelope(project, start))
}

/// GET /api/v1/project/preview/{name} - Raw file content for a sandboxed preview.
pub async fn preview_file(
    State(state): State<AppState>,
    Authenticated(user_id): Authenticated,
    Path(name): Path<String>,
) -> Result<Response, AppError> {
    let project = state.project_service.load_or_default(&user_id).await?;
    let file = project
        .file(&name)
        .ok_or_else(|| AppError::NotFound(format!("file '{name}' not found in project")))?;

    Ok((
        [
            (header::CONTENT_TYPE, content_type_for(&name)),
            (header::CONTENT_SECURITY_POLICY, PREVIEW_CSP),
            (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
        ],
        file.content.clone(),
    )
        .into_response())
}

/// Content type for a previewed file, by extension.
pub fn content_type_for(name: &str) -> &'static str {
    let ext = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" | "mjs" => "text/javascript; charset=utf-8",
        "json" => "application/json",
        "svg" => "image/svg+xml",
        _ => "text/plain; charset=utf-8",
    }
}
