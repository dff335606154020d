//! Scene handlers
//!
//! Endpoints for generating scenes and selecting their images.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ApiResponse;
use crate::domain::entities::{Image, Scene, SceneId, SceneRequest, SceneStatus, StoryId};
use crate::error::AppError;
use crate::AppState;

/// Request to select a scene image
#[derive(Debug, Deserialize)]
pub struct UpdateSceneRequest {
    /// Reference of one of the scene's candidates
    pub selected_image: String,
}

/// Scene as returned to clients
#[derive(Debug, Serialize)]
pub struct SceneResponse {
    pub id: String,
    pub story_id: String,
    pub position: i32,
    pub description: String,
    pub style: Option<String>,
    pub candidate_count: u32,
    pub status: SceneStatus,
    pub candidates: Vec<Image>,
    pub selected_image: Option<Image>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    pub version: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Scene> for SceneResponse {
    fn from(s: Scene) -> Self {
        SceneResponse {
            id: s.id.to_string(),
            story_id: s.story_id.to_string(),
            position: s.position,
            description: s.description,
            style: s.style,
            candidate_count: s.candidate_count,
            status: s.status,
            candidates: s.candidates,
            selected_image: s.selected_image,
            failure_reason: s.failure_reason,
            version: s.version,
            created_at: s.created_at.to_rfc3339(),
            updated_at: s.updated_at.to_rfc3339(),
        }
    }
}

/// POST /stories/:story_id/scenes
///
/// Create a scene and generate its candidate images. Blocks until the backend
/// answers or the generation timeout expires.
pub async fn create_scene(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    request: Result<Json<SceneRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<SceneResponse>>, AppError> {
    let Path(story_id) = path?;
    let Json(request) = request?;

    let scene = state
        .story_service
        .create_scene(&StoryId(story_id), request)
        .await?;

    tracing::info!(
        story_id = %story_id,
        scene_id = %scene.id,
        candidates = scene.candidates.len(),
        "Scene generated"
    );

    Ok(Json(ApiResponse::new(scene.into())))
}

/// GET /stories/:story_id/scenes
pub async fn list_scenes(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<ApiResponse<Vec<SceneResponse>>>, AppError> {
    let Path(story_id) = path?;
    let scenes = state.story_service.list_scenes(&StoryId(story_id)).await?;

    Ok(Json(ApiResponse::new(
        scenes.into_iter().map(SceneResponse::from).collect(),
    )))
}

/// GET /stories/:story_id/scenes/:scene_id
pub async fn get_scene(
    State(state): State<AppState>,
    path: Result<Path<(Uuid, Uuid)>, PathRejection>,
) -> Result<Json<ApiResponse<SceneResponse>>, AppError> {
    let Path((story_id, scene_id)) = path?;
    let scene = state
        .story_service
        .get_scene(&StoryId(story_id), &SceneId(scene_id))
        .await?;

    Ok(Json(ApiResponse::new(scene.into())))
}

/// PUT /stories/:story_id/scenes/:scene_id
///
/// Select one of the scene's candidates. Selecting again replaces the choice.
pub async fn update_scene(
    State(state): State<AppState>,
    path: Result<Path<(Uuid, Uuid)>, PathRejection>,
    request: Result<Json<UpdateSceneRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<SceneResponse>>, AppError> {
    let Path((story_id, scene_id)) = path?;
    let Json(request) = request?;

    let scene = state
        .story_service
        .update_scene(&StoryId(story_id), &SceneId(scene_id), &request.selected_image)
        .await?;

    Ok(Json(ApiResponse::new(scene.into())))
}

/// POST /stories/:story_id/scenes/:scene_id/generate
///
/// Retry generation for a scene left pending or failed.
pub async fn retry_scene_generation(
    State(state): State<AppState>,
    path: Result<Path<(Uuid, Uuid)>, PathRejection>,
) -> Result<Json<ApiResponse<SceneResponse>>, AppError> {
    let Path((story_id, scene_id)) = path?;
    let scene = state
        .story_service
        .retry_scene_generation(&StoryId(story_id), &SceneId(scene_id))
        .await?;

    tracing::info!(story_id = %story_id, scene_id = %scene.id, "Scene regenerated");

    Ok(Json(ApiResponse::new(scene.into())))
}
