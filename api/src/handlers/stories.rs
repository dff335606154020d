//! Story handlers
//!
//! Endpoints for creating, reading and completing stories.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::header,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ApiResponse;
use crate::domain::entities::{NewStory, Story, StoryId, StoryStatus};
use crate::error::{AppError, DomainError};
use crate::AppState;

/// Query parameters for listing stories
#[derive(Debug, Deserialize)]
pub struct ListStoriesQuery {
    /// One of `draft`, `in_progress`, `completed`, `failed`; empty means all
    #[serde(default)]
    pub status: Option<String>,
}

impl ListStoriesQuery {
    fn status_filter(&self) -> Result<Option<StoryStatus>, DomainError> {
        match self.status.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => raw.parse::<StoryStatus>().map(Some).map_err(DomainError::Validation),
        }
    }
}

/// Story as returned to clients
#[derive(Debug, Serialize)]
pub struct StoryResponse {
    pub id: String,
    pub name: String,
    pub mood: String,
    pub category: String,
    pub description: String,
    pub customer_id: String,
    pub status: StoryStatus,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Story> for StoryResponse {
    fn from(s: Story) -> Self {
        StoryResponse {
            id: s.id.to_string(),
            name: s.name,
            mood: s.mood,
            category: s.category,
            description: s.description,
            customer_id: s.customer_id,
            status: s.status,
            created_at: s.created_at.to_rfc3339(),
            updated_at: s.updated_at.to_rfc3339(),
        }
    }
}

/// POST /stories
///
/// Create a draft story. The body is `{"data": "done"}`; the new story's
/// location is in the `Location` header.
pub async fn create_story(
    State(state): State<AppState>,
    request: Result<Json<NewStory>, JsonRejection>,
) -> Result<([(header::HeaderName, String); 1], Json<ApiResponse<&'static str>>), AppError> {
    let Json(request) = request?;
    let story = state.story_service.create_story(request).await?;

    tracing::info!(story_id = %story.id, customer_id = %story.customer_id, "Story created");

    Ok((
        [(header::LOCATION, format!("/stories/{}", story.id))],
        Json(ApiResponse::new("done")),
    ))
}

/// GET /stories/:story_id
pub async fn get_story(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<ApiResponse<StoryResponse>>, AppError> {
    let Path(id) = path?;
    let story = state.story_service.get_story(&StoryId(id)).await?;

    Ok(Json(ApiResponse::new(story.into())))
}

/// GET /stories?status=
///
/// List stories, oldest first.
pub async fn list_stories(
    State(state): State<AppState>,
    query: Result<Query<ListStoriesQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<StoryResponse>>>, AppError> {
    let Query(query) = query?;
    let stories = state
        .story_service
        .list_stories(query.status_filter()?)
        .await?;

    Ok(Json(ApiResponse::new(
        stories.into_iter().map(StoryResponse::from).collect(),
    )))
}

/// POST /stories/:story_id/complete
///
/// Close a story once every scene has a selected image.
pub async fn complete_story(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<ApiResponse<StoryResponse>>, AppError> {
    let Path(id) = path?;
    let story = state.story_service.complete_story(&StoryId(id)).await?;

    tracing::info!(story_id = %story.id, "Story completed");

    Ok(Json(ApiResponse::new(story.into())))
}
