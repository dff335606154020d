//! HTTP handlers
//!
//! Axum request handlers for the API endpoints. Every success body is wrapped
//! as `{"data": ...}`.

use serde::Serialize;

pub mod scenes;
pub mod stories;

pub use scenes::{create_scene, get_scene, list_scenes, retry_scene_generation, update_scene};
pub use stories::{complete_story, create_story, get_story, list_stories};

/// Success envelope
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}
