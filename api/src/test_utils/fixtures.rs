//! Test fixtures
//!
//! Factory functions for creating test data with sensible defaults.
//! Each fixture function creates a valid entity that can be customized.

use chrono::{Duration, Utc};

use crate::domain::entities::{
    NewStory, Scene, SceneRequest, Story, StoryId, StoryStatus,
};

/// The "Dragon" story request used across scenarios
pub fn dragon_request() -> NewStory {
    NewStory {
        name: "Dragon".to_string(),
        mood: "epic".to_string(),
        category: "fantasy".to_string(),
        description: "A dragon guards the last library".to_string(),
        customer_id: "c1".to_string(),
    }
}

/// Create a test story with default values
pub fn test_story() -> Story {
    Story::draft(dragon_request(), Utc::now())
}

/// Create a test story with a specific status
pub fn test_story_with_status(status: StoryStatus) -> Story {
    let mut story = test_story();
    story.status = status;
    story
}

/// Create a test story created `minutes_ago`
pub fn test_story_created(minutes_ago: i64, status: StoryStatus) -> Story {
    let at = Utc::now() - Duration::minutes(minutes_ago);
    let mut story = test_story_with_status(status);
    story.created_at = at;
    story.updated_at = at;
    story
}

/// Scene parameters with default values
pub fn scene_request() -> SceneRequest {
    SceneRequest {
        description: "The dragon wakes above the burning stacks".to_string(),
        style: Some("watercolor".to_string()),
        candidate_count: None,
    }
}

/// Create a generated scene with `candidates` images
pub fn test_scene(story_id: StoryId, candidates: usize) -> Scene {
    let mut scene = Scene::pending(story_id, scene_request(), candidates as u32, Utc::now());
    scene.record_candidates(
        (0..candidates)
            .map(|i| format!("https://images.test/{}/{}.png", scene.id, i))
            .collect(),
        Utc::now(),
    );
    scene
}

/// Create a scene still awaiting generation
pub fn test_pending_scene(story_id: StoryId) -> Scene {
    Scene::pending(story_id, scene_request(), 4, Utc::now())
}
