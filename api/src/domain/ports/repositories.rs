//! Repository port traits
//!
//! These traits define the interface for story and scene persistence.
//! Implementations are provided by adapters (e.g., PostgreSQL).

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::entities::{Scene, SceneId, Story, StoryId, StoryStatus};
use crate::error::DomainError;

/// Repository for Story entities
#[async_trait]
pub trait StoryRepository: Send + Sync {
    /// Find a story by ID
    async fn find_by_id(&self, id: &StoryId) -> Result<Option<Story>, DomainError>;

    /// List stories, oldest first, optionally restricted to one status
    async fn list(&self, status: Option<StoryStatus>) -> Result<Vec<Story>, DomainError>;

    /// Insert a new story
    async fn create(&self, story: &Story) -> Result<Story, DomainError>;

    /// Move a story from `from` to `to` if it is still in `from`.
    ///
    /// Returns `false` when the story was not in `from` (or is gone).
    async fn transition_status(
        &self,
        id: &StoryId,
        from: StoryStatus,
        to: StoryStatus,
        at: DateTime<Utc>,
    ) -> Result<bool, DomainError>;

    /// Move an in-progress story to completed, checking in the same write
    /// that it has at least one scene and every scene has a selected image.
    ///
    /// Returns `false` when any of those conditions does not hold.
    async fn complete(&self, id: &StoryId, at: DateTime<Utc>) -> Result<bool, DomainError>;
}

/// Repository for Scene entities
#[async_trait]
pub trait SceneRepository: Send + Sync {
    /// Find a scene by ID
    async fn find_by_id(&self, id: &SceneId) -> Result<Option<Scene>, DomainError>;

    /// Scenes of a story ordered by position
    async fn find_by_story(&self, story_id: &StoryId) -> Result<Vec<Scene>, DomainError>;

    /// Insert a new scene, assigning the next position within its story.
    ///
    /// Fails with `NotFound` when the story is gone and `InvalidState` when it
    /// is already completed or failed at insert time.
    async fn create(&self, scene: &Scene) -> Result<Scene, DomainError>;

    /// Write the scene if its stored version still equals `expected_version`.
    ///
    /// The stored version becomes `expected_version + 1`. Fails with
    /// `Conflict` when another write got there first and `NotFound` when the
    /// scene no longer exists.
    async fn update(&self, scene: &Scene, expected_version: i64) -> Result<Scene, DomainError>;
}
