//! Mock implementations of port traits
//!
//! These are in-memory implementations that can be configured for testing.
//! They store data in memory and allow tests to verify behavior.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::domain::entities::{Scene, SceneId, Story, StoryId, StoryStatus};
use crate::domain::ports::{
    GeneratedImage, GenerationRequest, ImageGenerator, SceneRepository, StoryRepository,
};
use crate::error::{DomainError, GenerationError};

fn unavailable() -> DomainError {
    DomainError::Storage("mock storage unavailable".to_string())
}

// ============================================================================
// In-Memory Story Repository
// ============================================================================

#[derive(Clone, Default)]
pub struct InMemoryStoryRepository {
    stories: Arc<RwLock<HashMap<StoryId, Story>>>,
    /// Shared with any scene repository linked to this one
    scenes: Arc<RwLock<HashMap<SceneId, Scene>>>,
    unavailable: bool,
}

impl InMemoryStoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call fails with a storage error
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    /// Pre-populate with a story for testing
    pub fn with_story(self, story: Story) -> Self {
        self.stories.write().unwrap().insert(story.id, story);
        self
    }

    pub fn get(&self, id: &StoryId) -> Option<Story> {
        self.stories.read().unwrap().get(id).cloned()
    }

    pub fn count(&self) -> usize {
        self.stories.read().unwrap().len()
    }

    /// Overwrite a stored status, as another writer would
    pub fn set_status(&self, id: &StoryId, status: StoryStatus) {
        if let Some(story) = self.stories.write().unwrap().get_mut(id) {
            story.status = status;
        }
    }
}

#[async_trait]
impl StoryRepository for InMemoryStoryRepository {
    async fn find_by_id(&self, id: &StoryId) -> Result<Option<Story>, DomainError> {
        if self.unavailable {
            return Err(unavailable());
        }
        Ok(self.get(id))
    }

    async fn list(&self, status: Option<StoryStatus>) -> Result<Vec<Story>, DomainError> {
        if self.unavailable {
            return Err(unavailable());
        }
        let stories = self.stories.read().unwrap();
        let mut matching: Vec<Story> = stories
            .values()
            .filter(|s| status.map_or(true, |wanted| s.status == wanted))
            .cloned()
            .collect();
        matching.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.0.cmp(&b.id.0))
        });
        Ok(matching)
    }

    async fn create(&self, story: &Story) -> Result<Story, DomainError> {
        if self.unavailable {
            return Err(unavailable());
        }
        let mut stories = self.stories.write().unwrap();
        if stories.contains_key(&story.id) {
            return Err(DomainError::Conflict(format!(
                "Story {} already exists",
                story.id
            )));
        }
        stories.insert(story.id, story.clone());
        Ok(story.clone())
    }

    async fn transition_status(
        &self,
        id: &StoryId,
        from: StoryStatus,
        to: StoryStatus,
        at: DateTime<Utc>,
    ) -> Result<bool, DomainError> {
        if self.unavailable {
            return Err(unavailable());
        }
        let mut stories = self.stories.write().unwrap();
        match stories.get_mut(id) {
            Some(story) if story.status == from => {
                story.status = to;
                story.updated_at = at;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn complete(&self, id: &StoryId, at: DateTime<Utc>) -> Result<bool, DomainError> {
        if self.unavailable {
            return Err(unavailable());
        }
        // Same lock order as InMemorySceneRepository::create: stories, then scenes
        let mut stories = self.stories.write().unwrap();
        let scenes = self.scenes.read().unwrap();
        let Some(story) = stories.get_mut(id) else {
            return Ok(false);
        };
        let mut owned = scenes.values().filter(|s| s.story_id == *id).peekable();
        let ready = story.status == StoryStatus::InProgress
            && owned.peek().is_some()
            && owned.all(Scene::is_resolved);
        if ready {
            story.status = StoryStatus::Completed;
            story.updated_at = at;
        }
        Ok(ready)
    }
}

// ============================================================================
// In-Memory Scene Repository
// ============================================================================

#[derive(Clone, Default)]
pub struct InMemorySceneRepository {
    scenes: Arc<RwLock<HashMap<SceneId, Scene>>>,
    /// Set by `linked_to`; inserts then check the parent story
    stories: Option<Arc<RwLock<HashMap<StoryId, Story>>>>,
    fail_creates: bool,
    fail_updates: bool,
}

impl InMemorySceneRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts fail with a storage error
    pub fn failing_creates() -> Self {
        Self {
            fail_creates: true,
            ..Self::default()
        }
    }

    /// Updates fail with a storage error (inserts still work)
    pub fn failing_updates() -> Self {
        Self {
            fail_updates: true,
            ..Self::default()
        }
    }

    /// Share storage with a story repository, so inserts see the parent
    /// story and completion sees every scene
    pub fn linked_to(mut self, stories: &InMemoryStoryRepository) -> Self {
        let existing: Vec<Scene> = self.scenes.read().unwrap().values().cloned().collect();
        self.scenes = stories.scenes.clone();
        self.stories = Some(stories.stories.clone());
        for scene in existing {
            self.insert(scene);
        }
        self
    }

    /// Pre-populate with a scene for testing
    pub fn with_scene(self, scene: Scene) -> Self {
        self.insert(scene);
        self
    }

    /// Store a scene as is, bypassing position assignment
    pub fn insert(&self, scene: Scene) {
        self.scenes.write().unwrap().insert(scene.id, scene);
    }

    pub fn get(&self, id: &SceneId) -> Option<Scene> {
        self.scenes.read().unwrap().get(id).cloned()
    }

    pub fn count(&self) -> usize {
        self.scenes.read().unwrap().len()
    }
}

#[async_trait]
impl SceneRepository for InMemorySceneRepository {
    async fn find_by_id(&self, id: &SceneId) -> Result<Option<Scene>, DomainError> {
        Ok(self.get(id))
    }

    async fn find_by_story(&self, story_id: &StoryId) -> Result<Vec<Scene>, DomainError> {
        let scenes = self.scenes.read().unwrap();
        let mut matching: Vec<Scene> = scenes
            .values()
            .filter(|s| s.story_id == *story_id)
            .cloned()
            .collect();
        matching.sort_by_key(|s| s.position);
        Ok(matching)
    }

    async fn create(&self, scene: &Scene) -> Result<Scene, DomainError> {
        if self.fail_creates {
            return Err(unavailable());
        }
        let stories = self.stories.as_ref().map(|stories| stories.read().unwrap());
        if let Some(stories) = &stories {
            let story = stories.get(&scene.story_id).ok_or_else(|| {
                DomainError::NotFound(format!("Story {} not found", scene.story_id))
            })?;
            if !story.accepts_scenes() {
                return Err(DomainError::InvalidState(format!(
                    "Story {} is {}",
                    story.id, story.status
                )));
            }
        }
        let mut scenes = self.scenes.write().unwrap();
        let position = scenes
            .values()
            .filter(|s| s.story_id == scene.story_id)
            .count() as i32;

        let mut stored = scene.clone();
        stored.position = position;
        scenes.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn update(&self, scene: &Scene, expected_version: i64) -> Result<Scene, DomainError> {
        if self.fail_updates {
            return Err(unavailable());
        }
        let mut scenes = self.scenes.write().unwrap();
        let current = scenes
            .get(&scene.id)
            .ok_or_else(|| DomainError::NotFound(format!("Scene {} not found", scene.id)))?;
        if current.version != expected_version {
            return Err(DomainError::Conflict(format!(
                "Scene {} was modified concurrently",
                scene.id
            )));
        }

        let mut stored = scene.clone();
        stored.version = expected_version + 1;
        scenes.insert(stored.id, stored.clone());
        Ok(stored)
    }
}

// ============================================================================
// Stub Image Generator
// ============================================================================

#[derive(Debug, Clone, Copy)]
enum StubBehavior {
    Succeed,
    Unavailable,
    Rejected,
    Empty,
    Duplicates,
    Slow(Duration),
}

/// Image generator with a fixed outcome that records every request
#[derive(Clone)]
pub struct StubImageGenerator {
    behavior: StubBehavior,
    requests: Arc<RwLock<Vec<GenerationRequest>>>,
}

impl Default for StubImageGenerator {
    fn default() -> Self {
        Self::with_behavior(StubBehavior::Succeed)
    }
}

impl StubImageGenerator {
    fn with_behavior(behavior: StubBehavior) -> Self {
        Self {
            behavior,
            requests: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Returns `count` distinct images
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails like a backend that is down (transient)
    pub fn unavailable() -> Self {
        Self::with_behavior(StubBehavior::Unavailable)
    }

    /// Fails like a backend rejecting the prompt (permanent)
    pub fn rejecting() -> Self {
        Self::with_behavior(StubBehavior::Rejected)
    }

    pub fn empty() -> Self {
        Self::with_behavior(StubBehavior::Empty)
    }

    pub fn duplicates() -> Self {
        Self::with_behavior(StubBehavior::Duplicates)
    }

    /// Succeeds after sleeping for `delay`
    pub fn slow(delay: Duration) -> Self {
        Self::with_behavior(StubBehavior::Slow(delay))
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.read().unwrap().clone()
    }
}

fn images(count: u32) -> Vec<GeneratedImage> {
    let batch = uuid::Uuid::new_v4();
    (0..count)
        .map(|i| GeneratedImage {
            url: format!("https://images.test/{}/{}.png", batch, i),
        })
        .collect()
}

#[async_trait]
impl ImageGenerator for StubImageGenerator {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<Vec<GeneratedImage>, GenerationError> {
        self.requests.write().unwrap().push(request.clone());

        match self.behavior {
            StubBehavior::Succeed => Ok(images(request.count)),
            StubBehavior::Unavailable => Err(GenerationError::Api {
                status: 503,
                message: "backend overloaded".to_string(),
            }),
            StubBehavior::Rejected => Err(GenerationError::Api {
                status: 400,
                message: "prompt rejected by content policy".to_string(),
            }),
            StubBehavior::Empty => Ok(Vec::new()),
            StubBehavior::Duplicates => {
                let url = "https://images.test/same.png".to_string();
                Ok(vec![
                    GeneratedImage { url: url.clone() },
                    GeneratedImage { url },
                ])
            }
            StubBehavior::Slow(delay) => {
                tokio::time::sleep(delay).await;
                Ok(images(request.count))
            }
        }
    }
}
