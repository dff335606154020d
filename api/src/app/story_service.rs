//! Story service
//!
//! Owns every story and scene state transition: creation, candidate
//! generation, selection and completion. Callers get typed `DomainError`s back;
//! logging and transport mapping are left to the boundary.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;

use crate::config::GenerationSettings;
use crate::domain::entities::{
    NewStory, Scene, SceneId, SceneRequest, Story, StoryId, StoryStatus,
};
use crate::domain::ports::{
    GeneratedImage, GenerationRequest, ImageGenerator, SceneRepository, StoryRepository,
};
use crate::error::{DomainError, GenerationError};

/// Service for the story and scene lifecycle
pub struct StoryService<SR, SC, IG>
where
    SR: StoryRepository + ?Sized,
    SC: SceneRepository + ?Sized,
    IG: ImageGenerator + ?Sized,
{
    stories: Arc<SR>,
    scenes: Arc<SC>,
    images: Arc<IG>,
    settings: GenerationSettings,
}

impl<SR, SC, IG> StoryService<SR, SC, IG>
where
    SR: StoryRepository + ?Sized,
    SC: SceneRepository + ?Sized,
    IG: ImageGenerator + ?Sized,
{
    pub fn new(
        stories: Arc<SR>,
        scenes: Arc<SC>,
        images: Arc<IG>,
        settings: &GenerationSettings,
    ) -> Self {
        Self {
            stories,
            scenes,
            images,
            settings: settings.clone(),
        }
    }

    // ------------------------------------------------------------------
    // Stories
    // ------------------------------------------------------------------

    /// Create a draft story
    pub async fn create_story(&self, request: NewStory) -> Result<Story, DomainError> {
        let story = Story::draft(request.validated()?, Utc::now());
        let story = self.stories.create(&story).await?;

        tracing::debug!(story_id = %story.id, "story created");
        Ok(story)
    }

    pub async fn get_story(&self, id: &StoryId) -> Result<Story, DomainError> {
        self.stories
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Story {} not found", id)))
    }

    /// Stories oldest first; `None` lists every status
    pub async fn list_stories(
        &self,
        status: Option<StoryStatus>,
    ) -> Result<Vec<Story>, DomainError> {
        self.stories.list(status).await
    }

    /// Close an in-progress story whose scenes all have a selection
    pub async fn complete_story(&self, id: &StoryId) -> Result<Story, DomainError> {
        let story = self.get_story(id).await?;
        if story.status != StoryStatus::InProgress {
            return Err(DomainError::InvalidState(format!(
                "Story {} is {}; only in_progress stories can be completed",
                id, story.status
            )));
        }

        self.require_resolved_scenes(id).await?;

        // The repository re-checks the scenes in the same write, so a scene
        // inserted after the read above still blocks completion
        let now = Utc::now();
        if !self.stories.complete(id, now).await? {
            self.require_resolved_scenes(id).await?;
            return Err(DomainError::Conflict(format!(
                "Story {} changed while completing",
                id
            )));
        }

        tracing::debug!(story_id = %id, "story completed");
        Ok(Story {
            status: StoryStatus::Completed,
            updated_at: now,
            ..story
        })
    }

    async fn require_resolved_scenes(&self, id: &StoryId) -> Result<(), DomainError> {
        let scenes = self.scenes.find_by_story(id).await?;
        if scenes.is_empty() {
            return Err(DomainError::InvalidState(format!(
                "Story {} has no scenes",
                id
            )));
        }
        if let Some(open) = scenes.iter().find(|s| !s.is_resolved()) {
            return Err(DomainError::InvalidState(format!(
                "Scene {} has no selected image",
                open.id
            )));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Scenes
    // ------------------------------------------------------------------

    /// Create a scene and generate its candidate images.
    ///
    /// The scene is persisted as pending before the backend is called, so a
    /// failure or timeout during generation always leaves an inspectable row.
    pub async fn create_scene(
        &self,
        story_id: &StoryId,
        request: SceneRequest,
    ) -> Result<Scene, DomainError> {
        let story = self.open_story(story_id).await?;
        let request = request.validated(self.settings.max_candidate_count)?;
        let count = request
            .candidate_count
            .unwrap_or(self.settings.default_candidate_count);

        let scene = self
            .scenes
            .create(&Scene::pending(story.id, request, count, Utc::now()))
            .await?;
        tracing::debug!(story_id = %story.id, scene_id = %scene.id, position = scene.position, "scene pending generation");

        self.generate_candidates(&story, scene).await
    }

    /// Re-run generation for a scene that never got candidates
    pub async fn retry_scene_generation(
        &self,
        story_id: &StoryId,
        scene_id: &SceneId,
    ) -> Result<Scene, DomainError> {
        let story = self.open_story(story_id).await?;
        let scene = self.scene_of(&story, scene_id).await?;
        if !scene.awaits_generation() {
            return Err(DomainError::InvalidState(format!(
                "Scene {} already has candidates",
                scene_id
            )));
        }

        self.generate_candidates(&story, scene).await
    }

    pub async fn get_scene(
        &self,
        story_id: &StoryId,
        scene_id: &SceneId,
    ) -> Result<Scene, DomainError> {
        let story = self.get_story(story_id).await?;
        self.scene_of(&story, scene_id).await
    }

    /// Scenes of a story in creation order
    pub async fn list_scenes(&self, story_id: &StoryId) -> Result<Vec<Scene>, DomainError> {
        let story = self.get_story(story_id).await?;
        self.scenes.find_by_story(&story.id).await
    }

    /// Select one of the scene's candidates, replacing any earlier selection
    pub async fn update_scene(
        &self,
        story_id: &StoryId,
        scene_id: &SceneId,
        selected_image: &str,
    ) -> Result<Scene, DomainError> {
        let story = self.get_story(story_id).await?;
        let mut scene = self.scene_of(&story, scene_id).await?;
        let expected_version = scene.version;

        if !scene.select(selected_image, Utc::now())? {
            return Ok(scene);
        }

        let scene = self.scenes.update(&scene, expected_version).await?;
        tracing::debug!(story_id = %story.id, scene_id = %scene.id, "scene image selected");
        Ok(scene)
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    async fn open_story(&self, id: &StoryId) -> Result<Story, DomainError> {
        let story = self.get_story(id).await?;
        if !story.accepts_scenes() {
            return Err(DomainError::InvalidState(format!(
                "Story {} is {}; scenes can only be added to draft or in_progress stories",
                id, story.status
            )));
        }
        Ok(story)
    }

    async fn scene_of(&self, story: &Story, scene_id: &SceneId) -> Result<Scene, DomainError> {
        self.scenes
            .find_by_id(scene_id)
            .await?
            .filter(|scene| scene.story_id == story.id)
            .ok_or_else(|| {
                DomainError::NotFound(format!(
                    "Scene {} not found in story {}",
                    scene_id, story.id
                ))
            })
    }

    /// Call the backend and persist the outcome on the scene.
    ///
    /// On timeout nothing is written and the scene keeps its current state.
    async fn generate_candidates(&self, story: &Story, mut scene: Scene) -> Result<Scene, DomainError> {
        let request = GenerationRequest {
            prompt: scene.description.clone(),
            style: scene.style.clone(),
            mood: story.mood.clone(),
            category: story.category.clone(),
            count: scene.candidate_count,
        };

        let outcome =
            match tokio::time::timeout(self.settings.timeout, self.images.generate(&request)).await
            {
                Ok(result) => result.and_then(unique_references),
                Err(_) => {
                    return Err(DomainError::Cancelled(format!(
                        "Image generation for scene {} exceeded {}s; the scene can be retried",
                        scene.id,
                        self.settings.timeout.as_secs()
                    )));
                }
            };

        let expected_version = scene.version;
        match outcome {
            Ok(references) => {
                scene.record_candidates(references, Utc::now());
                let scene = self.scenes.update(&scene, expected_version).await?;
                tracing::debug!(scene_id = %scene.id, candidates = scene.candidates.len(), "scene generated");

                self.advance_story(story, StoryStatus::InProgress).await?;
                Ok(scene)
            }
            Err(err) => {
                scene.record_failure(err.to_string(), Utc::now());
                self.scenes.update(&scene, expected_version).await?;
                tracing::debug!(scene_id = %scene.id, permanent = err.is_permanent(), "scene generation failed");

                if err.is_permanent() {
                    self.advance_story(story, StoryStatus::Failed).await?;
                }
                Err(DomainError::Generation(err.to_string()))
            }
        }
    }

    /// Move the story towards `to`, re-reading it if another request moved it
    /// first. A story already at or past `to` is left alone.
    async fn advance_story(&self, story: &Story, to: StoryStatus) -> Result<(), DomainError> {
        let mut current = story.status;

        while current.can_transition_to(to) {
            if self
                .stories
                .transition_status(&story.id, current, to, Utc::now())
                .await?
            {
                tracing::debug!(story_id = %story.id, from = %current, to = %to, "story status changed");
                return Ok(());
            }

            current = match self.stories.find_by_id(&story.id).await? {
                Some(fresh) => fresh.status,
                None => return Ok(()),
            };
        }

        Ok(())
    }
}

/// Candidate references in backend order; empty or repeated sets are rejected
fn unique_references(images: Vec<GeneratedImage>) -> Result<Vec<String>, GenerationError> {
    if images.is_empty() {
        return Err(GenerationError::EmptyResult);
    }

    let mut seen = HashSet::with_capacity(images.len());
    let mut references = Vec::with_capacity(images.len());
    for image in images {
        if !seen.insert(image.url.clone()) {
            return Err(GenerationError::DuplicateReference(image.url));
        }
        references.push(image.url);
    }
    Ok(references)
}
