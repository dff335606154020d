//! Scene domain entity
//!
//! A scene belongs to exactly one story. Image generation fills its candidate
//! set once, and the caller then selects (and may re-select) one candidate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::story::StoryId;
use crate::error::DomainError;

const MAX_SCENE_DESCRIPTION_LEN: usize = 2000;
const MAX_STYLE_LEN: usize = 100;

/// Unique identifier for a scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SceneId(pub Uuid);

impl SceneId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SceneId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for SceneId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for SceneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Progress of a scene's candidate generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SceneStatus {
    /// Persisted, candidates not yet written
    PendingGeneration,
    /// Candidate set written
    Generated,
    /// Backend failed; see `failure_reason`
    GenerationFailed,
}

impl std::fmt::Display for SceneStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SceneStatus::PendingGeneration => write!(f, "pending_generation"),
            SceneStatus::Generated => write!(f, "generated"),
            SceneStatus::GenerationFailed => write!(f, "generation_failed"),
        }
    }
}

impl std::str::FromStr for SceneStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending_generation" => Ok(SceneStatus::PendingGeneration),
            "generated" => Ok(SceneStatus::Generated),
            "generation_failed" => Ok(SceneStatus::GenerationFailed),
            _ => Err(format!("Unknown scene status: {}", s)),
        }
    }
}

/// A generated candidate image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    /// URL or content identifier returned by the backend
    pub reference: String,
    /// Order within the candidate set
    pub position: i32,
}

/// Scene generation parameters supplied by the caller
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SceneRequest {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub candidate_count: Option<u32>,
}

impl SceneRequest {
    /// Trim the text fields and check them, plus the requested candidate count
    pub fn validated(self, max_candidates: u32) -> Result<Self, DomainError> {
        let description = self.description.trim().to_string();
        if description.is_empty() {
            return Err(DomainError::Validation(
                "description is required".to_string(),
            ));
        }
        if description.chars().count() > MAX_SCENE_DESCRIPTION_LEN {
            return Err(DomainError::Validation(format!(
                "description must be at most {} characters",
                MAX_SCENE_DESCRIPTION_LEN
            )));
        }

        let style = self
            .style
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        if let Some(style) = &style {
            if style.chars().count() > MAX_STYLE_LEN {
                return Err(DomainError::Validation(format!(
                    "style must be at most {} characters",
                    MAX_STYLE_LEN
                )));
            }
        }

        if let Some(count) = self.candidate_count {
            if count == 0 || count > max_candidates {
                return Err(DomainError::Validation(format!(
                    "candidate_count must be between 1 and {}",
                    max_candidates
                )));
            }
        }

        Ok(SceneRequest {
            description,
            style,
            candidate_count: self.candidate_count,
        })
    }
}

/// A scene within a story
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scene {
    pub id: SceneId,
    pub story_id: StoryId,
    /// 0-based order within the story, assigned on insert
    pub position: i32,
    pub description: String,
    pub style: Option<String>,
    pub candidate_count: u32,
    pub status: SceneStatus,
    pub candidates: Vec<Image>,
    pub selected_image: Option<Image>,
    pub failure_reason: Option<String>,
    /// Bumped on every persisted write
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Scene {
    /// A scene awaiting generation. Position is assigned by persistence.
    pub fn pending(
        story_id: StoryId,
        request: SceneRequest,
        candidate_count: u32,
        now: DateTime<Utc>,
    ) -> Self {
        Scene {
            id: SceneId::new(),
            story_id,
            position: 0,
            description: request.description,
            style: request.style,
            candidate_count,
            status: SceneStatus::PendingGeneration,
            candidates: Vec::new(),
            selected_image: None,
            failure_reason: None,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Only scenes without a candidate set can (re)run generation
    pub fn awaits_generation(&self) -> bool {
        matches!(
            self.status,
            SceneStatus::PendingGeneration | SceneStatus::GenerationFailed
        ) && self.candidates.is_empty()
    }

    pub fn is_resolved(&self) -> bool {
        self.selected_image.is_some()
    }

    pub fn candidate(&self, reference: &str) -> Option<&Image> {
        self.candidates.iter().find(|i| i.reference == reference)
    }

    /// Replace the (empty) candidate set with the generated images, in order
    pub fn record_candidates(&mut self, references: Vec<String>, now: DateTime<Utc>) {
        self.candidates = references
            .into_iter()
            .enumerate()
            .map(|(i, reference)| Image {
                reference,
                position: i as i32,
            })
            .collect();
        self.status = SceneStatus::Generated;
        self.failure_reason = None;
        self.updated_at = now;
    }

    pub fn record_failure(&mut self, reason: String, now: DateTime<Utc>) {
        self.status = SceneStatus::GenerationFailed;
        self.failure_reason = Some(reason);
        self.updated_at = now;
    }

    /// Select a candidate by reference.
    ///
    /// Returns `Ok(false)` when that candidate is already selected, so the
    /// caller can skip the write.
    pub fn select(&mut self, reference: &str, now: DateTime<Utc>) -> Result<bool, DomainError> {
        let image = self.candidate(reference).cloned().ok_or_else(|| {
            DomainError::Validation(format!(
                "Image '{}' is not a candidate of scene {}",
                reference, self.id
            ))
        })?;

        if self.selected_image.as_ref() == Some(&image) {
            return Ok(false);
        }

        self.selected_image = Some(image);
        self.updated_at = now;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_scene() -> Scene {
        let request = SceneRequest {
            description: "The dragon wakes".to_string(),
            style: None,
            candidate_count: None,
        };
        Scene::pending(StoryId::new(), request, 3, Utc::now())
    }

    fn generated_scene() -> Scene {
        let mut scene = make_scene();
        scene.record_candidates(
            vec![
                "https://img.test/a.png".to_string(),
                "https://img.test/b.png".to_string(),
            ],
            Utc::now(),
        );
        scene
    }

    #[test]
    fn pending_scene_has_no_candidates() {
        let scene = make_scene();
        assert_eq!(scene.status, SceneStatus::PendingGeneration);
        assert!(scene.candidates.is_empty());
        assert!(scene.selected_image.is_none());
        assert!(scene.awaits_generation());
        assert!(!scene.is_resolved());
    }

    #[test]
    fn record_candidates_keeps_order() {
        let scene = generated_scene();
        assert_eq!(scene.status, SceneStatus::Generated);
        assert_eq!(scene.candidates[0].position, 0);
        assert_eq!(scene.candidates[1].reference, "https://img.test/b.png");
        assert!(!scene.awaits_generation());
    }

    #[test]
    fn failed_scene_can_retry() {
        let mut scene = make_scene();
        scene.record_failure("backend unavailable".to_string(), Utc::now());
        assert_eq!(scene.status, SceneStatus::GenerationFailed);
        assert!(scene.awaits_generation());

        scene.record_candidates(vec!["https://img.test/a.png".to_string()], Utc::now());
        assert!(scene.failure_reason.is_none());
    }

    #[test]
    fn select_sets_and_replaces_selection() {
        let mut scene = generated_scene();

        assert!(scene.select("https://img.test/a.png", Utc::now()).unwrap());
        assert_eq!(scene.selected_image.as_ref().unwrap().position, 0);

        assert!(scene.select("https://img.test/b.png", Utc::now()).unwrap());
        assert_eq!(scene.selected_image.as_ref().unwrap().position, 1);
        assert!(scene.is_resolved());
    }

    #[test]
    fn reselecting_same_image_is_a_noop() {
        let mut scene = generated_scene();
        scene.select("https://img.test/a.png", Utc::now()).unwrap();
        let before = scene.clone();

        assert!(!scene.select("https://img.test/a.png", Utc::now()).unwrap());
        assert_eq!(scene, before);
    }

    #[test]
    fn select_unknown_reference_fails_without_change() {
        let mut scene = generated_scene();
        let before = scene.clone();

        let err = scene
            .select("https://img.test/zzz.png", Utc::now())
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(scene, before);
    }

    #[test]
    fn request_validation() {
        let ok = SceneRequest {
            description: "  A storm over the keep ".to_string(),
            style: Some("  ".to_string()),
            candidate_count: Some(2),
        }
        .validated(8)
        .unwrap();
        assert_eq!(ok.description, "A storm over the keep");
        assert!(ok.style.is_none());

        let empty = SceneRequest::default().validated(8);
        assert!(matches!(empty, Err(DomainError::Validation(_))));

        let too_many = SceneRequest {
            description: "x".to_string(),
            style: None,
            candidate_count: Some(9),
        }
        .validated(8);
        assert!(matches!(too_many, Err(DomainError::Validation(_))));

        let zero = SceneRequest {
            description: "x".to_string(),
            style: None,
            candidate_count: Some(0),
        }
        .validated(8);
        assert!(matches!(zero, Err(DomainError::Validation(_))));
    }

    #[test]
    fn scene_status_round_trip() {
        for status in [
            SceneStatus::PendingGeneration,
            SceneStatus::Generated,
            SceneStatus::GenerationFailed,
        ] {
            assert_eq!(status.to_string().parse::<SceneStatus>().unwrap(), status);
        }
    }
}
