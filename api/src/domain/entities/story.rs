//! Story domain entity
//!
//! A story is the top-level narrative owned by a customer. It is composed of
//! ordered scenes and moves through a small one-way status machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

const MAX_LABEL_LEN: usize = 100;
const MAX_CUSTOMER_ID_LEN: usize = 64;
const MAX_DESCRIPTION_LEN: usize = 5000;

/// Unique identifier for a story
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoryId(pub Uuid);

impl StoryId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for StoryId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for StoryId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for StoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Story status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoryStatus {
    /// Created, no scene generated yet
    Draft,
    /// At least one scene generated
    InProgress,
    /// Closed with every scene resolved
    Completed,
    /// Closed after an unrecoverable generation failure
    Failed,
}

impl StoryStatus {
    /// Whether a story may move from `self` to `next`.
    ///
    /// Status only moves forward: draft -> in_progress -> completed, and
    /// failed is reachable from any open state.
    pub fn can_transition_to(self, next: StoryStatus) -> bool {
        matches!(
            (self, next),
            (StoryStatus::Draft, StoryStatus::InProgress)
                | (StoryStatus::Draft, StoryStatus::Failed)
                | (StoryStatus::InProgress, StoryStatus::Completed)
                | (StoryStatus::InProgress, StoryStatus::Failed)
        )
    }

    pub fn is_finished(self) -> bool {
        matches!(self, StoryStatus::Completed | StoryStatus::Failed)
    }
}

impl std::fmt::Display for StoryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoryStatus::Draft => write!(f, "draft"),
            StoryStatus::InProgress => write!(f, "in_progress"),
            StoryStatus::Completed => write!(f, "completed"),
            StoryStatus::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for StoryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "draft" => Ok(StoryStatus::Draft),
            "in_progress" => Ok(StoryStatus::InProgress),
            "completed" => Ok(StoryStatus::Completed),
            "failed" => Ok(StoryStatus::Failed),
            _ => Err(format!("Unknown story status: {}", s)),
        }
    }
}

/// A customer's story
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Story {
    pub id: StoryId,
    pub name: String,
    pub mood: String,
    pub category: String,
    pub description: String,
    pub customer_id: String,
    pub status: StoryStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Story {
    /// Build a fresh draft from an already validated request
    pub fn draft(new_story: NewStory, now: DateTime<Utc>) -> Self {
        Story {
            id: StoryId::new(),
            name: new_story.name,
            mood: new_story.mood,
            category: new_story.category,
            description: new_story.description,
            customer_id: new_story.customer_id,
            status: StoryStatus::Draft,
            created_at: now,
            updated_at: now,
        }
    }

    /// Scenes may only be added while the story is still open
    pub fn accepts_scenes(&self) -> bool {
        !self.status.is_finished()
    }
}

/// Data needed to create a new story
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewStory {
    pub name: String,
    pub mood: String,
    pub category: String,
    pub description: String,
    pub customer_id: String,
}

impl NewStory {
    /// Trim every field and check it against the story limits
    pub fn validated(self) -> Result<Self, DomainError> {
        let story = NewStory {
            name: self.name.trim().to_string(),
            mood: self.mood.trim().to_string(),
            category: self.category.trim().to_string(),
            description: self.description.trim().to_string(),
            customer_id: self.customer_id.trim().to_string(),
        };

        require("name", &story.name, MAX_LABEL_LEN)?;
        require("mood", &story.mood, MAX_LABEL_LEN)?;
        require("category", &story.category, MAX_LABEL_LEN)?;
        require("description", &story.description, MAX_DESCRIPTION_LEN)?;
        require("customer_id", &story.customer_id, MAX_CUSTOMER_ID_LEN)?;

        Ok(story)
    }
}

fn require(field: &str, value: &str, max_len: usize) -> Result<(), DomainError> {
    if value.is_empty() {
        return Err(DomainError::Validation(format!("{} is required", field)));
    }
    if value.chars().count() > max_len {
        return Err(DomainError::Validation(format!(
            "{} must be at most {} characters",
            field, max_len
        )));
    }
    Ok(())
}
