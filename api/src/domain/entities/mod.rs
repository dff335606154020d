//! Domain entities
//!
//! Pure domain models representing core business concepts.
//! These are separate from the SeaORM entities in the `entity` module.

pub mod scene;
pub mod story;

pub use scene::{Image, Scene, SceneId, SceneRequest, SceneStatus};
pub use story::{NewStory, Story, StoryId, StoryStatus};
