//! Domain ports (traits)
//!
//! Port traits define interfaces that the domain layer requires.
//! Adapters provide concrete implementations of these traits.

pub mod image_generator;
pub mod repositories;

pub use image_generator::{GeneratedImage, GenerationRequest, ImageGenerator};
#[cfg(test)]
pub use image_generator::MockImageGenerator;
pub use repositories::{SceneRepository, StoryRepository};
