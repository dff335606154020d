//! Domain layer
//!
//! Contains the story and scene model with no external dependencies.
//! - `entities`: Domain models and their invariants
//! - `ports`: Trait definitions for persistence and image generation

pub mod entities;
pub mod ports;
