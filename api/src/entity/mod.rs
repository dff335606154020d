//! SeaORM entity definitions
//!
//! Mirrors `migrations/0001_create_stories_and_scenes.sql`.

pub mod scenes;
pub mod stories;
