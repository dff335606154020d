//! Adapters layer
//!
//! Implementations of port traits for external systems.

pub mod imagegen;
pub mod postgres;

pub use imagegen::HttpImageGenerator;
pub use postgres::{PostgresSceneRepository, PostgresStoryRepository};
