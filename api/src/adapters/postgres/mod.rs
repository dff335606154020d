//! PostgreSQL adapters
//!
//! Implementations of repository traits using SeaORM and PostgreSQL.

pub mod scene_repo;
pub mod story_repo;


pub use scene_repo::PostgresSceneRepository;
pub use story_repo::PostgresStoryRepository;
