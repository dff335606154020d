//! Test utilities
//!
//! Manual mock implementations and test fixtures for unit testing.
//!
//! The in-memory repositories honour the same contracts as the Postgres
//! adapters (position assignment, version checks), so service tests exercise
//! the real conflict and not-found paths. `mockall`'s generated
//! `MockImageGenerator` is used where a test needs call expectations.

pub mod fixtures;
pub mod mocks;

pub use fixtures::*;
pub use mocks::*;
