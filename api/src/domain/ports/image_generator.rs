//! Image generation port trait
//!
//! Defines the interface to whatever backend turns scene parameters into
//! candidate images.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::GenerationError;

/// Everything the backend needs to render one scene's candidates
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationRequest {
    pub prompt: String,
    pub style: Option<String>,
    pub mood: String,
    pub category: String,
    pub count: u32,
}

/// A single generated image as reported by the backend
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GeneratedImage {
    pub url: String,
}

/// Port for the image generation backend
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Generate candidates, in backend order
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<Vec<GeneratedImage>, GenerationError>;
}
