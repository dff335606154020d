//! Image generation adapter
//!
//! HTTP client for the image generation backend.

pub mod client;

pub use client::HttpImageGenerator;
