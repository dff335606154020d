//! Image generation backend client

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::domain::ports::{GeneratedImage, GenerationRequest, ImageGenerator};
use crate::error::GenerationError;

/// HTTP implementation of the image generation port
pub struct HttpImageGenerator {
    http: Client,
    base_url: String,
    api_token: Option<String>,
}

impl HttpImageGenerator {
    pub fn new(base_url: String, api_token: Option<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token,
        }
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/v1{}", self.base_url, path)
    }

    async fn handle_response<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, GenerationError> {
        let status = response.status();

        if status.is_success() {
            response
                .json()
                .await
                .map_err(|e| GenerationError::Deserialization(e.to_string()))
        } else {
            let message = response.text().await.unwrap_or_default();
            Err(GenerationError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}

/// Request body for the generations endpoint
#[derive(Serialize)]
struct GenerationsRequest<'a> {
    prompt: &'a str,
    n: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    style: Option<&'a str>,
    mood: &'a str,
    category: &'a str,
}

impl<'a> From<&'a GenerationRequest> for GenerationsRequest<'a> {
    fn from(r: &'a GenerationRequest) -> Self {
        GenerationsRequest {
            prompt: &r.prompt,
            n: r.count,
            style: r.style.as_deref(),
            mood: &r.mood,
            category: &r.category,
        }
    }
}

#[derive(Deserialize)]
struct GenerationsResponse {
    data: Vec<GeneratedImage>,
}

#[async_trait]
impl ImageGenerator for HttpImageGenerator {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<Vec<GeneratedImage>, GenerationError> {
        let mut builder = self
            .http
            .post(self.api_url("/images/generations"))
            .json(&GenerationsRequest::from(request));
        if let Some(token) = &self.api_token {
            builder = builder.bearer_auth(token);
        }

        let resp = builder.send().await?;
        let body: GenerationsResponse = self.handle_response(resp).await?;

        tracing::debug!(count = body.data.len(), "image backend responded");
        Ok(body.data)
    }
}
