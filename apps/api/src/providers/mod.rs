//! Capability traits for the external services every operation delegates to.
//!
//! Each operation calls exactly one of these per request. `AppState` carries
//! them as trait objects so tests can swap in in-memory fakes.

use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;
use thiserror::Error;

pub mod cloudinary;
pub mod openai_images;
pub mod s3;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

/// A binary payload on its way to an external service: an uploaded file or
/// generated image bytes.
#[derive(Debug, Clone)]
pub struct Asset {
    pub bytes: Bytes,
    pub content_type: String,
    pub file_name: Option<String>,
}

impl Asset {
    pub fn new(bytes: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            content_type: content_type.into(),
            file_name: None,
        }
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// A text-generation request. Budget and temperature are left to the
/// provider's defaults when unset.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRequest {
    pub prompt: String,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

impl TextRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            max_tokens: None,
            temperature: None,
        }
    }
}

/// Transformation applied by the media transformer while hosting an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    BackgroundRemoval,
    /// Generative removal of one named object.
    ObjectRemoval(String),
}

impl Effect {
    /// The transformation directive understood by the media host.
    pub fn directive(&self) -> String {
        match self {
            Effect::BackgroundRemoval => "e_background_removal".to_string(),
            Effect::ObjectRemoval(object) => format!("e_gen_remove:{object}"),
        }
    }
}

/// Turns a prompt into generated text. `Ok(None)` means the provider answered
/// but produced nothing usable.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate_text(&self, request: &TextRequest) -> Result<Option<String>, ProviderError>;
}

/// Turns a prompt into image bytes.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate_image(&self, prompt: &str) -> Result<Option<Bytes>, ProviderError>;
}

/// Hosts raw bytes and returns their public URL.
#[async_trait]
pub trait AssetHost: Send + Sync {
    async fn upload(&self, asset: &Asset) -> Result<String, ProviderError>;
}

/// Hosts an image with a transformation applied and returns the transformed URL.
#[async_trait]
pub trait MediaTransformer: Send + Sync {
    async fn transform(&self, asset: &Asset, effect: &Effect) -> Result<String, ProviderError>;
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Builds an `Api` error from a non-success response body. Gemini, OpenAI and
/// Cloudinary all report `{"error": {"message": ...}}`; anything else is kept raw.
pub(crate) fn api_error(status: u16, body: String) -> ProviderError {
    let message = serde_json::from_str::<ApiErrorEnvelope>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body);
    ProviderError::Api { status, message }
}

/// Shared HTTP client settings for provider calls.
pub(crate) fn http_client() -> Result<reqwest::Client, ProviderError> {
    Ok(reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(120))
        .build()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effect_directives() {
        assert_eq!(Effect::BackgroundRemoval.directive(), "e_background_removal");
        assert_eq!(
            Effect::ObjectRemoval("watch".to_string()).directive(),
            "e_gen_remove:watch"
        );
    }

    #[test]
    fn test_api_error_extracts_nested_message() {
        let err = api_error(400, r#"{"error": {"message": "Invalid prompt"}}"#.to_string());
        match err {
            ProviderError::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Invalid prompt");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_api_error_keeps_unstructured_body() {
        let err = api_error(502, "upstream unavailable".to_string());
        assert_eq!(
            err.to_string(),
            "API error (status 502): upstream unavailable"
        );
    }
}
