//! OpenAI image generation (`gpt-image-1`). The API answers with base64 PNG
//! data, decoded here into raw bytes for the asset host.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{api_error, http_client, ImageGenerator, ProviderError};

const OPENAI_IMAGES_URL: &str = "https://api.openai.com/v1/images/generations";
pub const IMAGE_MODEL: &str = "gpt-image-1";
const IMAGE_SIZE: &str = "1024x1024";

#[derive(Debug, Serialize)]
struct ImageRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    size: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct ImageResponse {
    #[serde(default)]
    pub data: Vec<ImageDatum>,
}

#[derive(Debug, Deserialize)]
pub struct ImageDatum {
    pub b64_json: Option<String>,
}

impl ImageResponse {
    /// Decodes the first image. `Ok(None)` when the response carries none.
    pub fn first_image(&self) -> Result<Option<Bytes>, ProviderError> {
        let Some(encoded) = self
            .data
            .first()
            .and_then(|d| d.b64_json.as_deref())
            .filter(|s| !s.is_empty())
        else {
            return Ok(None);
        };

        STANDARD
            .decode(encoded)
            .map(|bytes| Some(Bytes::from(bytes)))
            .map_err(|e| ProviderError::InvalidResponse(format!("image is not valid base64: {e}")))
    }
}

#[derive(Clone)]
pub struct OpenAiImageClient {
    client: Client,
    api_key: String,
}

impl OpenAiImageClient {
    pub fn new(api_key: String) -> Result<Self, ProviderError> {
        Ok(Self {
            client: http_client()?,
            api_key,
        })
    }
}

#[async_trait]
impl ImageGenerator for OpenAiImageClient {
    async fn generate_image(&self, prompt: &str) -> Result<Option<Bytes>, ProviderError> {
        let response = self
            .client
            .post(OPENAI_IMAGES_URL)
            .bearer_auth(&self.api_key)
            .json(&ImageRequest {
                model: IMAGE_MODEL,
                prompt,
                size: IMAGE_SIZE,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(api_error(status.as_u16(), body));
        }

        let images: ImageResponse = response.json().await?;
        images.first_image()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_image_decodes_base64() {
        let raw = r#"{"created":1,"data":[{"b64_json":"iVBORw0K"}]}"#;
        let response: ImageResponse = serde_json::from_str(raw).unwrap();
        let bytes = response.first_image().unwrap().unwrap();
        assert_eq!(&bytes[..4], b"\x89PNG");
    }

    #[test]
    fn test_first_image_missing_payload() {
        let response: ImageResponse = serde_json::from_str(r#"{"data":[{}]}"#).unwrap();
        assert!(response.first_image().unwrap().is_none());

        let response: ImageResponse = serde_json::from_str(r#"{"data":[]}"#).unwrap();
        assert!(response.first_image().unwrap().is_none());
    }

    #[test]
    fn test_first_image_rejects_garbage() {
        let response: ImageResponse =
            serde_json::from_str(r#"{"data":[{"b64_json":"not base64!!"}]}"#).unwrap();
        assert!(matches!(
            response.first_image(),
            Err(ProviderError::InvalidResponse(_))
        ));
    }
}
