//! Cloudinary signed uploads. Serves both as the default asset host and as the
//! media transformer: transformations are applied on upload ("incoming"), so the
//! returned `secure_url` already points at the processed image.

use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::{multipart, Client};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::debug;

use super::{api_error, http_client, Asset, AssetHost, Effect, MediaTransformer, ProviderError};
use crate::config::CloudinaryConfig;

const CLOUDINARY_API_BASE: &str = "https://api.cloudinary.com/v1_1";

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
}

#[derive(Clone)]
pub struct CloudinaryClient {
    client: Client,
    config: CloudinaryConfig,
}

impl CloudinaryClient {
    pub fn new(config: CloudinaryConfig) -> Result<Self, ProviderError> {
        Ok(Self {
            client: http_client()?,
            config,
        })
    }

    async fn upload_with(
        &self,
        asset: &Asset,
        transformation: Option<String>,
    ) -> Result<String, ProviderError> {
        let timestamp = chrono::Utc::now().timestamp().to_string();

        let mut signed = BTreeMap::new();
        signed.insert("timestamp", timestamp.clone());
        if let Some(t) = &transformation {
            signed.insert("transformation", t.clone());
        }
        let signature = sign_params(&signed, &self.config.api_secret);

        let file_name = asset
            .file_name
            .clone()
            .unwrap_or_else(|| "upload".to_string());
        let file = multipart::Part::bytes(asset.bytes.to_vec())
            .file_name(file_name)
            .mime_str(&asset.content_type)?;

        let mut form = multipart::Form::new()
            .part("file", file)
            .text("api_key", self.config.api_key.clone())
            .text("timestamp", timestamp)
            .text("signature", signature)
            .text("signature_algorithm", "sha256");
        if let Some(t) = transformation {
            form = form.text("transformation", t);
        }

        let url = format!(
            "{}/{}/image/upload",
            CLOUDINARY_API_BASE, self.config.cloud_name
        );
        let response = self.client.post(url).multipart(form).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(api_error(status.as_u16(), body));
        }

        let uploaded: UploadResponse = response.json().await?;
        let secure_url = uploaded
            .secure_url
            .ok_or_else(|| ProviderError::InvalidResponse("upload returned no secure_url".into()))?;
        debug!("Cloudinary upload stored at {secure_url}");
        Ok(secure_url)
    }
}

#[async_trait]
impl AssetHost for CloudinaryClient {
    async fn upload(&self, asset: &Asset) -> Result<String, ProviderError> {
        self.upload_with(asset, None).await
    }
}

#[async_trait]
impl MediaTransformer for CloudinaryClient {
    async fn transform(&self, asset: &Asset, effect: &Effect) -> Result<String, ProviderError> {
        self.upload_with(asset, Some(effect.directive())).await
    }
}

/// Cloudinary request signature: `k=v` pairs sorted by key, joined with `&`,
/// followed by the API secret, hashed with SHA-256.
fn sign_params(params: &BTreeMap<&str, String>, api_secret: &str) -> String {
    let to_sign = params
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");
    let mut hasher = Sha256::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_params_timestamp_only() {
        let mut params = BTreeMap::new();
        params.insert("timestamp", "1700000000".to_string());
        assert_eq!(
            sign_params(&params, "secret"),
            "899037359ccfa6a61dabc0d9fbdd808ed945046e5d6451ab46bde7d4677d53b4"
        );
    }

    #[test]
    fn test_sign_params_sorted_with_transformation() {
        let mut params = BTreeMap::new();
        params.insert("transformation", "e_background_removal".to_string());
        params.insert("timestamp", "1700000000".to_string());
        assert_eq!(
            sign_params(&params, "secret"),
            "7233fe29a36e835d05d2361f52974975d11da0d0936961b3b7ba5affed76e601"
        );
    }

    #[test]
    fn test_upload_response_without_url() {
        let parsed: UploadResponse = serde_json::from_str(r#"{"public_id":"x"}"#).unwrap();
        assert!(parsed.secure_url.is_none());
    }
}
