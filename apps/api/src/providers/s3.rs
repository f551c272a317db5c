use async_trait::async_trait;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::primitives::ByteStream;
use tracing::info;
use uuid::Uuid;

use super::{Asset, AssetHost, ProviderError};
use crate::config::S3Config;

/// Hosts generated images in an S3-compatible bucket (MinIO locally, AWS in
/// production). Objects must be publicly readable under `public_url`.
#[derive(Clone)]
pub struct S3AssetHost {
    client: aws_sdk_s3::Client,
    bucket: String,
    public_url: String,
}

impl S3AssetHost {
    pub async fn new(config: &S3Config) -> Self {
        let credentials = Credentials::new(
            &config.aws_access_key_id,
            &config.aws_secret_access_key,
            None,
            None,
            "atelier-static",
        );

        let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .credentials_provider(credentials)
            .endpoint_url(&config.endpoint)
            .load()
            .await;

        Self {
            client: aws_sdk_s3::Client::new(&s3_config),
            bucket: config.bucket.clone(),
            public_url: config.public_url.clone(),
        }
    }
}

#[async_trait]
impl AssetHost for S3AssetHost {
    async fn upload(&self, asset: &Asset) -> Result<String, ProviderError> {
        let key = object_key(&asset.content_type, Uuid::new_v4());

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(asset.bytes.clone()))
            .content_type(&asset.content_type)
            .send()
            .await
            .map_err(|e| ProviderError::Storage(format!("S3 upload failed: {e}")))?;

        info!("Uploaded asset to s3://{}/{}", self.bucket, key);
        Ok(public_object_url(&self.public_url, &key))
    }
}

fn object_key(content_type: &str, id: Uuid) -> String {
    let extension = match content_type {
        "image/jpeg" => "jpg",
        "image/webp" => "webp",
        "image/gif" => "gif",
        _ => "png",
    };
    format!("creations/{id}.{extension}")
}

fn public_object_url(base: &str, key: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_key_extension_follows_content_type() {
        let id = Uuid::nil();
        assert_eq!(
            object_key("image/png", id),
            "creations/00000000-0000-0000-0000-000000000000.png"
        );
        assert!(object_key("image/jpeg", id).ends_with(".jpg"));
        assert!(object_key("application/octet-stream", id).ends_with(".png"));
    }

    #[test]
    fn test_public_object_url_joins_without_double_slash() {
        assert_eq!(
            public_object_url("https://cdn.example.com/bucket/", "creations/a.png"),
            "https://cdn.example.com/bucket/creations/a.png"
        );
    }
}
