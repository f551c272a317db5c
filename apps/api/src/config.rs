use anyhow::{bail, Context, Result};

/// Default HTTP body ceiling. Must stay above the 5 MiB resume ceiling so that
/// oversize resumes reach the validator instead of failing inside the extractor.
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Where generated image bytes are hosted before being recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetBackend {
    Cloudinary,
    S3,
}

#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

#[derive(Debug, Clone)]
pub struct S3Config {
    pub bucket: String,
    pub endpoint: String,
    /// Base URL under which uploaded objects are publicly readable.
    pub public_url: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
}

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub gemini_api_key: String,
    pub openai_api_key: String,
    pub cloudinary: CloudinaryConfig,
    pub clerk_secret_key: String,
    /// PEM-encoded public key used to verify Clerk session tokens.
    pub clerk_jwt_key: String,
    pub asset_backend: AssetBackend,
    pub s3: Option<S3Config>,
    pub max_upload_bytes: usize,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let asset_backend = parse_asset_backend(
            &std::env::var("ASSET_BACKEND").unwrap_or_else(|_| "cloudinary".to_string()),
        )?;

        let s3 = match asset_backend {
            AssetBackend::S3 => Some(S3Config {
                bucket: require_env("S3_BUCKET")?,
                endpoint: require_env("S3_ENDPOINT")?,
                public_url: require_env("S3_PUBLIC_URL")?,
                aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
                aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            }),
            AssetBackend::Cloudinary => None,
        };

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            gemini_api_key: require_env("GEMINI_API_KEY")?,
            openai_api_key: require_env("OPENAI_API_KEY")?,
            cloudinary: CloudinaryConfig {
                cloud_name: require_env("CLOUDINARY_CLOUD_NAME")?,
                api_key: require_env("CLOUDINARY_API_KEY")?,
                api_secret: require_env("CLOUDINARY_API_SECRET")?,
            },
            clerk_secret_key: require_env("CLERK_SECRET_KEY")?,
            clerk_jwt_key: require_env("CLERK_JWT_KEY")?,
            asset_backend,
            s3,
            max_upload_bytes: match std::env::var("MAX_UPLOAD_BYTES") {
                Ok(v) => v
                    .parse::<usize>()
                    .context("MAX_UPLOAD_BYTES must be a byte count")?,
                Err(_) => DEFAULT_MAX_UPLOAD_BYTES,
            },
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn parse_asset_backend(value: &str) -> Result<AssetBackend> {
    match value.trim().to_ascii_lowercase().as_str() {
        "cloudinary" => Ok(AssetBackend::Cloudinary),
        "s3" => Ok(AssetBackend::S3),
        other => bail!("ASSET_BACKEND must be 'cloudinary' or 's3', got '{other}'"),
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

#[cfg(test)]
impl Config {
    /// A config with placeholder credentials, for router and handler tests.
    pub fn for_tests() -> Self {
        Config {
            database_url: "postgres://localhost/atelier_test".to_string(),
            gemini_api_key: "test-gemini".to_string(),
            openai_api_key: "test-openai".to_string(),
            cloudinary: CloudinaryConfig {
                cloud_name: "demo".to_string(),
                api_key: "1234".to_string(),
                api_secret: "secret".to_string(),
            },
            clerk_secret_key: "sk_test".to_string(),
            clerk_jwt_key: String::new(),
            asset_backend: AssetBackend::Cloudinary,
            s3: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            port: 8080,
            rust_log: "debug".to_string(),
        }
    }
}
