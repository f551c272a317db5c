mod auth;
mod config;
mod creations;
mod db;
mod delegation;
mod errors;
mod llm_client;
mod models;
mod providers;
mod routes;
mod state;
#[cfg(test)]
mod test_helpers;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::auth::clerk::ClerkIdentity;
use crate::config::{AssetBackend, Config};
use crate::creations::store::PgCreationStore;
use crate::db::create_pool;
use crate::llm_client::{LlmApi, LlmClient};
use crate::providers::cloudinary::CloudinaryClient;
use crate::providers::openai_images::{OpenAiImageClient, IMAGE_MODEL};
use crate::providers::s3::S3AssetHost;
use crate::providers::AssetHost;
use crate::routes::build_router;
use crate::state::{AppState, Services};

#[tokio::main]
async fn main() -> Result<()> {
    // Configuration first: startup fails on missing required env vars
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Atelier API v{}", env!("CARGO_PKG_VERSION"));

    let services = build_services(&config).await?;

    let state = AppState {
        config: config.clone(),
        services,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins to the front-end host

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Wires every external collaborator from configuration.
async fn build_services(config: &Config) -> Result<Services> {
    let db = create_pool(&config.database_url).await?;

    let identity = ClerkIdentity::new(config.clerk_secret_key.clone(), &config.clerk_jwt_key)?;
    info!("Clerk identity provider initialized");

    let writer = LlmClient::new(config.gemini_api_key.clone(), LlmApi::GenerateContent)?;
    let reviewer = LlmClient::new(config.gemini_api_key.clone(), LlmApi::ChatCompletions)?;
    info!(
        "LLM clients initialized (content: {}, chat: {})",
        llm_client::CONTENT_MODEL,
        llm_client::CHAT_MODEL
    );

    let images = OpenAiImageClient::new(config.openai_api_key.clone())?;
    info!("Image generation client initialized (model: {IMAGE_MODEL})");

    let cloudinary = Arc::new(CloudinaryClient::new(config.cloudinary.clone())?);

    let assets: Arc<dyn AssetHost> = match (config.asset_backend, &config.s3) {
        (AssetBackend::S3, Some(s3)) => {
            info!("Hosting generated images in S3 bucket {}", s3.bucket);
            Arc::new(S3AssetHost::new(s3).await)
        }
        _ => {
            info!("Hosting generated images on Cloudinary");
            cloudinary.clone()
        }
    };

    Ok(Services {
        identity: Arc::new(identity),
        writer: Arc::new(writer),
        reviewer: Arc::new(reviewer),
        images: Arc::new(images),
        assets,
        transformer: cloudinary,
        store: Arc::new(PgCreationStore::new(db)),
    })
}
