use std::sync::Arc;

use crate::auth::IdentityProvider;
use crate::config::Config;
use crate::creations::store::CreationStore;
use crate::providers::{AssetHost, ImageGenerator, MediaTransformer, TextGenerator};

/// The external collaborators every operation may call. Held as trait objects
/// so each can be swapped at startup or faked in tests.
#[derive(Clone)]
pub struct Services {
    pub identity: Arc<dyn IdentityProvider>,
    /// Article and blog-title generation.
    pub writer: Arc<dyn TextGenerator>,
    /// Resume review.
    pub reviewer: Arc<dyn TextGenerator>,
    pub images: Arc<dyn ImageGenerator>,
    pub assets: Arc<dyn AssetHost>,
    pub transformer: Arc<dyn MediaTransformer>,
    pub store: Arc<dyn CreationStore>,
}

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub services: Services,
}
