pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::creations::handlers as creations;
use crate::delegation::handlers as ai;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        // AI operations
        .route("/api/ai/generate-article", post(ai::handle_generate_article))
        .route(
            "/api/ai/generate-blog-title",
            post(ai::handle_generate_blog_title),
        )
        .route("/api/ai/generate-image", post(ai::handle_generate_image))
        .route(
            "/api/ai/remove-image-background",
            post(ai::handle_remove_background),
        )
        .route(
            "/api/ai/remove-image-object",
            post(ai::handle_remove_object),
        )
        .route("/api/ai/resume-review", post(ai::handle_resume_review))
        // Creations
        .route(
            "/api/user/get-user-creations",
            get(creations::handle_user_creations),
        )
        .route(
            "/api/user/get-published-creations",
            get(creations::handle_published_creations),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
