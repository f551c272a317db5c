//! Axum route handlers for the `/api/ai` surface.
//!
//! Every handler answers 200 with an `Envelope`. The caller's plan is checked
//! before the body is looked at; body extraction errors then become validation
//! failures instead of axum rejections.

use axum::{
    extract::{rejection::JsonRejection, multipart::MultipartRejection, Multipart, State},
    Json,
};
use serde::Deserialize;

use crate::delegation::operations::{
    GenerateArticle, GenerateBlogTitle, GenerateImage, Operation, RemoveBackground, RemoveObject,
    ReviewResume,
};
use crate::delegation::outcome::{Envelope, Failure};
use crate::delegation::pipeline::run_operation;
use crate::delegation::quota;
use crate::delegation::upload::{FileLimit, UploadForm};
use crate::delegation::validation::{RESUME_MAX_BYTES, RESUME_TOO_LARGE};
use crate::models::user::Caller;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ArticleRequest {
    pub prompt: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BlogTitleRequest {
    pub prompt: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ImageRequest {
    pub prompt: Option<String>,
    pub publish: Option<bool>,
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

async fn respond<O: Operation>(state: &AppState, caller: &Caller, operation: O) -> Json<Envelope> {
    Json(run_operation(&state.services, caller, &operation).await.into())
}

const RESUME_UPLOAD: FileLimit = FileLimit {
    field: "resume",
    max_bytes: RESUME_MAX_BYTES,
    message: RESUME_TOO_LARGE,
};

fn json_body<O: Operation, T>(
    caller: &Caller,
    body: Result<Json<T>, JsonRejection>,
) -> Result<T, Failure> {
    quota::check(O::ACCESS, caller)?;
    body.map(|Json(request)| request)
        .map_err(|e| Failure::validation(e.body_text()))
}

async fn form_body<O: Operation>(
    caller: &Caller,
    body: Result<Multipart, MultipartRejection>,
    limit: Option<FileLimit>,
) -> Result<UploadForm, Failure> {
    quota::check(O::ACCESS, caller)?;
    let multipart = body.map_err(|e| Failure::validation(e.body_text()))?;
    UploadForm::read(multipart, limit).await
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/ai/generate-article
pub async fn handle_generate_article(
    State(state): State<AppState>,
    caller: Caller,
    body: Result<Json<ArticleRequest>, JsonRejection>,
) -> Json<Envelope> {
    match json_body::<GenerateArticle, _>(&caller, body) {
        Ok(request) => {
            let operation = GenerateArticle {
                prompt: request.prompt,
            };
            respond(&state, &caller, operation).await
        }
        Err(failure) => Json(failure.into()),
    }
}

/// POST /api/ai/generate-blog-title
pub async fn handle_generate_blog_title(
    State(state): State<AppState>,
    caller: Caller,
    body: Result<Json<BlogTitleRequest>, JsonRejection>,
) -> Json<Envelope> {
    match json_body::<GenerateBlogTitle, _>(&caller, body) {
        Ok(request) => {
            let operation = GenerateBlogTitle {
                prompt: request.prompt,
            };
            respond(&state, &caller, operation).await
        }
        Err(failure) => Json(failure.into()),
    }
}

/// POST /api/ai/generate-image
pub async fn handle_generate_image(
    State(state): State<AppState>,
    caller: Caller,
    body: Result<Json<ImageRequest>, JsonRejection>,
) -> Json<Envelope> {
    match json_body::<GenerateImage, _>(&caller, body) {
        Ok(request) => {
            let operation = GenerateImage {
                prompt: request.prompt,
                publish: request.publish.unwrap_or(false),
            };
            respond(&state, &caller, operation).await
        }
        Err(failure) => Json(failure.into()),
    }
}

/// POST /api/ai/remove-image-background (multipart: `image`)
pub async fn handle_remove_background(
    State(state): State<AppState>,
    caller: Caller,
    body: Result<Multipart, MultipartRejection>,
) -> Json<Envelope> {
    match form_body::<RemoveBackground>(&caller, body, None).await {
        Ok(mut form) => {
            let operation = RemoveBackground {
                image: form.take_file("image"),
            };
            respond(&state, &caller, operation).await
        }
        Err(failure) => Json(failure.into()),
    }
}

/// POST /api/ai/remove-image-object (multipart: `image`, `object`)
pub async fn handle_remove_object(
    State(state): State<AppState>,
    caller: Caller,
    body: Result<Multipart, MultipartRejection>,
) -> Json<Envelope> {
    match form_body::<RemoveObject>(&caller, body, None).await {
        Ok(mut form) => {
            let operation = RemoveObject {
                image: form.take_file("image"),
                object: form.take_field("object"),
            };
            respond(&state, &caller, operation).await
        }
        Err(failure) => Json(failure.into()),
    }
}

/// POST /api/ai/resume-review (multipart: `resume`)
pub async fn handle_resume_review(
    State(state): State<AppState>,
    caller: Caller,
    body: Result<Multipart, MultipartRejection>,
) -> Json<Envelope> {
    match form_body::<ReviewResume>(&caller, body, Some(RESUME_UPLOAD)).await {
        Ok(mut form) => {
            let operation = ReviewResume::new(form.take_file("resume"));
            respond(&state, &caller, operation).await
        }
        Err(failure) => Json(failure.into()),
    }
}
