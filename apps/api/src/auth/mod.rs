//! Caller resolution. An external identity provider turns the request's bearer
//! token into a `Caller` (user id, plan tier, free-usage counter) and persists
//! counter increments back to the caller's profile.

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use thiserror::Error;
use tracing::warn;

use crate::errors::AppError;
use crate::models::user::Caller;
use crate::state::AppState;

pub mod clerk;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid session token: {0}")]
    InvalidToken(String),

    #[error("Identity provider error: {0}")]
    Provider(String),
}

impl From<reqwest::Error> for AuthError {
    fn from(e: reqwest::Error) -> Self {
        AuthError::Provider(e.to_string())
    }
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolves a session token to the calling user and their current plan.
    async fn resolve(&self, token: &str) -> Result<Caller, AuthError>;

    /// Stores a new free-usage count on the user's profile.
    async fn record_free_usage(&self, user_id: &str, free_usage: u32) -> Result<(), AuthError>;
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[async_trait]
impl FromRequestParts<AppState> for Caller {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or(AppError::Unauthorized)?;

        match state.services.identity.resolve(token).await {
            Ok(caller) => Ok(caller),
            Err(AuthError::Provider(msg)) => Err(AppError::Identity(msg)),
            Err(e) => {
                warn!("Rejected request credentials: {e}");
                Err(AppError::Unauthorized)
            }
        }
    }
}
