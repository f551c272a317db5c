//! Clerk-backed identity provider.
//!
//! Session tokens are RS256 JWTs verified locally against the instance's PEM
//! public key. Plan comes from the token's `pla` claim (`u:premium`), falling
//! back to `public_metadata.plan`; the free-usage counter lives in
//! `private_metadata.free_usage`.

use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::{AuthError, IdentityProvider};
use crate::models::user::{Caller, PlanTier};

const CLERK_API_BASE: &str = "https://api.clerk.com/v1";

#[derive(Debug, Deserialize)]
struct SessionClaims {
    sub: String,
    /// Active billing plan, e.g. `u:premium` or `u:free_user`.
    pla: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ClerkUser {
    #[serde(default)]
    public_metadata: Value,
    #[serde(default)]
    private_metadata: Value,
}

pub struct ClerkIdentity {
    client: Client,
    secret_key: String,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl ClerkIdentity {
    pub fn new(secret_key: String, jwt_key_pem: &str) -> Result<Self, AuthError> {
        // Keys pasted into .env files often carry escaped newlines.
        let pem = jwt_key_pem.replace("\\n", "\n");
        let decoding_key = DecodingKey::from_rsa_pem(pem.as_bytes())
            .map_err(|e| AuthError::Provider(format!("invalid Clerk JWT key: {e}")))?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.validate_aud = false;

        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()?,
            secret_key,
            decoding_key,
            validation,
        })
    }

    fn verify(&self, token: &str) -> Result<SessionClaims, AuthError> {
        decode::<SessionClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }

    async fn fetch_user(&self, user_id: &str) -> Result<ClerkUser, AuthError> {
        let response = self
            .client
            .get(format!("{CLERK_API_BASE}/users/{user_id}"))
            .bearer_auth(&self.secret_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Provider(format!(
                "user lookup failed (status {status}): {body}"
            )));
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl IdentityProvider for ClerkIdentity {
    async fn resolve(&self, token: &str) -> Result<Caller, AuthError> {
        let claims = self.verify(token)?;
        let user = self.fetch_user(&claims.sub).await?;

        let plan = claims
            .pla
            .as_deref()
            .and_then(plan_from_claim)
            .or_else(|| plan_from_metadata(&user.public_metadata))
            .unwrap_or(PlanTier::Free);

        let free_usage = free_usage_from_metadata(&user.private_metadata);
        debug!("Resolved caller {} plan={:?} free_usage={}", claims.sub, plan, free_usage);

        Ok(Caller::new(claims.sub, plan, free_usage))
    }

    async fn record_free_usage(&self, user_id: &str, free_usage: u32) -> Result<(), AuthError> {
        let response = self
            .client
            .patch(format!("{CLERK_API_BASE}/users/{user_id}/metadata"))
            .bearer_auth(&self.secret_key)
            .json(&json!({ "private_metadata": { "free_usage": free_usage } }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Provider(format!(
                "metadata update failed (status {status}): {body}"
            )));
        }
        Ok(())
    }
}

/// Parses a `pla` claim such as `u:premium`. Any other plan slug is free.
fn plan_from_claim(claim: &str) -> Option<PlanTier> {
    let slug = claim.split_once(':').map(|(_, s)| s).unwrap_or(claim);
    if slug.is_empty() {
        return None;
    }
    Some(if slug == "premium" {
        PlanTier::Premium
    } else {
        PlanTier::Free
    })
}

fn plan_from_metadata(metadata: &Value) -> Option<PlanTier> {
    match metadata.get("plan")?.as_str()? {
        "premium" => Some(PlanTier::Premium),
        _ => Some(PlanTier::Free),
    }
}

fn free_usage_from_metadata(metadata: &Value) -> u32 {
    metadata
        .get("free_usage")
        .and_then(Value::as_u64)
        .map(|n| n.min(u32::MAX as u64) as u32)
        .unwrap_or(0)
}
