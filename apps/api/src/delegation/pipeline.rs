//! The quota-gated delegation skeleton shared by every operation.
//!
//! Flow: gate → validate → delegate → host (image bytes only) → insert record
//!       → charge free usage → respond.
//!
//! Each step runs at most once. Nothing is retried, and nothing already done is
//! undone when a later step fails.

use tracing::{error, info, warn};

use crate::delegation::operations::{Artifact, Operation};
use crate::delegation::outcome::{Failure, FailureKind, Outcome};
use crate::delegation::quota::{self, Charge};
use crate::models::creation::NewCreation;
use crate::models::user::Caller;
use crate::state::Services;

/// Runs one operation for one caller. Every error becomes a `Failure`.
pub async fn run_operation<O: Operation>(services: &Services, caller: &Caller, operation: &O) -> Outcome {
    let kind = operation.kind();
    let outcome = execute(services, caller, operation).await;

    match &outcome {
        Ok(_) => info!("{kind} succeeded for user {}", caller.user_id),
        Err(failure) if failure.kind == FailureKind::Persistence => error!(
            "{kind} for user {} failed after delegation: {failure}",
            caller.user_id
        ),
        Err(failure) => warn!("{kind} refused for user {}: {failure}", caller.user_id),
    }

    outcome
}

async fn execute<O: Operation>(services: &Services, caller: &Caller, operation: &O) -> Outcome {
    let charge = quota::check(O::ACCESS, caller)?;
    let input = operation.validate()?;
    let delegated = operation.delegate(input, services).await?;

    let content = match delegated.artifact {
        Artifact::Text(text) => text,
        Artifact::Hosted(url) => url,
        Artifact::Image(image) => services
            .assets
            .upload(&image)
            .await
            .map_err(|e| Failure::persistence(e.to_string()))?,
    };

    let creation = NewCreation {
        user_id: caller.user_id.clone(),
        prompt: delegated.prompt,
        content,
        kind: operation.kind(),
        publish: operation.publish(),
    };
    services
        .store
        .insert(&creation)
        .await
        .map_err(|e| Failure::persistence(e.to_string()))?;

    if let Charge::FreeUsage { next_usage } = charge {
        services
            .identity
            .record_free_usage(&caller.user_id, next_usage)
            .await
            .map_err(|e| Failure::persistence(e.to_string()))?;
    }

    Ok(creation.content)
}
