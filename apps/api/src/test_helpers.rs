//! In-memory fakes for every external collaborator. Each records what it was
//! asked to do so tests can assert on side effects.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use uuid::Uuid;

use crate::auth::{AuthError, IdentityProvider};
use crate::config::Config;
use crate::creations::store::CreationStore;
use crate::models::creation::{CreationRow, NewCreation};
use crate::models::user::Caller;
use crate::providers::{
    Asset, AssetHost, Effect, ImageGenerator, MediaTransformer, ProviderError, TextGenerator,
    TextRequest,
};
use crate::state::{AppState, Services};

pub const HOSTED_URL: &str = "https://assets.example.com/creation.png";

#[derive(Default)]
pub struct FakeIdentity {
    callers: Mutex<HashMap<String, Caller>>,
    pub usage_updates: Mutex<Vec<(String, u32)>>,
    pub fail_updates: bool,
}

impl FakeIdentity {
    /// Resolves callers normally but refuses every usage update.
    pub fn failing_updates() -> Self {
        Self {
            fail_updates: true,
            ..Self::default()
        }
    }

    pub fn with_caller(self, token: &str, caller: Caller) -> Self {
        self.callers.lock().unwrap().insert(token.to_string(), caller);
        self
    }

    pub fn updates(&self) -> Vec<(String, u32)> {
        self.usage_updates.lock().unwrap().clone()
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn resolve(&self, token: &str) -> Result<Caller, AuthError> {
        self.callers
            .lock()
            .unwrap()
            .get(token)
            .cloned()
            .ok_or_else(|| AuthError::InvalidToken("unknown token".to_string()))
    }

    async fn record_free_usage(&self, user_id: &str, free_usage: u32) -> Result<(), AuthError> {
        if self.fail_updates {
            return Err(AuthError::Provider("metadata update refused".to_string()));
        }
        self.usage_updates
            .lock()
            .unwrap()
            .push((user_id.to_string(), free_usage));
        Ok(())
    }
}

/// Answers every prompt with the same reply (or none, or an error).
#[derive(Default)]
pub struct FakeText {
    pub reply: Option<String>,
    pub error: Option<String>,
    pub requests: Mutex<Vec<TextRequest>>,
}

impl FakeText {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl TextGenerator for FakeText {
    async fn generate_text(&self, request: &TextRequest) -> Result<Option<String>, ProviderError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(message) = &self.error {
            return Err(ProviderError::Api {
                status: 500,
                message: message.clone(),
            });
        }
        Ok(self.reply.clone())
    }
}

#[derive(Default)]
pub struct FakeImages {
    pub reply: Option<Bytes>,
    pub prompts: Mutex<Vec<String>>,
}

impl FakeImages {
    pub fn replying(bytes: &'static [u8]) -> Self {
        Self {
            reply: Some(Bytes::from_static(bytes)),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl ImageGenerator for FakeImages {
    async fn generate_image(&self, prompt: &str) -> Result<Option<Bytes>, ProviderError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.reply.clone())
    }
}

#[derive(Default)]
pub struct FakeAssets {
    pub uploads: Mutex<Vec<Asset>>,
    pub fail: bool,
}

impl FakeAssets {
    pub fn calls(&self) -> usize {
        self.uploads.lock().unwrap().len()
    }
}

#[async_trait]
impl AssetHost for FakeAssets {
    async fn upload(&self, asset: &Asset) -> Result<String, ProviderError> {
        self.uploads.lock().unwrap().push(asset.clone());
        if self.fail {
            return Err(ProviderError::Storage("bucket unavailable".to_string()));
        }
        Ok(HOSTED_URL.to_string())
    }
}

#[derive(Default)]
pub struct FakeTransformer {
    pub effects: Mutex<Vec<Effect>>,
}

impl FakeTransformer {
    pub fn calls(&self) -> usize {
        self.effects.lock().unwrap().len()
    }
}

#[async_trait]
impl MediaTransformer for FakeTransformer {
    async fn transform(&self, _asset: &Asset, effect: &Effect) -> Result<String, ProviderError> {
        self.effects.lock().unwrap().push(effect.clone());
        Ok(format!("https://assets.example.com/{}.png", effect.directive()))
    }
}

#[derive(Default)]
pub struct MemoryStore {
    pub rows: Mutex<Vec<NewCreation>>,
    pub fail: bool,
}

impl MemoryStore {
    pub fn rows(&self) -> Vec<NewCreation> {
        self.rows.lock().unwrap().clone()
    }

    fn to_row(creation: &NewCreation) -> CreationRow {
        CreationRow {
            id: Uuid::new_v4(),
            user_id: creation.user_id.clone(),
            prompt: creation.prompt.clone(),
            content: creation.content.clone(),
            kind: creation.kind.as_str().to_string(),
            publish: creation.publish,
            created_at: Utc::now(),
        }
    }
}

#[async_trait]
impl CreationStore for MemoryStore {
    async fn insert(&self, creation: &NewCreation) -> Result<Uuid> {
        if self.fail {
            return Err(anyhow!("connection reset by peer"));
        }
        self.rows.lock().unwrap().push(creation.clone());
        Ok(Uuid::new_v4())
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<CreationRow>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .rev()
            .filter(|c| c.user_id == user_id)
            .map(Self::to_row)
            .collect())
    }

    async fn list_published(&self) -> Result<Vec<CreationRow>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .rev()
            .filter(|c| c.publish)
            .map(Self::to_row)
            .collect())
    }
}

/// One fake per collaborator, shared with the `Services` under test.
pub struct Harness {
    pub identity: Arc<FakeIdentity>,
    pub writer: Arc<FakeText>,
    pub reviewer: Arc<FakeText>,
    pub images: Arc<FakeImages>,
    pub assets: Arc<FakeAssets>,
    pub transformer: Arc<FakeTransformer>,
    pub store: Arc<MemoryStore>,
}

impl Default for Harness {
    fn default() -> Self {
        Self {
            identity: Arc::new(FakeIdentity::default()),
            writer: Arc::new(FakeText::replying("Generated article body")),
            reviewer: Arc::new(FakeText::replying("Solid resume; quantify impact.")),
            images: Arc::new(FakeImages::replying(b"\x89PNG fake")),
            assets: Arc::new(FakeAssets::default()),
            transformer: Arc::new(FakeTransformer::default()),
            store: Arc::new(MemoryStore::default()),
        }
    }
}

impl Harness {
    pub fn services(&self) -> Services {
        Services {
            identity: self.identity.clone(),
            writer: self.writer.clone(),
            reviewer: self.reviewer.clone(),
            images: self.images.clone(),
            assets: self.assets.clone(),
            transformer: self.transformer.clone(),
            store: self.store.clone(),
        }
    }

    pub fn app_state(&self) -> AppState {
        AppState {
            config: Config::for_tests(),
            services: self.services(),
        }
    }

    /// Total provider calls of any kind.
    pub fn provider_calls(&self) -> usize {
        self.writer.calls() + self.reviewer.calls() + self.images.calls() + self.transformer.calls()
    }
}
