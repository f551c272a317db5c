/// LLM Client — the single point of entry for all Gemini calls in Atelier.
///
/// Two endpoints are used: the native `generateContent` API for articles and
/// blog titles, and the OpenAI-compatible chat completions API for resume
/// review. Calls are made once; failures are reported, never retried.
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::providers::{api_error, http_client, ProviderError, TextGenerator, TextRequest};

pub mod prompts;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
/// Model behind `generateContent` (articles, blog titles).
pub const CONTENT_MODEL: &str = "gemini-2.0-flash";
/// Model behind chat completions (resume review).
pub const CHAT_MODEL: &str = "gemini-2.5-flash";

/// Which Gemini surface a client talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmApi {
    GenerateContent,
    ChatCompletions,
}

// ────────────────────────────────────────────────────────────────────────────
// generateContent wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
pub struct CandidatePart {
    pub text: Option<String>,
}

impl GenerateContentResponse {
    /// Text of the first part of the first candidate, trimmed. `None` when
    /// missing or blank.
    pub fn text(&self) -> Option<String> {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .and_then(|c| c.parts.first())
            .and_then(|p| p.text.as_deref())
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Chat completions wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
    pub usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoiceMessage {
    pub content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ChatUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl ChatResponse {
    pub fn text(&self) -> Option<String> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Client
// ────────────────────────────────────────────────────────────────────────────

/// Gemini client bound to one API surface.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    api: LlmApi,
    base_url: String,
}

impl LlmClient {
    pub fn new(api_key: String, api: LlmApi) -> Result<Self, ProviderError> {
        Ok(Self {
            client: http_client()?,
            api_key,
            api,
            base_url: GEMINI_API_BASE.to_string(),
        })
    }

    /// Calls `models/{CONTENT_MODEL}:generateContent` with a single user turn.
    pub async fn generate_content(
        &self,
        request: &TextRequest,
    ) -> Result<GenerateContentResponse, ProviderError> {
        let generation_config = if request.max_tokens.is_some() || request.temperature.is_some() {
            Some(GenerationConfig {
                max_output_tokens: request.max_tokens,
                temperature: request.temperature,
            })
        } else {
            None
        };

        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part {
                    text: &request.prompt,
                }],
            }],
            generation_config,
        };

        let url = format!("{}/models/{}:generateContent", self.base_url, CONTENT_MODEL);
        let response = self
            .client
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(api_error(status.as_u16(), body));
        }

        Ok(response.json().await?)
    }

    /// Calls the OpenAI-compatible chat completions endpoint with a single user message.
    pub async fn chat_completion(&self, request: &TextRequest) -> Result<ChatResponse, ProviderError> {
        let body = ChatRequest {
            model: CHAT_MODEL,
            messages: vec![ChatMessage {
                role: "user",
                content: &request.prompt,
            }],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let response = self
            .client
            .post(format!("{}/openai/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(api_error(status.as_u16(), body));
        }

        let chat: ChatResponse = response.json().await?;
        if let Some(usage) = &chat.usage {
            debug!(
                "Chat completion succeeded: prompt_tokens={}, completion_tokens={}",
                usage.prompt_tokens, usage.completion_tokens
            );
        }
        Ok(chat)
    }
}

#[async_trait]
impl TextGenerator for LlmClient {
    async fn generate_text(&self, request: &TextRequest) -> Result<Option<String>, ProviderError> {
        match self.api {
            LlmApi::GenerateContent => {
                let response = self.generate_content(request).await?;
                let text = response.text();
                if text.is_none() {
                    debug!("generateContent returned no text: {response:?}");
                }
                Ok(text)
            }
            LlmApi::ChatCompletions => Ok(self.chat_completion(request).await?.text()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_content_text_is_trimmed() {
        let raw = r#"{"candidates":[{"content":{"parts":[{"text":"  Ten Ways to Ship Faster \n"}]}}]}"#;
        let response: GenerateContentResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(response.text().as_deref(), Some("Ten Ways to Ship Faster"));
    }

    #[test]
    fn test_generate_content_without_candidates_has_no_text() {
        let response: GenerateContentResponse =
            serde_json::from_str(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#).unwrap();
        assert!(response.text().is_none());
    }

    #[test]
    fn test_generate_content_blank_text_is_none() {
        let raw = r#"{"candidates":[{"content":{"parts":[{"text":"   "}]}}]}"#;
        let response: GenerateContentResponse = serde_json::from_str(raw).unwrap();
        assert!(response.text().is_none());
    }

    #[test]
    fn test_chat_response_text() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":"Strong summary."}}],
                      "usage":{"prompt_tokens":12,"completion_tokens":3,"total_tokens":15}}"#;
        let response: ChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(response.text().as_deref(), Some("Strong summary."));
    }

    #[test]
    fn test_chat_response_null_content() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#;
        let response: ChatResponse = serde_json::from_str(raw).unwrap();
        assert!(response.text().is_none());
    }

    #[test]
    fn test_generation_config_is_omitted_without_hints() {
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: "hello" }],
            }],
            generation_config: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("generationConfig").is_none());
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hello");
    }

    #[test]
    fn test_generation_config_uses_camel_case() {
        let config = GenerationConfig {
            max_output_tokens: Some(800),
            temperature: None,
        };
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["maxOutputTokens"], 800);
        assert!(json.get("temperature").is_none());
    }
}
