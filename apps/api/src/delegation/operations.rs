//! The six delegated operations. Each one knows its access rule, how to
//! validate its payload, and which single provider call produces its artifact;
//! the shared skeleton around them lives in `pipeline`.

use async_trait::async_trait;
use bytes::Bytes;

use crate::delegation::outcome::{Failure, NO_CONTENT, NO_IMAGE};
use crate::delegation::quota::Access;
use crate::delegation::validation::{
    check_resume_size, require_file, require_prompt, require_single_word, NO_IMAGE_UPLOADED,
    NO_RESUME_UPLOADED,
};
use crate::llm_client::prompts::{
    resume_review_prompt, RESUME_REVIEW_MAX_TOKENS, RESUME_REVIEW_TEMPERATURE,
};
use crate::models::creation::CreationKind;
use crate::providers::{Asset, Effect, ProviderError, TextGenerator, TextRequest};
use crate::state::Services;

pub const REMOVE_BACKGROUND_PROMPT: &str = "Remove background from image";
pub const REVIEW_RESUME_PROMPT: &str = "Review the uploaded resume";

/// What a provider handed back.
#[derive(Debug, Clone)]
pub enum Artifact {
    /// Generated text, stored verbatim.
    Text(String),
    /// Raw image bytes that still need hosting.
    Image(Asset),
    /// An asset the provider already hosts.
    Hosted(String),
}

/// A successful delegation, ready to be recorded.
#[derive(Debug, Clone)]
pub struct Delegated {
    /// Human-readable description stored with the record.
    pub prompt: String,
    pub artifact: Artifact,
}

#[async_trait]
pub trait Operation: Send + Sync {
    /// The payload once validated.
    type Input: Send;

    fn kind(&self) -> CreationKind;

    /// Who may run it; checked before the request body is read.
    const ACCESS: Access;

    /// Whether the record is publicly listed.
    fn publish(&self) -> bool {
        false
    }

    fn validate(&self) -> Result<Self::Input, Failure>;

    /// Makes the one provider call for this operation.
    async fn delegate(&self, input: Self::Input, services: &Services) -> Result<Delegated, Failure>;
}

fn provider_failure(e: ProviderError) -> Failure {
    Failure::provider(e.to_string())
}

async fn generate_text(
    generator: &dyn TextGenerator,
    request: &TextRequest,
) -> Result<String, Failure> {
    generator
        .generate_text(request)
        .await
        .map_err(provider_failure)?
        .ok_or_else(|| Failure::provider(NO_CONTENT))
}

// ────────────────────────────────────────────────────────────────────────────
// Text operations (free-tier eligible)
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct GenerateArticle {
    pub prompt: Option<String>,
}

#[async_trait]
impl Operation for GenerateArticle {
    type Input = TextRequest;

    fn kind(&self) -> CreationKind {
        CreationKind::Article
    }

    const ACCESS: Access = Access::FreeTier;

    fn validate(&self) -> Result<TextRequest, Failure> {
        require_prompt(self.prompt.as_deref()).map(TextRequest::new)
    }

    async fn delegate(&self, input: TextRequest, services: &Services) -> Result<Delegated, Failure> {
        let text = generate_text(services.writer.as_ref(), &input).await?;
        Ok(Delegated {
            prompt: input.prompt,
            artifact: Artifact::Text(text),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct GenerateBlogTitle {
    pub prompt: Option<String>,
}

#[async_trait]
impl Operation for GenerateBlogTitle {
    type Input = TextRequest;

    fn kind(&self) -> CreationKind {
        CreationKind::BlogTitle
    }

    const ACCESS: Access = Access::FreeTier;

    fn validate(&self) -> Result<TextRequest, Failure> {
        require_prompt(self.prompt.as_deref()).map(TextRequest::new)
    }

    async fn delegate(&self, input: TextRequest, services: &Services) -> Result<Delegated, Failure> {
        let text = generate_text(services.writer.as_ref(), &input).await?;
        Ok(Delegated {
            prompt: input.prompt,
            artifact: Artifact::Text(text),
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Image operations (premium only)
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct GenerateImage {
    pub prompt: Option<String>,
    pub publish: bool,
}

#[async_trait]
impl Operation for GenerateImage {
    type Input = String;

    fn kind(&self) -> CreationKind {
        CreationKind::Image
    }

    const ACCESS: Access = Access::PremiumOnly;

    fn publish(&self) -> bool {
        self.publish
    }

    fn validate(&self) -> Result<String, Failure> {
        require_prompt(self.prompt.as_deref()).map(String::from)
    }

    async fn delegate(&self, prompt: String, services: &Services) -> Result<Delegated, Failure> {
        let bytes = services
            .images
            .generate_image(&prompt)
            .await
            .map_err(provider_failure)?
            .ok_or_else(|| Failure::provider(NO_IMAGE))?;

        Ok(Delegated {
            prompt,
            artifact: Artifact::Image(Asset::new(bytes, "image/png").with_file_name("creation.png")),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct RemoveBackground {
    pub image: Option<Asset>,
}

#[async_trait]
impl Operation for RemoveBackground {
    type Input = Asset;

    fn kind(&self) -> CreationKind {
        CreationKind::Image
    }

    const ACCESS: Access = Access::PremiumOnly;

    fn validate(&self) -> Result<Asset, Failure> {
        require_file(self.image.as_ref(), NO_IMAGE_UPLOADED).cloned()
    }

    async fn delegate(&self, image: Asset, services: &Services) -> Result<Delegated, Failure> {
        let url = services
            .transformer
            .transform(&image, &Effect::BackgroundRemoval)
            .await
            .map_err(provider_failure)?;

        Ok(Delegated {
            prompt: REMOVE_BACKGROUND_PROMPT.to_string(),
            artifact: Artifact::Hosted(url),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct RemoveObject {
    pub image: Option<Asset>,
    pub object: Option<String>,
}

#[async_trait]
impl Operation for RemoveObject {
    type Input = (Asset, String);

    fn kind(&self) -> CreationKind {
        CreationKind::Image
    }

    const ACCESS: Access = Access::PremiumOnly;

    fn validate(&self) -> Result<(Asset, String), Failure> {
        let image = require_file(self.image.as_ref(), NO_IMAGE_UPLOADED)?;
        let object = require_single_word(self.object.as_deref())?;
        Ok((image.clone(), object.to_string()))
    }

    async fn delegate(&self, input: (Asset, String), services: &Services) -> Result<Delegated, Failure> {
        let (image, object) = input;
        let prompt = format!("Remove {object} from image");
        let url = services
            .transformer
            .transform(&image, &Effect::ObjectRemoval(object))
            .await
            .map_err(provider_failure)?;

        Ok(Delegated {
            prompt,
            artifact: Artifact::Hosted(url),
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Resume review (premium only)
// ────────────────────────────────────────────────────────────────────────────

/// Extracts plain text from a PDF document.
pub type ResumeReader = fn(&[u8]) -> Result<String, String>;

fn read_pdf_text(bytes: &[u8]) -> Result<String, String> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| e.to_string())
}

#[derive(Clone)]
pub struct ReviewResume {
    pub resume: Option<Asset>,
    reader: ResumeReader,
}

impl ReviewResume {
    pub fn new(resume: Option<Asset>) -> Self {
        Self::with_reader(resume, read_pdf_text)
    }

    pub fn with_reader(resume: Option<Asset>, reader: ResumeReader) -> Self {
        Self { resume, reader }
    }

    async fn extract_text(&self, resume: Bytes) -> Result<String, Failure> {
        let reader = self.reader;
        let text = tokio::task::spawn_blocking(move || reader(&resume))
            .await
            .map_err(|e| Failure::validation(format!("Could not read resume: {e}")))?
            .map_err(|e| Failure::validation(format!("Could not read resume: {e}")))?;

        if text.trim().is_empty() {
            return Err(Failure::validation("Resume contains no readable text."));
        }
        Ok(text)
    }
}

#[async_trait]
impl Operation for ReviewResume {
    type Input = Asset;

    fn kind(&self) -> CreationKind {
        CreationKind::ResumeReview
    }

    const ACCESS: Access = Access::PremiumOnly;

    fn validate(&self) -> Result<Asset, Failure> {
        let resume = require_file(self.resume.as_ref(), NO_RESUME_UPLOADED)?;
        check_resume_size(resume)?;
        Ok(resume.clone())
    }

    async fn delegate(&self, resume: Asset, services: &Services) -> Result<Delegated, Failure> {
        let text = self.extract_text(resume.bytes).await?;

        let request = TextRequest {
            max_tokens: Some(RESUME_REVIEW_MAX_TOKENS),
            temperature: Some(RESUME_REVIEW_TEMPERATURE),
            ..TextRequest::new(resume_review_prompt(&text))
        };
        let review = generate_text(services.reviewer.as_ref(), &request).await?;

        Ok(Delegated {
            prompt: REVIEW_RESUME_PROMPT.to_string(),
            artifact: Artifact::Text(review),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delegation::outcome::FailureKind;
    use crate::delegation::validation::{OBJECT_SINGLE_WORD, PROMPT_REQUIRED, RESUME_MAX_BYTES};

    #[test]
    fn test_article_prompt_is_forwarded_as_sent() {
        let op = GenerateArticle {
            prompt: Some(" The future of WebAssembly ".to_string()),
        };
        let request = op.validate().unwrap();
        assert_eq!(request.prompt, " The future of WebAssembly ");
        assert_eq!(request.max_tokens, None);
        assert_eq!(request.temperature, None);
    }

    #[test]
    fn test_blog_title_requires_prompt() {
        let err = GenerateBlogTitle { prompt: None }.validate().unwrap_err();
        assert_eq!(err.message, PROMPT_REQUIRED);
    }

    #[test]
    fn test_access_rules() {
        assert_eq!(GenerateArticle::ACCESS, Access::FreeTier);
        assert_eq!(GenerateBlogTitle::ACCESS, Access::FreeTier);
        assert_eq!(GenerateImage::ACCESS, Access::PremiumOnly);
        assert_eq!(RemoveBackground::ACCESS, Access::PremiumOnly);
        assert_eq!(RemoveObject::ACCESS, Access::PremiumOnly);
        assert_eq!(ReviewResume::ACCESS, Access::PremiumOnly);
    }

    #[test]
    fn test_only_generated_images_can_be_published() {
        let op = GenerateImage {
            prompt: Some("a lighthouse".to_string()),
            publish: true,
        };
        assert!(op.publish());
        assert!(!RemoveBackground::default().publish());
    }

    #[test]
    fn test_remove_object_checks_image_before_object() {
        let op = RemoveObject {
            image: None,
            object: Some("red car".to_string()),
        };
        assert_eq!(op.validate().unwrap_err().message, NO_IMAGE_UPLOADED);

        let op = RemoveObject {
            image: Some(Asset::new(vec![1u8], "image/png")),
            object: Some("red car".to_string()),
        };
        assert_eq!(op.validate().unwrap_err().message, OBJECT_SINGLE_WORD);
    }

    #[test]
    fn test_oversize_resume_rejected_before_reading() {
        fn must_not_read(_: &[u8]) -> Result<String, String> {
            panic!("resume should not be parsed");
        }
        let op = ReviewResume::with_reader(
            Some(Asset::new(vec![0u8; RESUME_MAX_BYTES + 1], "application/pdf")),
            must_not_read,
        );
        assert_eq!(op.validate().unwrap_err().kind, FailureKind::Validation);
    }

    #[tokio::test]
    async fn test_unreadable_pdf_is_a_validation_failure() {
        let op = ReviewResume::new(None);
        let err = op
            .extract_text(Bytes::from_static(b"definitely not a pdf"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, FailureKind::Validation);
        assert!(err.message.starts_with("Could not read resume"));
    }
}
