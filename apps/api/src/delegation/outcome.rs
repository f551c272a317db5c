use serde::Serialize;

pub const PREMIUM_ONLY: &str = "This feature is only available for premium subscriptions.";
pub const LIMIT_REACHED: &str = "Limit reached. Upgrade to continue.";
pub const NO_CONTENT: &str = "No content generated from AI.";
pub const NO_IMAGE: &str = "No image generated from AI.";

/// Which stage of the request refused it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    /// Bad or missing input. Nothing was called.
    Validation,
    /// Plan does not allow the operation, or the free allowance is spent.
    Quota,
    /// The provider failed or produced no artifact. Nothing was stored.
    Provider,
    /// Hosting, storing or usage accounting failed after the provider succeeded.
    Persistence,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Validation => "validation",
            FailureKind::Quota => "quota",
            FailureKind::Provider => "provider",
            FailureKind::Persistence => "persistence",
        }
    }
}

/// A refused request: never an HTTP error, always reported in the envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
}

impl Failure {
    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Validation,
            message: message.into(),
        }
    }

    pub fn quota(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Quota,
            message: message.into(),
        }
    }

    pub fn provider(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Provider,
            message: message.into(),
        }
    }

    pub fn persistence(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Persistence,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind.as_str(), self.message)
    }
}

/// Result of one delegated operation: the artifact (text or URL) on success.
pub type Outcome = Result<String, Failure>;

/// JSON body returned by every `/api/ai/*` route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Envelope {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<FailureKind>,
}

impl From<Outcome> for Envelope {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Ok(content) => Envelope {
                success: true,
                content: Some(content),
                message: None,
                kind: None,
            },
            Err(failure) => Envelope {
                success: false,
                content: None,
                message: Some(failure.message),
                kind: Some(failure.kind),
            },
        }
    }
}

impl From<Failure> for Envelope {
    fn from(failure: Failure) -> Self {
        Envelope::from(Err::<String, _>(failure))
    }
}
