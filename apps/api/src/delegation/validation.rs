use crate::delegation::outcome::Failure;
use crate::providers::Asset;

/// Largest resume accepted for review.
pub const RESUME_MAX_BYTES: usize = 5 * 1024 * 1024;

pub const PROMPT_REQUIRED: &str = "Prompt is required.";
pub const NO_IMAGE_UPLOADED: &str = "No image uploaded.";
pub const NO_RESUME_UPLOADED: &str = "No resume uploaded.";
pub const OBJECT_SINGLE_WORD: &str = "Object name must be a single word.";
pub const RESUME_TOO_LARGE: &str = "Resume file size exceeds allowed size (5MB).";

/// Returns the prompt as sent, or a validation failure when missing or blank.
pub fn require_prompt(prompt: Option<&str>) -> Result<&str, Failure> {
    prompt
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| Failure::validation(PROMPT_REQUIRED))
}

/// Returns the uploaded file, or `message` as a validation failure when no
/// file (or an empty one) was sent.
pub fn require_file<'a>(file: Option<&'a Asset>, message: &str) -> Result<&'a Asset, Failure> {
    file.filter(|f| !f.is_empty())
        .ok_or_else(|| Failure::validation(message))
}

/// An object name must be exactly one whitespace-delimited token.
pub fn require_single_word(object: Option<&str>) -> Result<&str, Failure> {
    let object = object.unwrap_or_default();
    let mut tokens = object.split_whitespace();
    match (tokens.next(), tokens.next()) {
        (Some(word), None) => Ok(word),
        _ => Err(Failure::validation(OBJECT_SINGLE_WORD)),
    }
}

pub fn check_resume_size(resume: &Asset) -> Result<(), Failure> {
    if resume.len() > RESUME_MAX_BYTES {
        return Err(Failure::validation(RESUME_TOO_LARGE));
    }
    Ok(())
}
