// Prompt fragments sent to the LLM. Article and blog-title prompts are the
// caller's own text; only resume review wraps its input.

/// Instruction prepended to the text extracted from an uploaded resume.
pub const RESUME_REVIEW_INSTRUCTION: &str = "Review the following resume and provide \
    constructive feedback on its strengths, weaknesses, and areas for improvement.";

pub const RESUME_REVIEW_TEMPERATURE: f32 = 0.7;
pub const RESUME_REVIEW_MAX_TOKENS: u32 = 1000;

/// Builds the resume review prompt around the extracted PDF text.
pub fn resume_review_prompt(resume_text: &str) -> String {
    format!("{RESUME_REVIEW_INSTRUCTION}\n\n{resume_text}")
}
