// Quota-gated delegation: every /api/ai route validates, gates, forwards to one
// provider, records the artifact, and charges free usage through `pipeline`.

pub mod handlers;
pub mod operations;
pub mod outcome;
pub mod pipeline;
pub mod quota;
pub mod upload;
pub mod validation;
