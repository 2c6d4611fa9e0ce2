pub mod generation_ctx;
pub mod generation_flow;

pub use generation_ctx::{FailedAttempt, GenerationJob};
pub use generation_flow::{AttemptParameters, GenerationFlow, ModelOutcome};
