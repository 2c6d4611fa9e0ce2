pub mod arxiv_client;
pub mod llm_client;

pub use arxiv_client::{ArxivClient, LiteratureSource};
pub use llm_client::{ChatBackend, ChatRequest, LlmClient};
