pub mod formatter;
pub mod prompt_service;
pub mod research_service;
pub mod section_parser;

pub use formatter::{apply_formatting, render_document};
pub use prompt_service::PromptBuilder;
pub use research_service::{ResearchService, NO_CONTEXT_SENTINEL};
pub use section_parser::parse_sections;
