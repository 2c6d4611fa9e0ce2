pub mod toml_loader;

pub use toml_loader::{load_model_catalog, load_paper_requests, validate_catalog};
