pub mod literature;
pub mod loaders;
pub mod model_descriptor;
pub mod paper;
pub mod section;

pub use literature::LiteratureEntry;
pub use loaders::{load_model_catalog, load_paper_requests};
pub use model_descriptor::{default_catalog, ModelDescriptor};
pub use paper::{GenerationStatus, PaperMetadata, PaperRequest, PaperSections, ParsedDocument};
pub use section::SectionKey;
