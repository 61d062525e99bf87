pub mod assessment;
pub mod cache;
pub mod cache_keys;
pub mod catalog;
pub mod llm;

pub use assessment::AssessmentService;
pub use cache::{CachedGenerator, GenerationCache};
pub use catalog::FileCatalog;
pub use llm::{LlmClient, TextGenerator};
