pub mod api_types;
pub mod cache;
pub mod client;
pub mod fallback;
pub mod gateway;
pub mod huggingface;
pub mod knowledge;
pub mod normalize;
pub mod prompt;
pub mod provider;
pub mod types;

pub use cache::{CacheSize, Collection, ContentCache, PruneReport};
pub use client::HttpProvider;
pub use gateway::ProviderGateway;
pub use huggingface::HuggingFaceProvider;
pub use provider::{Connectivity, ContentProvider};
pub use types::{
  Category, ChatMessage, ChatRecord, Difficulty, HealthStatus, LessonProgress, LessonRecord,
  LessonRequest, Quiz, QuizQuestion,
};
