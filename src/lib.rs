pub mod cache;
pub mod config;
pub mod embeddings;
pub mod error;
pub mod eval;

pub use config::Config;
pub use embeddings::{Component, Document, DocumentEmbedder, TextEmbedder};
pub use error::{EmbedrankError, Result};
pub use eval::{EvaluationReport, RankingEvaluator};
