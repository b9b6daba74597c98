//! Ranking evaluation: relevance tables, per-query reconciliation, and mean NDCG@K.

pub mod evaluator;
pub mod metrics;
pub mod reconcile;
pub mod records;

pub use evaluator::{EvaluationReport, QueryScore, RankingEvaluator, ScoreSource};
pub use metrics::ndcg_at_k;
pub use reconcile::{reconcile, ReconciledQueryGroup, ReconciledRow};
pub use records::{read_relevance_file, RelevanceRecord};
