//! Mean NDCG@K of a predicted ranking against ground truth.

use crate::error::{EmbedrankError, Result};
use crate::eval::metrics::ndcg_at_k;
use crate::eval::reconcile::{reconcile, ReconciledQueryGroup};
use crate::eval::records::{read_relevance_file, shift_scores_positive, RelevanceRecord};
use std::fmt;
use std::path::{Path, PathBuf};

pub const DEFAULT_K: usize = 10;

/// Predicted scores are shifted so the smallest equals this value
pub const SCORE_SHIFT_EPSILON: f64 = 1e-6;

/// Written next to the predictions file
pub const RESULTS_FILE_NAME: &str = "results.txt";

/// How a query's score was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreSource {
    /// One true item, one prediction, and they match
    ExactMatch,
    Ndcg,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryScore {
    pub query_id: String,
    pub score: f64,
    pub source: ScoreSource,
}

/// Score for the single-item case the ranking metric cannot meaningfully handle.
///
/// A query with exactly one true item and exactly one predicted item scores
/// 1.0 when the prediction is that item. Every other group, including one
/// without predicted rows, goes through NDCG@K.
pub fn degenerate_score(group: &ReconciledQueryGroup) -> Option<(f64, ScoreSource)> {
    if group.truth_count() == 1 && group.prediction_count() == 1 {
        let truth_item = group.rows.iter().find(|r| r.in_truth).map(|r| &r.item_id);
        let predicted_item = group.top_prediction().map(|r| &r.item_id);
        if truth_item.is_some() && truth_item == predicted_item {
            return Some((1.0, ScoreSource::ExactMatch));
        }
    }

    None
}

pub fn score_query(group: &ReconciledQueryGroup, k: usize) -> QueryScore {
    let (score, source) = degenerate_score(group).unwrap_or_else(|| {
        let score = ndcg_at_k(&group.true_scores(), &group.pred_scores(), k);
        (score, ScoreSource::Ndcg)
    });
    QueryScore {
        query_id: group.query_id.clone(),
        score,
        source,
    }
}

/// Result of one evaluation run
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationReport {
    pub k: usize,
    /// Mean over all queries present in either table
    pub ndcg: f64,
    pub queries: Vec<QueryScore>,
}

impl EvaluationReport {
    /// `NDCG@<k>: <score>` with three decimals
    pub fn summary(&self) -> String {
        format!("NDCG@{}: {:.3}", self.k, self.ndcg)
    }

    /// Write the summary line, without a trailing newline
    pub fn write_to(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.summary())?;
        Ok(())
    }

    /// Write the summary to [`results_path`] of `pred_path` and return that path
    pub fn write_beside(&self, pred_path: &Path) -> Result<PathBuf> {
        let path = results_path(pred_path);
        self.write_to(&path)?;
        log::info!("Wrote {}", path.display());
        Ok(path)
    }
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

/// `results.txt` in the directory containing `pred_path`
pub fn results_path(pred_path: &Path) -> PathBuf {
    pred_path
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join(RESULTS_FILE_NAME)
}

/// Scores a predicted ranking against ground-truth relevance with mean NDCG@K.
#[derive(Debug, Clone, Copy)]
pub struct RankingEvaluator {
    k: usize,
}

impl Default for RankingEvaluator {
    fn default() -> Self {
        Self::new(DEFAULT_K)
    }
}

impl RankingEvaluator {
    pub fn new(k: usize) -> Self {
        Self { k }
    }

    pub fn k(&self) -> usize {
        self.k
    }

    /// Shift predictions once, join with truth per query, and average the query scores.
    pub fn evaluate(
        &self,
        truth: &[RelevanceRecord],
        mut predicted: Vec<RelevanceRecord>,
    ) -> Result<EvaluationReport> {
        if self.k == 0 {
            return Err(EmbedrankError::InvalidInput(
                "cutoff k must be at least 1".to_string(),
            ));
        }

        shift_scores_positive(&mut predicted, SCORE_SHIFT_EPSILON);
        let groups = reconcile(truth, &predicted);
        if groups.is_empty() {
            return Err(EmbedrankError::InvalidInput(
                "no queries in either the truth or the predictions".to_string(),
            ));
        }

        let queries: Vec<QueryScore> = groups.iter().map(|g| score_query(g, self.k)).collect();
        for query in &queries {
            log::debug!(
                "query {}: {:.4} ({:?})",
                query.query_id,
                query.score,
                query.source
            );
        }

        let ndcg = queries.iter().map(|q| q.score).sum::<f64>() / queries.len() as f64;
        log::info!(
            "Evaluated {} queries ({} truth rows, {} predicted rows)",
            queries.len(),
            truth.len(),
            predicted.len()
        );

        Ok(EvaluationReport {
            k: self.k,
            ndcg,
            queries,
        })
    }

    pub fn evaluate_files(&self, truth_path: &Path, pred_path: &Path) -> Result<EvaluationReport> {
        let truth = read_relevance_file(truth_path)?;
        let predicted = read_relevance_file(pred_path)?;
        self.evaluate(&truth, predicted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(q: &str, p: &str, s: f64) -> RelevanceRecord {
        RelevanceRecord::new(q, p, s)
    }

    const HEADER: &str = "question-id\tpassage-id\tscore\n";

    #[test]
    fn single_correct_prediction_scores_one_for_any_k() {
        let truth = vec![rec("q1", "p1", 1.0)];
        for k in [1, 3, 10, 100] {
            let report = RankingEvaluator::new(k)
                .evaluate(&truth, vec![rec("q1", "p1", 0.9)])
                .unwrap();
            assert_eq!(report.ndcg, 1.0);
            assert_eq!(report.queries[0].source, ScoreSource::ExactMatch);
        }
    }

    #[test]
    fn irrelevant_item_ranked_first_scores_below_one() {
        let truth = vec![rec("q1", "p1", 1.0), rec("q1", "p2", 0.0)];
        let evaluator = RankingEvaluator::new(10);

        let report = evaluator
            .evaluate(&truth, vec![rec("q1", "p1", 0.1), rec("q1", "p2", 0.9)])
            .unwrap();
        assert!(report.ndcg < 1.0);
        assert!((report.ndcg - 1.0 / 3f64.log2()).abs() < 1e-9);

        let report = evaluator
            .evaluate(&truth, vec![rec("q1", "p1", 0.9), rec("q1", "p2", 0.1)])
            .unwrap();
        assert!((report.ndcg - 1.0).abs() < 1e-9);
    }

    #[test]
    fn unsorted_predictions_are_ranked_by_score() {
        let truth = vec![rec("q1", "p1", 1.0)];
        let report = RankingEvaluator::new(10)
            .evaluate(&truth, vec![rec("q1", "p2", 0.2), rec("q1", "p1", 0.8)])
            .unwrap();
        assert!((report.ndcg - 1.0).abs() < 1e-9);
        assert_eq!(report.queries[0].source, ScoreSource::Ndcg);
    }

    #[test]
    fn single_wrong_prediction_is_ranked_normally() {
        let truth = vec![rec("q1", "p1", 1.0)];
        let report = RankingEvaluator::new(10)
            .evaluate(&truth, vec![rec("q1", "p2", 0.9)])
            .unwrap();
        assert_eq!(report.queries[0].source, ScoreSource::Ndcg);
        assert!((report.ndcg - 1.0 / 3f64.log2()).abs() < 1e-9);

        let report = RankingEvaluator::new(1)
            .evaluate(&truth, vec![rec("q1", "p2", 0.9)])
            .unwrap();
        assert_eq!(report.ndcg, 0.0);
    }

    #[test]
    fn constant_shift_of_predictions_does_not_change_scores() {
        let truth = vec![
            rec("q1", "p1", 2.0),
            rec("q1", "p2", 1.0),
            rec("q2", "p3", 1.0),
        ];
        let predicted = vec![
            rec("q1", "p1", 0.3),
            rec("q1", "p2", 0.6),
            rec("q1", "p4", -0.2),
            rec("q2", "p3", 0.1),
            rec("q2", "p5", 0.4),
        ];
        let shifted: Vec<RelevanceRecord> = predicted
            .iter()
            .map(|r| rec(&r.query_id, &r.item_id, r.score + 42.0))
            .collect();

        let evaluator = RankingEvaluator::new(3);
        let a = evaluator.evaluate(&truth, predicted).unwrap();
        let b = evaluator.evaluate(&truth, shifted).unwrap();
        for (x, y) in a.queries.iter().zip(b.queries.iter()) {
            assert!((x.score - y.score).abs() < 1e-9);
        }
        assert!((a.ndcg - b.ndcg).abs() < 1e-9);
    }

    #[test]
    fn mean_covers_queries_from_either_table() {
        let truth = vec![
            rec("q1", "p1", 1.0),
            rec("q2", "p5", 1.0),
            rec("q3", "p7", 1.0),
        ];
        let predicted = vec![
            rec("q1", "p1", 0.9),
            rec("q2", "p4", 0.8),
            rec("q2", "p5", 0.3),
            rec("q4", "p1", 0.2),
        ];
        let report = RankingEvaluator::new(10).evaluate(&truth, predicted).unwrap();

        let ids: Vec<&str> = report.queries.iter().map(|q| q.query_id.as_str()).collect();
        assert_eq!(ids, vec!["q1", "q2", "q3", "q4"]);
        assert_eq!(report.queries[0].score, 1.0);
        assert!((report.queries[1].score - 1.0 / 3f64.log2()).abs() < 1e-9);
        // q3 has one true item and no predictions: true [1], pred [0]
        assert_eq!(report.queries[2].source, ScoreSource::Ndcg);
        assert_eq!(report.queries[2].score, 1.0);
        assert_eq!(report.queries[3].score, 0.0);

        let expected = (1.0 + 1.0 / 3f64.log2() + 1.0) / 4.0;
        assert!((report.ndcg - expected).abs() < 1e-9);
        assert_eq!(report.summary(), "NDCG@10: 0.658");
    }

    #[test]
    fn truth_only_query_is_scored_against_zero_predictions() {
        let truth = vec![
            rec("q1", "p1", 1.0),
            rec("q1", "p2", 0.0),
            rec("q2", "p3", 1.0),
        ];
        let predicted = vec![rec("q2", "p3", 0.5), rec("q2", "p4", 0.1)];

        for k in [1, 10] {
            let report = RankingEvaluator::new(k)
                .evaluate(&truth, predicted.clone())
                .unwrap();
            let q1 = &report.queries[0];
            assert_eq!(q1.query_id, "q1");
            assert_eq!(q1.source, ScoreSource::Ndcg);
            assert!((q1.score - ndcg_at_k(&[1.0, 0.0], &[0.0, 0.0], k)).abs() < 1e-12);
        }

        let report = RankingEvaluator::new(10).evaluate(&truth, predicted).unwrap();
        assert!((report.queries[0].score - 0.5 * (1.0 + 1.0 / 3f64.log2())).abs() < 1e-9);
        assert!((report.queries[1].score - 1.0).abs() < 1e-9);
        assert_eq!(report.summary(), "NDCG@10: 0.908");
    }

    #[test]
    fn empty_tables_are_invalid() {
        let err = RankingEvaluator::default().evaluate(&[], Vec::new()).unwrap_err();
        assert!(matches!(err, EmbedrankError::InvalidInput(_)));
    }

    #[test]
    fn zero_cutoff_is_invalid() {
        let err = RankingEvaluator::new(0)
            .evaluate(&[rec("q1", "p1", 1.0)], vec![rec("q1", "p1", 1.0)])
            .unwrap_err();
        assert!(matches!(err, EmbedrankError::InvalidInput(_)));
    }

    #[test]
    fn results_path_is_next_to_predictions() {
        assert_eq!(
            results_path(Path::new("/runs/bm25/pred.tsv")),
            PathBuf::from("/runs/bm25/results.txt")
        );
        assert_eq!(results_path(Path::new("pred.tsv")), PathBuf::from("results.txt"));
    }

    #[test]
    fn evaluate_files_and_write_results() {
        let dir = tempfile::tempdir().unwrap();
        let run_dir = dir.path().join("run");
        std::fs::create_dir(&run_dir).unwrap();

        let truth_path = dir.path().join("true.tsv");
        let pred_path = run_dir.join("pred.tsv");
        std::fs::write(&truth_path, format!("{HEADER}q1\tp1\t1\nq2\tp2\t1\nq2\tp3\t0\n")).unwrap();
        std::fs::write(
            &pred_path,
            format!("{HEADER}q1\tp1\t12.5\nq2\tp3\t3.0\nq2\tp2\t7.0\n"),
        )
        .unwrap();

        let report = RankingEvaluator::new(10)
            .evaluate_files(&truth_path, &pred_path)
            .unwrap();
        assert_eq!(report.summary(), "NDCG@10: 1.000");

        let written = report.write_beside(&pred_path).unwrap();
        assert_eq!(written, run_dir.join(RESULTS_FILE_NAME));
        assert_eq!(std::fs::read_to_string(written).unwrap(), "NDCG@10: 1.000");
    }

    #[test]
    fn missing_predictions_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let truth_path = dir.path().join("true.tsv");
        std::fs::write(&truth_path, format!("{HEADER}q1\tp1\t1\n")).unwrap();
        let result = RankingEvaluator::default().evaluate_files(&truth_path, &dir.path().join("pred.tsv"));
        assert!(matches!(result, Err(EmbedrankError::Io(_))));
    }
}
