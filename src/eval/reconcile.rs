//! Align ground-truth and predicted relevance tables per query.

use crate::eval::RelevanceRecord;
use std::collections::BTreeMap;

/// One row of the outer join of truth and predictions on (query, item).
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciledRow {
    pub item_id: String,
    /// 0.0 when the item is not in the truth table
    pub true_score: f64,
    /// 0.0 when the item was not predicted
    pub pred_score: f64,
    pub in_truth: bool,
    /// Position among the query's predicted rows in input order
    pub prediction_position: Option<usize>,
}

/// All joined rows of one query, ordered by item id
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciledQueryGroup {
    pub query_id: String,
    pub rows: Vec<ReconciledRow>,
}

impl ReconciledQueryGroup {
    pub fn true_scores(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.true_score).collect()
    }

    /// Same row order as [`Self::true_scores`]
    pub fn pred_scores(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.pred_score).collect()
    }

    pub fn truth_count(&self) -> usize {
        self.rows.iter().filter(|r| r.in_truth).count()
    }

    pub fn prediction_count(&self) -> usize {
        self.rows
            .iter()
            .filter(|r| r.prediction_position.is_some())
            .count()
    }

    /// Highest-scoring predicted row; ties go to the earlier input row
    pub fn top_prediction(&self) -> Option<&ReconciledRow> {
        self.rows
            .iter()
            .filter_map(|r| r.prediction_position.map(|pos| (pos, r)))
            .max_by(|(pos_a, a), (pos_b, b)| {
                a.pred_score
                    .total_cmp(&b.pred_score)
                    .then_with(|| pos_b.cmp(pos_a))
            })
            .map(|(_, r)| r)
    }
}

#[derive(Default)]
struct JoinSlot {
    truth: Vec<f64>,
    predicted: Vec<(usize, f64)>,
}

/// Full outer join of `truth` and `predicted` on (query id, item id), grouped by query.
///
/// Groups come out sorted by query id. Keys repeated within a table join as a
/// cross product; a side without the key contributes a 0.0 score.
pub fn reconcile(
    truth: &[RelevanceRecord],
    predicted: &[RelevanceRecord],
) -> Vec<ReconciledQueryGroup> {
    let mut slots: BTreeMap<(&str, &str), JoinSlot> = BTreeMap::new();
    for record in truth {
        slots
            .entry((record.query_id.as_str(), record.item_id.as_str()))
            .or_default()
            .truth
            .push(record.score);
    }

    let mut positions: BTreeMap<&str, usize> = BTreeMap::new();
    for record in predicted {
        let position = positions.entry(record.query_id.as_str()).or_insert(0);
        slots
            .entry((record.query_id.as_str(), record.item_id.as_str()))
            .or_default()
            .predicted
            .push((*position, record.score));
        *position += 1;
    }

    let mut groups: Vec<ReconciledQueryGroup> = Vec::new();
    for ((query_id, item_id), slot) in slots {
        if groups.last().map(|g| g.query_id.as_str()) != Some(query_id) {
            groups.push(ReconciledQueryGroup {
                query_id: query_id.to_string(),
                rows: Vec::new(),
            });
        }
        let rows = match groups.last_mut() {
            Some(group) => &mut group.rows,
            None => continue,
        };

        let truth_side: Vec<Option<f64>> = if slot.truth.is_empty() {
            vec![None]
        } else {
            slot.truth.iter().copied().map(Some).collect()
        };
        let predicted_side: Vec<Option<(usize, f64)>> = if slot.predicted.is_empty() {
            vec![None]
        } else {
            slot.predicted.iter().copied().map(Some).collect()
        };

        for true_score in &truth_side {
            for prediction in &predicted_side {
                rows.push(ReconciledRow {
                    item_id: item_id.to_string(),
                    true_score: true_score.unwrap_or(0.0),
                    pred_score: prediction.map_or(0.0, |(_, score)| score),
                    in_truth: true_score.is_some(),
                    prediction_position: prediction.map(|(pos, _)| pos),
                });
            }
        }
    }

    groups
}
