//! Relevance records and their tab-separated file format.

use crate::error::{EmbedrankError, Result};
use std::io::Read;
use std::path::Path;

pub const QUERY_ID_COLUMN: &str = "question-id";
pub const ITEM_ID_COLUMN: &str = "passage-id";
pub const SCORE_COLUMN: &str = "score";

/// One (query, item, score) row of a ground-truth or predicted table
#[derive(Debug, Clone, PartialEq)]
pub struct RelevanceRecord {
    pub query_id: String,
    pub item_id: String,
    pub score: f64,
}

impl RelevanceRecord {
    pub fn new(query_id: impl Into<String>, item_id: impl Into<String>, score: f64) -> Self {
        Self {
            query_id: query_id.into(),
            item_id: item_id.into(),
            score,
        }
    }
}

/// Read a TSV file with a header containing `question-id`, `passage-id` and `score`.
/// Other columns are ignored.
pub fn read_relevance_file(path: &Path) -> Result<Vec<RelevanceRecord>> {
    let file = std::fs::File::open(path)?;
    let records = parse_relevance_tsv(file).map_err(|e| match e {
        EmbedrankError::Parse(msg) => {
            EmbedrankError::Parse(format!("{}: {}", path.display(), msg))
        }
        other => other,
    })?;
    log::info!("Loaded {} relevance records from {}", records.len(), path.display());
    Ok(records)
}

pub fn parse_relevance_tsv<R: Read>(reader: R) -> Result<Vec<RelevanceRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| EmbedrankError::Parse(format!("missing '{}' column", name)))
    };
    let query_idx = column(QUERY_ID_COLUMN)?;
    let item_idx = column(ITEM_ID_COLUMN)?;
    let score_idx = column(SCORE_COLUMN)?;

    let mut records = Vec::new();
    for (row, result) in reader.records().enumerate() {
        let record = result?;
        let line = row + 2;
        let field = |idx: usize, name: &str| {
            record
                .get(idx)
                .map(str::trim)
                .ok_or_else(|| EmbedrankError::Parse(format!("line {}: missing {}", line, name)))
        };

        let query_id = field(query_idx, QUERY_ID_COLUMN)?;
        let item_id = field(item_idx, ITEM_ID_COLUMN)?;
        let raw_score = field(score_idx, SCORE_COLUMN)?;
        let score = raw_score.parse::<f64>().map_err(|_| {
            EmbedrankError::Parse(format!("line {}: invalid score '{}'", line, raw_score))
        })?;
        if !score.is_finite() {
            return Err(EmbedrankError::Parse(format!(
                "line {}: score must be finite, got '{}'",
                line, raw_score
            )));
        }

        records.push(RelevanceRecord::new(query_id, item_id, score));
    }

    Ok(records)
}

/// Shift all scores by `min - epsilon` so the smallest becomes `epsilon`.
///
/// Applied once to the whole predicted table; order within every query is kept.
pub fn shift_scores_positive(records: &mut [RelevanceRecord], epsilon: f64) {
    let min = records
        .iter()
        .map(|r| r.score)
        .fold(f64::INFINITY, f64::min);
    if !min.is_finite() {
        return;
    }
    let shift = min - epsilon;
    for record in records.iter_mut() {
        record.score -= shift;
    }
}
