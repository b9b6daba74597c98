//! Normalized Discounted Cumulative Gain.
//!
//! Items are ranked by predicted score, descending. Items with equal
//! predicted scores share their positions: the gain of a tied block is the
//! mean gain of its items spread over the block's discounts, which is the
//! expected DCG over every order of the tie. The score of a query therefore
//! never depends on the order its rows are listed in.

/// `1 / log2(position + 2)` for the first `k` of `n` positions, zero after.
fn discounts(n: usize, k: usize) -> Vec<f64> {
    (0..n)
        .map(|i| {
            if i < k {
                1.0 / (i as f64 + 2.0).log2()
            } else {
                0.0
            }
        })
        .collect()
}

/// DCG@K of `true_scores` ranked by `pred_scores`, with tied predictions averaged.
///
/// Both slices describe the same items in the same order.
pub fn dcg_at_k(true_scores: &[f64], pred_scores: &[f64], k: usize) -> f64 {
    debug_assert_eq!(true_scores.len(), pred_scores.len());
    let n = true_scores.len().min(pred_scores.len());

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| pred_scores[b].total_cmp(&pred_scores[a]));
    let discount = discounts(n, k);

    let mut dcg = 0.0;
    let mut start = 0;
    while start < n {
        let tied = pred_scores[order[start]];
        let mut end = start + 1;
        while end < n && pred_scores[order[end]] == tied {
            end += 1;
        }

        let mean_gain = order[start..end]
            .iter()
            .map(|&i| true_scores[i])
            .sum::<f64>()
            / (end - start) as f64;
        let discount_sum: f64 = discount[start..end].iter().sum();
        dcg += mean_gain * discount_sum;

        start = end;
    }
    dcg
}

/// DCG@K of the best possible ordering (true scores sorted descending)
pub fn ideal_dcg_at_k(true_scores: &[f64], k: usize) -> f64 {
    let mut sorted = true_scores.to_vec();
    sorted.sort_by(|a, b| b.total_cmp(a));
    sorted
        .iter()
        .zip(discounts(sorted.len(), k))
        .map(|(gain, discount)| gain * discount)
        .sum()
}

/// NDCG@K = DCG@K / IDCG@K, or 0.0 when IDCG@K is 0
pub fn ndcg_at_k(true_scores: &[f64], pred_scores: &[f64], k: usize) -> f64 {
    let ideal = ideal_dcg_at_k(true_scores, k);
    if ideal <= 0.0 {
        return 0.0;
    }
    dcg_at_k(true_scores, pred_scores, k) / ideal
}
