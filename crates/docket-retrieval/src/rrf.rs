//! Reciprocal Rank Fusion: `score(d) = Σ_r weight_r / (k + rank_r(d))`,
//! summed over every ranked list `d` appears in. Absent from a list
//! contributes 0 to that term. Used both for the two-leg BM25/semantic
//! fusion in [`crate::hybrid`] and the cross-matter fusion in
//! [`crate::global`] (there with a single unweighted list per matter).

use std::collections::HashMap;
use std::hash::Hash;

/// `lists` pairs a 1-indexed ranked list (rank 1 is the top result) with
/// the weight its contribution is scaled by. Returns every distinct item
/// with its fused score, sorted descending — ties broken by first-seen
/// order since `HashMap` iteration order is otherwise unspecified and
/// callers expect a stable sort.
pub fn fuse<T: Eq + Hash + Clone>(lists: &[(&[(T, usize)], f64)], k: f64) -> Vec<(T, f64)> {
    let mut order = Vec::new();
    let mut scores: HashMap<T, f64> = HashMap::new();

    for (list, weight) in lists {
        for (item, rank) in list.iter() {
            if !scores.contains_key(item) {
                order.push(item.clone());
            }
            *scores.entry(item.clone()).or_insert(0.0) += weight / (k + *rank as f64);
        }
    }

    let mut out: Vec<(T, f64)> = order.into_iter().map(|item| {
        let score = scores[&item];
        (item, score)
    }).collect();
    out.sort_by(|a, b| b.1.total_cmp(&a.1));
    out
}
