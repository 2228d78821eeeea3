//! Decision-tree cut points
//!
//! A CART-style recursive partition on the binary outcome: every split is the
//! one that most reduces Gini impurity, subject to a minimum leaf size, and
//! the split budget is shared between the two children.

/// Gini impurity of a node holding `bads` and `goods`: `2 * p * (1 - p)`
fn gini_impurity(bads: f64, goods: f64) -> f64 {
    let total = bads + goods;
    if total == 0.0 {
        return 0.0;
    }
    let p = bads / total;
    2.0 * p * (1.0 - p)
}

/// Best split of `sorted_pairs`, as (index where the right side starts, gain)
fn find_best_split(sorted_pairs: &[(f64, i32)], min_leaf_samples: usize) -> Option<(usize, f64)> {
    let n = sorted_pairs.len();
    if n < 2 || n < 2 * min_leaf_samples {
        return None;
    }

    let total_bads = sorted_pairs.iter().filter(|(_, y)| *y == 1).count() as f64;
    let total_goods = n as f64 - total_bads;
    let parent_gini = gini_impurity(total_bads, total_goods);

    let mut best_gain = 0.0;
    let mut best_split = None;
    let mut left_bads = 0.0f64;

    for i in 0..n - 1 {
        if sorted_pairs[i].1 == 1 {
            left_bads += 1.0;
        }

        let left_count = i + 1;
        let right_count = n - left_count;
        if left_count < min_leaf_samples || right_count < min_leaf_samples {
            continue;
        }

        // Never split inside a run of equal values
        if sorted_pairs[i].0 == sorted_pairs[i + 1].0 {
            continue;
        }

        let left_goods = left_count as f64 - left_bads;
        let right_bads = total_bads - left_bads;
        let right_goods = total_goods - left_goods;

        let left_share = left_count as f64 / n as f64;
        let right_share = right_count as f64 / n as f64;
        let child_gini = left_share * gini_impurity(left_bads, left_goods)
            + right_share * gini_impurity(right_bads, right_goods);

        let gain = parent_gini - child_gini;
        if gain > best_gain {
            best_gain = gain;
            best_split = Some(i + 1);
        }
    }

    best_split.map(|idx| (idx, best_gain))
}

fn split_recursive(
    sorted_pairs: &[(f64, i32)],
    offset: usize,
    max_splits: usize,
    min_leaf_samples: usize,
    split_indices: &mut Vec<usize>,
) {
    if max_splits == 0 {
        return;
    }

    if let Some((local_idx, _gain)) = find_best_split(sorted_pairs, min_leaf_samples) {
        let global_idx = offset + local_idx;
        split_indices.push(global_idx);

        let (left, right) = sorted_pairs.split_at(local_idx);
        let remaining = max_splits - 1;
        let left_splits = remaining / 2;
        let right_splits = remaining - left_splits;

        split_recursive(left, offset, left_splits, min_leaf_samples, split_indices);
        split_recursive(right, global_idx, right_splits, min_leaf_samples, split_indices);
    }
}

/// Cut points of a Gini tree with at most `max_leaves` leaves.
///
/// `sorted_pairs` holds (value, outcome) sorted by value. Each cut is the
/// largest value on the left side of a split.
pub fn tree_cuts(sorted_pairs: &[(f64, i32)], max_leaves: usize, min_leaf_samples: usize) -> Vec<f64> {
    let mut split_indices = Vec::new();
    split_recursive(
        sorted_pairs,
        0,
        max_leaves.saturating_sub(1),
        min_leaf_samples,
        &mut split_indices,
    );
    split_indices.sort_unstable();

    split_indices
        .into_iter()
        .map(|idx| sorted_pairs[idx - 1].0)
        .collect()
}
