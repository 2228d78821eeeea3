//! Isotonic-regression cut points
//!
//! Pool-adjacent-violators over the distinct values: every pooled block is a
//! level of the isotonic fit, and the largest value of each block (but the
//! last) becomes a cut point.

use crate::pipeline::stats::spearman;

/// A pooled run of distinct values
#[derive(Debug, Clone, Copy)]
struct Block {
    upper: f64,
    bads: f64,
    count: f64,
}

impl Block {
    fn mean(&self) -> f64 {
        self.bads / self.count
    }
}

/// Cut points of an isotonic fit of outcome on value.
///
/// The fit is non-decreasing when the Spearman correlation between value and
/// outcome is non-negative, and non-increasing otherwise. Adjacent levels with
/// equal means are pooled. `sorted_values` must be ascending and aligned with
/// `sorted_outcomes`.
pub fn isotonic_cuts(sorted_values: &[f64], sorted_outcomes: &[i32]) -> Vec<f64> {
    if sorted_values.is_empty() {
        return Vec::new();
    }

    let outcomes: Vec<f64> = sorted_outcomes.iter().map(|&y| y as f64).collect();
    let increasing = spearman(sorted_values, &outcomes).map_or(true, |rho| rho >= 0.0);

    let violates = |left: &Block, right: &Block| {
        if increasing {
            left.mean() >= right.mean()
        } else {
            left.mean() <= right.mean()
        }
    };

    let mut blocks: Vec<Block> = Vec::new();
    let mut i = 0;
    while i < sorted_values.len() {
        // Equal values always share a block
        let value = sorted_values[i];
        let mut block = Block {
            upper: value,
            bads: 0.0,
            count: 0.0,
        };
        while i < sorted_values.len() && sorted_values[i] == value {
            block.bads += outcomes[i];
            block.count += 1.0;
            i += 1;
        }
        blocks.push(block);

        while blocks.len() >= 2 {
            let last = blocks.len() - 1;
            if !violates(&blocks[last - 1], &blocks[last]) {
                break;
            }
            let right = blocks[last];
            blocks.truncate(last);
            let left = &mut blocks[last - 1];
            left.upper = right.upper;
            left.bads += right.bads;
            left.count += right.count;
        }
    }

    blocks[..blocks.len() - 1].iter().map(|b| b.upper).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isotonic_increasing_levels() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let outcomes = [0, 0, 1, 0, 1, 1];
        // Blocks: {1,2} mean 0, {3,4} mean 0.5, {5,6} mean 1
        assert_eq!(isotonic_cuts(&values, &outcomes), vec![2.0, 4.0]);
    }

    #[test]
    fn test_isotonic_decreasing_levels() {
        let values = [1.0, 2.0, 3.0, 4.0];
        let outcomes = [1, 1, 0, 0];
        assert_eq!(isotonic_cuts(&values, &outcomes), vec![2.0]);
    }

    #[test]
    fn test_isotonic_keeps_ties_together() {
        let values = [1.0, 1.0, 2.0, 2.0];
        let outcomes = [0, 1, 1, 1];
        let cuts = isotonic_cuts(&values, &outcomes);
        assert_eq!(cuts, vec![1.0]);
    }

    #[test]
    fn test_isotonic_flat_outcome() {
        assert!(isotonic_cuts(&[1.0, 2.0, 3.0], &[0, 0, 0]).is_empty());
        assert!(isotonic_cuts(&[], &[]).is_empty());
    }
}
