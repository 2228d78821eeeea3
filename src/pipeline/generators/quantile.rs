//! Equal-frequency cut points

/// Cut points at the "lower" percentiles `k / pieces` for `k = 1..pieces`.
///
/// `sorted_values` must be ascending. Each percentile picks the observed value
/// at index `floor(k * (n - 1) / pieces)`; repeated cut points are dropped.
pub fn quantile_cuts(sorted_values: &[f64], pieces: usize) -> Vec<f64> {
    let n = sorted_values.len();
    if n == 0 || pieces < 2 {
        return Vec::new();
    }

    let mut cuts: Vec<f64> = (1..pieces)
        .map(|k| sorted_values[k * (n - 1) / pieces])
        .collect();
    cuts.dedup();

    cuts
}
