//! Equal-width cut points

/// Cut points splitting `[min, max]` into `pieces` intervals of equal width.
///
/// A constant sample yields no cuts.
pub fn range_cuts(sorted_values: &[f64], pieces: usize) -> Vec<f64> {
    let (min, max) = match (sorted_values.first(), sorted_values.last()) {
        (Some(&min), Some(&max)) => (min, max),
        _ => return Vec::new(),
    };

    if pieces < 2 || max <= min {
        return Vec::new();
    }

    let width = (max - min) / pieces as f64;
    (1..pieces).map(|k| min + width * k as f64).collect()
}
