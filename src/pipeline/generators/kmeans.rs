//! One-dimensional k-means cut points

/// Index of the closest centroid, the first one on ties
fn nearest_centroid(centroids: &[f64], value: f64) -> usize {
    let mut best = 0;
    let mut best_dist = f64::MAX;
    for (i, c) in centroids.iter().enumerate() {
        let dist = (value - c).abs();
        if dist < best_dist {
            best_dist = dist;
            best = i;
        }
    }
    best
}

/// Cut points separating the clusters of a 1-D k-means fit.
///
/// Centroids are seeded at evenly spaced distinct values, so the result is
/// deterministic. Lloyd iterations stop when the centroids no longer move or
/// after `max_iter` rounds. Each cut is the largest value of a cluster.
pub fn kmeans_cuts(sorted_values: &[f64], clusters: usize, max_iter: usize) -> Vec<f64> {
    let mut distinct = sorted_values.to_vec();
    distinct.dedup();

    let k = clusters.min(distinct.len());
    if k < 2 {
        return Vec::new();
    }

    let mut centroids: Vec<f64> = (0..k)
        .map(|i| distinct[(2 * i + 1) * distinct.len() / (2 * k)])
        .collect();
    let mut labels = vec![0usize; sorted_values.len()];

    for _ in 0..max_iter {
        for (label, &value) in labels.iter_mut().zip(sorted_values) {
            *label = nearest_centroid(&centroids, value);
        }

        let mut sums = vec![0.0f64; k];
        let mut counts = vec![0usize; k];
        for (&label, &value) in labels.iter().zip(sorted_values) {
            sums[label] += value;
            counts[label] += 1;
        }

        // Empty clusters keep their previous centroid
        let updated: Vec<f64> = centroids
            .iter()
            .enumerate()
            .map(|(i, &c)| if counts[i] > 0 { sums[i] / counts[i] as f64 } else { c })
            .collect();

        if updated == centroids {
            break;
        }
        centroids = updated;
    }

    let mut cuts = Vec::new();
    for i in 1..sorted_values.len() {
        if labels[i] != labels[i - 1] {
            cuts.push(sorted_values[i - 1]);
        }
    }

    cuts
}
