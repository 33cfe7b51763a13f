// Hierarchical clustering of tracks by histogram similarity

use ndarray::Array2;

use super::features::l1_distance;

/// Cluster assignment result
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterResult {
    /// Cluster id (1-based) per input row
    pub labels: Vec<usize>,
    pub n_clusters: usize,
}

impl ClusterResult {
    /// Row indices belonging to cluster `id`, in ascending order
    pub fn members(&self, id: usize) -> Vec<usize> {
        self.labels
            .iter()
            .enumerate()
            .filter(|(_, label)| **label == id)
            .map(|(i, _)| i)
            .collect()
    }
}

/// Pairwise L1 distance matrix between histograms
pub fn pairwise_l1(histograms: &[&[f64]]) -> Array2<f64> {
    let n = histograms.len();
    let mut distances = Array2::zeros((n, n));
    for i in 0..n {
        for j in i + 1..n {
            let dist = l1_distance(histograms[i], histograms[j]);
            distances[[i, j]] = dist;
            distances[[j, i]] = dist;
        }
    }
    distances
}

/// Ward agglomerative clustering cut to at most `max_clusters` flat clusters.
///
/// Each row of `observations` is one observation vector; the Euclidean metric
/// is used between rows and merges follow the Lance-Williams Ward update.
/// The dendrogram is cut at the lowest height leaving at most `max_clusters`
/// clusters, so merges tied with the last one applied are always taken and
/// fewer clusters may remain. Cluster ids are numbered by their lowest member
/// row. Ties pick the lowest row pair.
pub fn ward_clusters(observations: &Array2<f64>, max_clusters: usize) -> ClusterResult {
    let n = observations.nrows();
    if n == 0 {
        return ClusterResult { labels: Vec::new(), n_clusters: 0 };
    }
    let k = max_clusters.clamp(1, n);

    let mut dist = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for j in i + 1..n {
            let d = observations
                .row(i)
                .iter()
                .zip(observations.row(j).iter())
                .map(|(a, b)| (a - b).powi(2))
                .sum::<f64>()
                .sqrt();
            dist[[i, j]] = d;
            dist[[j, i]] = d;
        }
    }

    // Each slot is named after its lowest member row
    let mut members: Vec<Vec<usize>> = (0..n).map(|i| vec![i]).collect();
    let mut active: Vec<usize> = (0..n).collect();

    let mut last_height: Option<f64> = None;

    while active.len() > 1 {
        let mut best = (active[0], active[1]);
        let mut best_dist = f64::INFINITY;
        for (pos, &a) in active.iter().enumerate() {
            for &b in &active[pos + 1..] {
                if dist[[a, b]] < best_dist {
                    best_dist = dist[[a, b]];
                    best = (a, b);
                }
            }
        }

        if active.len() <= k && last_height.map_or(true, |h| best_dist > h) {
            break;
        }
        last_height = Some(best_dist);

        let (a, b) = best;
        let size_a = members[a].len() as f64;
        let size_b = members[b].len() as f64;

        for &c in &active {
            if c == a || c == b {
                continue;
            }
            let size_c = members[c].len() as f64;
            let total = size_a + size_b + size_c;
            let updated = (((size_a + size_c) * dist[[a, c]].powi(2)
                + (size_b + size_c) * dist[[b, c]].powi(2)
                - size_c * best_dist.powi(2))
                / total)
                .max(0.0)
                .sqrt();
            dist[[a, c]] = updated;
            dist[[c, a]] = updated;
        }

        let merged = std::mem::take(&mut members[b]);
        members[a].extend(merged);
        active.retain(|&slot| slot != b);
    }

    let mut labels = vec![0usize; n];
    for (cluster, &slot) in active.iter().enumerate() {
        for &row in &members[slot] {
            labels[row] = cluster + 1;
        }
    }

    ClusterResult { labels, n_clusters: active.len() }
}
