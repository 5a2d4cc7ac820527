//! Seeded k-means over feature vectors.

use crate::types::{ClusterLabel, FeatureVector, MarketCluster, FEATURE_COUNT};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Per-feature divisors for the weighted distance, in [`FeatureVector::to_array`] order.
pub const DISTANCE_SCALES: [f64; FEATURE_COUNT] = [10.0, 10.0, 100.0, 100.0, 100.0, 100.0, 50.0];

#[derive(Debug, Clone, Copy)]
pub struct KMeansParams {
    pub k: usize,
    pub max_iterations: usize,
    pub tolerance: f64,
    pub seed: u64,
}

impl Default for KMeansParams {
    fn default() -> Self {
        Self {
            k: 5,
            max_iterations: 100,
            tolerance: 0.001,
            seed: 42,
        }
    }
}

/// Outcome of one clustering run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusteringResult {
    pub clusters: Vec<MarketCluster>,
    /// Cluster index per input point. Empty for the default result.
    pub assignments: Vec<usize>,
    pub iterations: usize,
    pub converged: bool,
    /// Largest centroid shift in the final iteration.
    pub last_shift: f64,
}

/// Weighted Euclidean distance between two vectors.
pub fn distance(a: &FeatureVector, b: &FeatureVector) -> f64 {
    let (a, b) = (a.to_array(), b.to_array());
    a.iter()
        .zip(b.iter())
        .zip(DISTANCE_SCALES.iter())
        .map(|((x, y), scale)| ((x - y) / scale).powi(2))
        .sum::<f64>()
        .sqrt()
}

/// Index of the centroid closest to `point`.
pub fn nearest(point: &FeatureVector, centroids: &[FeatureVector]) -> Option<usize> {
    centroids
        .iter()
        .enumerate()
        .map(|(i, c)| (i, distance(point, c)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}

fn cluster_id(index: usize) -> String {
    format!("cluster_{}", index)
}

/// One cluster per label around the neutral vector, for runs that cannot cluster.
pub fn default_clusters() -> Vec<MarketCluster> {
    ClusterLabel::ALL
        .iter()
        .enumerate()
        .map(|(i, label)| MarketCluster {
            id: cluster_id(i),
            centroid: FeatureVector::neutral(),
            members: Vec::new(),
            label: *label,
            confidence: 50.0,
        })
        .collect()
}

fn mean(points: &[FeatureVector], members: &[usize]) -> FeatureVector {
    if members.is_empty() {
        return FeatureVector::neutral();
    }
    let mut sum = [0.0; FEATURE_COUNT];
    for &i in members {
        for (s, v) in sum.iter_mut().zip(points[i].to_array()) {
            *s += v;
        }
    }
    let n = members.len() as f64;
    FeatureVector::from_array(sum.map(|s| s / n), 0)
}

fn group(assignments: &[usize], k: usize) -> Vec<Vec<usize>> {
    let mut members = vec![Vec::new(); k];
    for (point, &cluster) in assignments.iter().enumerate() {
        members[cluster].push(point);
    }
    members
}

/// Cluster `points` into exactly `params.k` groups.
///
/// Fewer points than `k`, or `k == 0`, returns [`default_clusters`].
pub fn kmeans(points: &[FeatureVector], params: &KMeansParams) -> ClusteringResult {
    let k = params.k;
    if k == 0 || points.len() < k {
        return ClusteringResult {
            clusters: default_clusters(),
            assignments: Vec::new(),
            iterations: 0,
            converged: false,
            last_shift: 0.0,
        };
    }

    let mut rng = StdRng::seed_from_u64(params.seed);
    let mut centroids: Vec<FeatureVector> = rand::seq::index::sample(&mut rng, points.len(), k)
        .iter()
        .map(|i| points[i])
        .collect();

    let mut assignments = vec![0; points.len()];
    let mut iterations = 0;
    let mut converged = false;
    let mut last_shift = 0.0;

    while iterations < params.max_iterations {
        iterations += 1;
        for (slot, point) in assignments.iter_mut().zip(points) {
            *slot = nearest(point, &centroids).unwrap_or(0);
        }

        let next: Vec<FeatureVector> = group(&assignments, k)
            .iter()
            .map(|members| mean(points, members))
            .collect();

        last_shift = centroids
            .iter()
            .zip(&next)
            .map(|(old, new)| distance(old, new))
            .fold(0.0, f64::max);
        centroids = next;

        if last_shift < params.tolerance {
            converged = true;
            break;
        }
    }

    let clusters = group(&assignments, k)
        .into_iter()
        .zip(centroids)
        .enumerate()
        .map(|(i, (members, centroid))| {
            let confidence = if members.is_empty() {
                0.0
            } else {
                let spread = members.iter().map(|&m| distance(&points[m], &centroid)).sum::<f64>()
                    / members.len() as f64;
                (100.0 - 50.0 * spread).clamp(0.0, 100.0)
            };
            MarketCluster {
                id: cluster_id(i),
                centroid,
                members,
                label: ClusterLabel::from_centroid(&centroid),
                confidence,
            }
        })
        .collect();

    ClusteringResult {
        clusters,
        assignments,
        iterations,
        converged,
        last_shift,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(volatility: f64, tvl: f64, sentiment: f64) -> FeatureVector {
        FeatureVector {
            price_volatility: volatility,
            tvl_change: tvl,
            market_sentiment: sentiment,
            ..FeatureVector::neutral()
        }
    }

    fn blobs() -> Vec<FeatureVector> {
        let mut points = Vec::new();
        for i in 0..10 {
            let jitter = i as f64 * 0.01;
            points.push(point(1.0 + jitter, 10.0, 70.0));
            points.push(point(1.0 + jitter, -10.0, 30.0));
            points.push(point(40.0 + jitter, 0.0, 50.0));
        }
        points
    }

    #[test]
    fn test_distance_scales() {
        let a = FeatureVector::neutral();
        let mut b = a;
        b.price_volatility = 10.0;
        assert!((distance(&a, &b) - 1.0).abs() < 1e-12);
        b.gas_price = 150.0;
        assert!((distance(&a, &b) - 2f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_too_few_points_returns_defaults() {
        let result = kmeans(&blobs()[..3], &KMeansParams::default());
        assert_eq!(result.clusters.len(), 5);
        assert!(result.assignments.is_empty());
        let labels: Vec<ClusterLabel> = result.clusters.iter().map(|c| c.label).collect();
        assert_eq!(labels, ClusterLabel::ALL.to_vec());

        let zero = kmeans(&blobs(), &KMeansParams { k: 0, ..KMeansParams::default() });
        assert_eq!(zero.clusters.len(), 5);
    }

    #[test]
    fn test_every_point_in_exactly_one_cluster() {
        let points = blobs();
        let params = KMeansParams::default();
        let result = kmeans(&points, &params);

        assert_eq!(result.clusters.len(), params.k);
        assert_eq!(result.assignments.len(), points.len());

        let mut seen = vec![0usize; points.len()];
        for cluster in &result.clusters {
            for &m in &cluster.members {
                seen[m] += 1;
            }
        }
        assert!(seen.iter().all(|&n| n == 1));
        assert!(result.converged || result.iterations == params.max_iterations);
        if result.converged {
            assert!(result.last_shift < params.tolerance);
        }
    }

    #[test]
    fn test_one_point_per_cluster() {
        let points = vec![point(1.0, 10.0, 70.0), point(1.0, -10.0, 30.0), point(40.0, 0.0, 50.0)];
        let result = kmeans(&points, &KMeansParams { k: 3, ..KMeansParams::default() });

        let mut labels: Vec<ClusterLabel> = result.clusters.iter().map(|c| c.label).collect();
        labels.sort_by_key(|l| l.name());
        assert_eq!(labels, vec![ClusterLabel::Bearish, ClusterLabel::Bullish, ClusterLabel::Volatile]);
        assert!(result.converged);
        assert!(result.clusters.iter().all(|c| c.confidence == 100.0));
    }

    #[test]
    fn test_same_seed_same_result() {
        let points = blobs();
        let params = KMeansParams::default();
        assert_eq!(kmeans(&points, &params), kmeans(&points, &params));
    }
}
