use super::features::extract_features;
use super::kmeans::{distance, kmeans, ClusteringResult, KMeansParams};
use crate::config::MlConfig;
use crate::types::{
    ClusterLabel, FeatureVector, LabeledOutcome, MarketCluster, MarketContext, ModelMetrics, ModelWeights, Outcome,
    Prediction, FEATURE_COUNT,
};
use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Score at or above which a prediction counts as a positive call.
pub const POSITIVE_THRESHOLD: f64 = 50.0;

/// Clustering and linear opportunity model with online training.
pub struct MlEngine {
    config: MlConfig,
    default_gas: f64,
    weights: RwLock<ModelWeights>,
    training: RwLock<Vec<LabeledOutcome>>,
    metrics: RwLock<ModelMetrics>,
    clusters: DashMap<String, MarketCluster>,
}

impl MlEngine {
    pub fn new(config: MlConfig, default_gas: f64) -> Self {
        Self {
            config,
            default_gas,
            weights: RwLock::new(ModelWeights::default()),
            training: RwLock::new(Vec::new()),
            metrics: RwLock::new(ModelMetrics::default()),
            clusters: DashMap::new(),
        }
    }

    fn params(&self) -> KMeansParams {
        KMeansParams {
            k: self.config.k,
            max_iterations: self.config.max_iterations,
            tolerance: self.config.tolerance,
            seed: self.config.seed,
        }
    }

    pub fn extract_features(&self, ctx: &MarketContext) -> FeatureVector {
        extract_features(ctx, self.default_gas, Utc::now().timestamp_millis())
    }

    /// Run k-means over `points` and replace the cluster map with the result.
    pub fn cluster(&self, points: &[FeatureVector]) -> ClusteringResult {
        let result = kmeans(points, &self.params());
        self.clusters.clear();
        for cluster in &result.clusters {
            self.clusters.insert(cluster.id.clone(), cluster.clone());
        }
        debug!(
            "Clustered {} points into {} clusters ({} iterations, converged: {})",
            points.len(),
            result.clusters.len(),
            result.iterations,
            result.converged
        );
        result
    }

    /// Current clusters, sorted by id.
    pub fn clusters(&self) -> Vec<MarketCluster> {
        let mut out: Vec<MarketCluster> = self.clusters.iter().map(|e| e.value().clone()).collect();
        out.sort_by(|a, b| a.id.cmp(&b.id));
        out
    }

    pub async fn weights(&self) -> ModelWeights {
        *self.weights.read().await
    }

    pub async fn metrics(&self) -> ModelMetrics {
        *self.metrics.read().await
    }

    /// Labeled points accumulated so far.
    pub async fn training_len(&self) -> usize {
        self.training.read().await.len()
    }

    pub async fn predict(&self, features: &FeatureVector) -> Prediction {
        let weights = *self.weights.read().await;
        predict_with(features, &weights, &self.clusters())
    }

    /// Add labeled outcomes and, once enough have accumulated, take a training step.
    ///
    /// Returns the metrics in effect afterwards.
    pub async fn train(&self, points: Vec<LabeledOutcome>) -> ModelMetrics {
        let dataset = {
            let mut training = self.training.write().await;
            training.extend(points.into_iter().map(|p| LabeledOutcome {
                features: p.features.clamped(),
                outcome: p.outcome,
            }));
            training.clone()
        };

        if dataset.len() < self.config.min_training_points {
            debug!(
                "Training deferred: {} of {} labeled points",
                dataset.len(),
                self.config.min_training_points
            );
            return self.metrics().await;
        }

        let weights = {
            let mut weights = self.weights.write().await;
            let mut w = weights.features();
            for (weight, gap) in w.iter_mut().zip(class_gap(&dataset)) {
                *weight += sign(gap) * self.config.learning_rate;
            }
            weights.set_features(w);
            weights.normalize();
            *weights
        };

        let points: Vec<FeatureVector> = dataset.iter().map(|p| p.features).collect();
        self.cluster(&points);

        let window = &dataset[dataset.len().saturating_sub(self.config.metrics_window)..];
        let metrics = evaluate(window, &weights, &self.clusters());
        *self.metrics.write().await = metrics;

        info!(
            "Model trained on {} points: accuracy {:.3}, precision {:.3}, recall {:.3}, f1 {:.3}",
            dataset.len(),
            metrics.accuracy,
            metrics.precision,
            metrics.recall,
            metrics.f1
        );
        metrics
    }
}

fn sign(v: f64) -> f64 {
    if v > 0.0 {
        1.0
    } else if v < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Per-feature mean(success) − mean(failure). Zero when either class is empty.
fn class_gap(dataset: &[LabeledOutcome]) -> [f64; FEATURE_COUNT] {
    let mut sums = [[0.0; FEATURE_COUNT]; 2];
    let mut counts = [0usize; 2];
    for point in dataset {
        let class = match point.outcome {
            Outcome::Success => 0,
            Outcome::Failure => 1,
        };
        counts[class] += 1;
        for (s, v) in sums[class].iter_mut().zip(point.features.to_array()) {
            *s += v;
        }
    }
    if counts[0] == 0 || counts[1] == 0 {
        return [0.0; FEATURE_COUNT];
    }
    let mut gap = [0.0; FEATURE_COUNT];
    for (i, g) in gap.iter_mut().enumerate() {
        *g = sums[0][i] / counts[0] as f64 - sums[1][i] / counts[1] as f64;
    }
    gap
}

/// Score a feature vector against fixed weights and clusters.
pub fn predict_with(features: &FeatureVector, weights: &ModelWeights, clusters: &[MarketCluster]) -> Prediction {
    let matched = clusters
        .iter()
        .min_by(|a, b| distance(features, &a.centroid).total_cmp(&distance(features, &b.centroid)));

    let (cluster_id, label, confidence) = match matched {
        Some(cluster) => (Some(cluster.id.clone()), cluster.label, cluster.confidence),
        None => (None, ClusterLabel::from_centroid(features), 50.0),
    };

    let linear: f64 = features
        .to_array()
        .iter()
        .zip(weights.features())
        .map(|(f, w)| f * w)
        .sum();
    let score = (50.0 + linear + label.bonus() * weights.cluster_bonus * 100.0).clamp(0.0, 100.0);

    let expected_return =
        (score - 50.0) / 10.0 - 0.05 * features.price_volatility + 0.01 * (features.liquidity_depth - 50.0);
    let risk_adjusted_score = (score - 0.5 * features.price_volatility - 0.1 * (features.gas_price - 50.0).max(0.0)
        + 0.1 * features.liquidity_depth)
        .clamp(0.0, 100.0);

    Prediction {
        score,
        cluster_id,
        cluster_label: label,
        confidence,
        expected_return,
        risk_adjusted_score,
        features: *features,
    }
}

/// Accuracy, precision, recall and F1 of positive calls over `window`.
fn evaluate(window: &[LabeledOutcome], weights: &ModelWeights, clusters: &[MarketCluster]) -> ModelMetrics {
    let (mut tp, mut fp, mut tn, mut fn_) = (0usize, 0usize, 0usize, 0usize);
    for point in window {
        let predicted = predict_with(&point.features, weights, clusters).score >= POSITIVE_THRESHOLD;
        match (predicted, point.outcome) {
            (true, Outcome::Success) => tp += 1,
            (true, Outcome::Failure) => fp += 1,
            (false, Outcome::Failure) => tn += 1,
            (false, Outcome::Success) => fn_ += 1,
        }
    }

    let ratio = |num: usize, den: usize| if den == 0 { 0.0 } else { num as f64 / den as f64 };
    let precision = ratio(tp, tp + fp);
    let recall = ratio(tp, tp + fn_);
    let f1 = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };

    ModelMetrics {
        accuracy: ratio(tp + tn, window.len()),
        precision,
        recall,
        f1,
        samples: window.len(),
        trained_at: Some(Utc::now()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> MlEngine {
        MlEngine::new(MlConfig::default(), 50.0)
    }

    fn labeled(tvl: f64, sentiment: f64, outcome: Outcome) -> LabeledOutcome {
        LabeledOutcome::new(
            FeatureVector {
                tvl_change: tvl,
                market_sentiment: sentiment,
                ..FeatureVector::neutral()
            },
            outcome,
        )
    }

    #[test]
    fn test_neutral_prediction_without_clusters() {
        let p = predict_with(&FeatureVector::neutral(), &ModelWeights::default(), &[]);
        // 50 + (-5 + 7.5 + 7.5 + 5) + 0.10 × 0.10 × 100
        assert!((p.score - 66.0).abs() < 1e-9);
        assert_eq!(p.cluster_label, ClusterLabel::Stable);
        assert!(p.cluster_id.is_none());
        assert!((p.expected_return - 1.6).abs() < 1e-9);
        assert!((p.risk_adjusted_score - 71.0).abs() < 1e-9);
    }

    #[test]
    fn test_score_is_clamped() {
        let hot = FeatureVector {
            price_volatility: 100.0,
            gas_price: 1000.0,
            ..FeatureVector::neutral()
        };
        let p = predict_with(&hot, &ModelWeights::default(), &[]);
        assert_eq!(p.score, 0.0);
        assert_eq!(p.risk_adjusted_score, 0.0);
    }

    #[tokio::test]
    async fn test_training_deferred_below_minimum() {
        let ml = engine();
        let metrics = ml.train(vec![labeled(5.0, 60.0, Outcome::Success); 3]).await;
        assert_eq!(metrics.samples, 0);
        assert_eq!(ml.weights().await, ModelWeights::default());
        assert_eq!(ml.training_len().await, 3);
    }

    #[tokio::test]
    async fn test_training_step_normalizes_and_clusters() {
        let ml = engine();
        let mut points = Vec::new();
        for i in 0..10 {
            points.push(labeled(10.0 + i as f64, 70.0, Outcome::Success));
            points.push(labeled(-10.0 - i as f64, 30.0, Outcome::Failure));
        }

        let before = ml.weights().await;
        let metrics = ml.train(points).await;
        let after = ml.weights().await;

        assert!((after.abs_sum() - 1.0).abs() < 1e-9);
        // Success has the higher TVL change, so its weight grows relative to gas
        assert!(after.tvl_change / after.gas_price.abs() > before.tvl_change / before.gas_price.abs());
        assert_eq!(ml.clusters().len(), 5);
        assert_eq!(metrics.samples, 20);
        assert!(metrics.trained_at.is_some());
        for v in [metrics.accuracy, metrics.precision, metrics.recall, metrics.f1] {
            assert!((0.0..=1.0).contains(&v));
        }
    }

    #[test]
    fn test_evaluate_counts() {
        let window = vec![
            labeled(50.0, 100.0, Outcome::Success),
            labeled(-100.0, 0.0, Outcome::Failure),
            labeled(-100.0, 0.0, Outcome::Success),
        ];
        let m = evaluate(&window, &ModelWeights::default(), &[]);
        assert!((m.accuracy - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(m.precision, 1.0);
        assert_eq!(m.recall, 0.5);
        assert!((m.f1 - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_class_gap_requires_both_classes() {
        let only_success = vec![labeled(5.0, 60.0, Outcome::Success); 4];
        assert_eq!(class_gap(&only_success), [0.0; FEATURE_COUNT]);
    }
}
