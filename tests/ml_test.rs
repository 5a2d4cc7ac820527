//! Clustering and prediction tests against the public API

use haunt_signals::services::ml::{kmeans, ClusteringResult, KMeansParams, MlEngine};
use haunt_signals::*;

fn spread(count: usize) -> Vec<FeatureVector> {
    (0..count)
        .map(|i| {
            let f = i as f64;
            FeatureVector {
                price_volatility: (f * 1.7) % 25.0,
                tvl_change: (f * 3.1) % 20.0 - 10.0,
                gas_price: 20.0 + (f * 11.0) % 80.0,
                agent_performance: (f * 13.0) % 100.0,
                market_sentiment: (f * 7.0) % 100.0,
                liquidity_depth: (f * 5.0) % 100.0,
                volume_change: (f * 9.0) % 60.0 - 20.0,
                timestamp: i as i64,
            }
        })
        .collect()
}

fn check_partition(result: &ClusteringResult, points: usize, params: &KMeansParams) {
    assert_eq!(result.clusters.len(), params.k);
    let mut members: Vec<usize> = result.clusters.iter().flat_map(|c| c.members.clone()).collect();
    members.sort_unstable();
    assert_eq!(members, (0..points).collect::<Vec<_>>());
    assert!(result.last_shift < params.tolerance || result.iterations == params.max_iterations);
    for cluster in &result.clusters {
        assert!((0.0..=100.0).contains(&cluster.confidence));
        assert_eq!(cluster.label, ClusterLabel::from_centroid(&cluster.centroid));
    }
}

#[test]
fn test_kmeans_partitions_every_point() {
    let points = spread(64);
    for k in [1, 3, 5, 8] {
        let params = KMeansParams { k, ..KMeansParams::default() };
        check_partition(&kmeans(&points, &params), points.len(), &params);
    }
}

#[test]
fn test_kmeans_iteration_cap() {
    let points = spread(64);
    let params = KMeansParams {
        k: 5,
        max_iterations: 1,
        tolerance: 0.0,
        seed: 9,
    };
    let result = kmeans(&points, &params);
    assert_eq!(result.iterations, 1);
    assert!(!result.converged);
    check_partition(&result, points.len(), &params);
}

#[tokio::test]
async fn test_prediction_uses_nearest_cluster() {
    let ml = MlEngine::new(MlConfig::default(), 50.0);
    let points = spread(40);
    let result = ml.cluster(&points);
    assert_eq!(ml.clusters().len(), result.clusters.len());

    let prediction = ml.predict(&points[0]).await;
    let id = prediction.cluster_id.clone().unwrap();
    assert!(ml.clusters().iter().any(|c| c.id == id));
    assert!((0.0..=100.0).contains(&prediction.score));
    assert!((0.0..=100.0).contains(&prediction.risk_adjusted_score));
}

#[tokio::test]
async fn test_weights_stay_normalized_over_many_steps() {
    let ml = MlEngine::new(MlConfig::default(), 50.0);
    let points = spread(60);
    for chunk in points.chunks(6) {
        let batch = chunk
            .iter()
            .map(|f| {
                let outcome = if f.market_sentiment > 50.0 { Outcome::Success } else { Outcome::Failure };
                LabeledOutcome::new(*f, outcome)
            })
            .collect();
        ml.train(batch).await;
    }
    let weights = ml.weights().await;
    assert!((weights.abs_sum() - 1.0).abs() < 1e-9);
    assert_eq!(ml.metrics().await.samples, 60);
}

#[test]
fn test_feature_extraction_clamps() {
    let ctx = MarketContext {
        price: Some(500.0),
        previous_price: Some(100.0),
        volume: Some(10_000.0),
        previous_volume: Some(100.0),
        gas_price: Some(5_000.0),
        ..MarketContext::default()
    };
    let ml = MlEngine::new(MlConfig::default(), 50.0);
    let v = ml.extract_features(&ctx);
    assert_eq!(v.price_volatility, 100.0);
    assert_eq!(v.volume_change, 500.0);
    assert_eq!(v.gas_price, 1000.0);
    assert_eq!(v.liquidity_depth, 50.0);
}
