//! Market clustering and opportunity prediction.

pub mod features;
pub mod kmeans;
pub mod model;

pub use features::extract_features;
pub use kmeans::{default_clusters, kmeans, ClusteringResult, KMeansParams};
pub use model::{predict_with, MlEngine};
