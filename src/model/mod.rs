//! Unsupervised outlier scoring over actor feature vectors.

mod isolation;
mod scorer;

pub use isolation::{average_path_length, IsolationForest, Sample};
pub use scorer::{quantile, ActorAnomaly, AnomalyLabel, AnomalyScorer};
