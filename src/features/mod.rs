//! Per-actor behavioral feature extraction from raw events.

mod behavioral;
mod pipeline;

pub use behavioral::{time_bin, time_bin_of, ActorStats};
pub use pipeline::FeatureExtractor;

use serde::{Deserialize, Serialize};

/// Number of numeric features fed to the scorer.
pub const FEATURE_DIM: usize = 6;

/// Guards `fail_ratio` against division by zero. Not clamped.
pub const RATIO_EPSILON: f64 = 1e-6;

/// Behavioral summary of one actor over the events it was built from.
/// Recomputed on every scoring run; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorFeatureVector {
    pub actor_id: String,
    pub total_events: u64,
    pub fail_count: u64,
    pub success_count: u64,
    pub admin_access_count: u64,
    /// Mean time-of-day bucket (0..=3)
    pub avg_time_bin: f64,
    pub fail_ratio: f64,
}

impl ActorFeatureVector {
    /// Model input order: total, fail, success, admin, fail_ratio, avg_time_bin.
    pub fn as_array(&self) -> [f64; FEATURE_DIM] {
        [
            self.total_events as f64,
            self.fail_count as f64,
            self.success_count as f64,
            self.admin_access_count as f64,
            self.fail_ratio,
            self.avg_time_bin,
        ]
    }
}
