//! Full-batch anomaly labelling: fit on the current actors, label the same actors.

use super::isolation::{IsolationForest, Sample};
use crate::config::ScorerConfig;
use crate::features::ActorFeatureVector;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// `-1` = anomalous, `1` = normal on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "i8", try_from = "i8")]
pub enum AnomalyLabel {
    Normal,
    Anomalous,
}

impl From<AnomalyLabel> for i8 {
    fn from(label: AnomalyLabel) -> i8 {
        match label {
            AnomalyLabel::Normal => 1,
            AnomalyLabel::Anomalous => -1,
        }
    }
}

impl TryFrom<i8> for AnomalyLabel {
    type Error = String;

    fn try_from(v: i8) -> Result<Self, Self::Error> {
        match v {
            1 => Ok(AnomalyLabel::Normal),
            -1 => Ok(AnomalyLabel::Anomalous),
            other => Err(format!("anomaly label must be 1 or -1, got {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorAnomaly {
    #[serde(flatten)]
    pub features: ActorFeatureVector,
    /// Isolation score; higher is more anomalous
    pub anomaly_score: f64,
    pub anomaly_label: AnomalyLabel,
}

impl ActorAnomaly {
    pub fn is_anomalous(&self) -> bool {
        self.anomaly_label == AnomalyLabel::Anomalous
    }
}

/// Linear-interpolated quantile of an unsorted slice, `q` in [0, 1].
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64))
}

/// Stateless scorer: every call refits from scratch with the configured seed.
///
/// Contamination is a fixed prior, not learned; with one or two actors the
/// labels are degenerate (all normal) and no heuristic corrects that.
#[derive(Debug, Clone)]
pub struct AnomalyScorer {
    config: ScorerConfig,
}

impl AnomalyScorer {
    pub fn new(config: ScorerConfig) -> Self {
        Self { config }
    }

    pub fn score(&self, vectors: Vec<ActorFeatureVector>) -> Vec<ActorAnomaly> {
        if vectors.is_empty() {
            debug!("no actors to score");
            return Vec::new();
        }
        let samples: Vec<Sample> = vectors.iter().map(ActorFeatureVector::as_array).collect();
        let Some(forest) = IsolationForest::fit(
            &samples,
            self.config.n_trees,
            self.config.max_samples,
            self.config.seed,
        ) else {
            return Vec::new();
        };
        let scores = forest.score_samples(&samples);
        let threshold = quantile(&scores, 1.0 - self.config.contamination).unwrap_or(f64::INFINITY);

        let out: Vec<ActorAnomaly> = vectors
            .into_iter()
            .zip(scores)
            .map(|(features, score)| ActorAnomaly {
                features,
                anomaly_score: score,
                anomaly_label: if score > threshold {
                    AnomalyLabel::Anomalous
                } else {
                    AnomalyLabel::Normal
                },
            })
            .collect();

        info!(
            actors = out.len(),
            anomalous = out.iter().filter(|a| a.is_anomalous()).count(),
            threshold,
            "anomaly scoring complete"
        );
        out
    }

    pub fn config(&self) -> &ScorerConfig {
        &self.config
    }
}
