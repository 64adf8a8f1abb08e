//! Feature extraction pipeline: events → per-actor stats → feature vectors.

use super::{ActorFeatureVector, ActorStats};
use crate::events::Event;
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureExtractor;

impl FeatureExtractor {
    pub fn new() -> Self {
        Self
    }

    /// One vector per distinct actor, ordered by actor id. Single pass over `events`.
    pub fn extract(&self, events: &[Event]) -> Vec<ActorFeatureVector> {
        let mut groups: BTreeMap<&str, ActorStats> = BTreeMap::new();
        for e in events {
            groups.entry(e.actor_id.as_str()).or_default().push(e);
        }
        debug!(events = events.len(), actors = groups.len(), "extracted actor features");
        groups
            .into_iter()
            .map(|(actor, stats)| stats.into_vector(actor.to_string()))
            .collect()
    }
}
