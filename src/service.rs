//! Service context: the store, alert sink, window rule and scorer, passed explicitly.

use crate::alert::{sink_from_config, AlertSink};
use crate::config::WatchConfig;
use crate::error::{StoreError, WatchError};
use crate::events::{Event, NewEvent};
use crate::features::FeatureExtractor;
use crate::model::{ActorAnomaly, AnomalyScorer};
use crate::rules::WindowRule;
use crate::storage::{EventStore, SqliteStore};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Rendering input for a dashboard view.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dashboard {
    /// Events per hour, keyed `YYYY-MM-DD HH`
    pub hourly: BTreeMap<String, u64>,
    pub event_types: BTreeMap<String, u64>,
    pub actors: BTreeMap<String, u64>,
    pub anomalies: Vec<ActorAnomaly>,
}

pub struct WatchService {
    store: Arc<dyn EventStore>,
    sink: Arc<dyn AlertSink>,
    rule: WindowRule,
    extractor: FeatureExtractor,
    scorer: AnomalyScorer,
}

impl WatchService {
    pub fn new(
        store: Arc<dyn EventStore>,
        sink: Arc<dyn AlertSink>,
        rule: WindowRule,
        scorer: AnomalyScorer,
    ) -> Self {
        Self {
            store,
            sink,
            rule,
            extractor: FeatureExtractor::new(),
            scorer,
        }
    }

    /// Open the configured SQLite database and alert sink.
    pub fn from_config(config: &WatchConfig) -> Result<Self, WatchError> {
        config.validate()?;
        let store = SqliteStore::open(&config.db_path())?;
        Ok(Self::new(
            Arc::new(store),
            sink_from_config(&config.alert),
            WindowRule::new(config.window.clone()),
            AnomalyScorer::new(config.scorer.clone()),
        ))
    }

    /// Validate and store, then run the window rule inline. Only validation
    /// and the store write can fail the call.
    pub fn record_event(&self, input: NewEvent) -> Result<Event, WatchError> {
        let valid = input.validate()?;
        let event = self.store.insert(&valid)?;
        info!(
            id = event.id,
            actor = %event.actor_id,
            event_type = %event.event_type,
            status = %event.status,
            "event stored"
        );

        match self.rule.evaluate(self.store.as_ref(), &event) {
            Ok(Some(alert)) => {
                warn!(actor = %alert.actor_id, count = alert.count, "brute-force threshold reached");
                if let Err(e) = self.sink.send_alert(&alert.message()) {
                    warn!(actor = %alert.actor_id, error = %e, "alert delivery failed");
                }
            }
            Ok(None) => {}
            Err(e) => warn!(actor = %event.actor_id, error = %e, "window rule evaluation failed"),
        }
        Ok(event)
    }

    pub fn list_events(&self) -> Result<Vec<Event>, StoreError> {
        self.store.all_events()
    }

    /// Refit over the full history. Store failures yield an empty result.
    pub fn compute_anomalies(&self) -> Vec<ActorAnomaly> {
        match self.store.all_events() {
            Ok(events) => self.anomalies_for(&events),
            Err(e) => {
                warn!(error = %e, "event load failed; no anomalies computed");
                Vec::new()
            }
        }
    }

    /// Score a caller-supplied subset instead of the full history.
    pub fn anomalies_for(&self, events: &[Event]) -> Vec<ActorAnomaly> {
        self.scorer.score(self.extractor.extract(events))
    }

    pub fn dashboard(&self) -> Dashboard {
        let events = match self.store.all_events() {
            Ok(events) => events,
            Err(e) => {
                warn!(error = %e, "event load failed; empty dashboard");
                return Dashboard::default();
            }
        };
        let mut board = Dashboard::default();
        for e in &events {
            let hour: String = e.timestamp.chars().take(13).collect();
            *board.hourly.entry(hour).or_default() += 1;
            *board.event_types.entry(e.event_type.clone()).or_default() += 1;
            *board.actors.entry(e.actor_id.clone()).or_default() += 1;
        }
        board.anomalies = self.anomalies_for(&events);
        board
    }

    pub fn store(&self) -> &Arc<dyn EventStore> {
        &self.store
    }
}
