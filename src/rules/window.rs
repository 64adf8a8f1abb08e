//! Trailing-window brute-force rule, evaluated inline for every stored event.

use crate::config::{RepeatPolicy, WindowConfig};
use crate::error::RuleError;
use crate::events::{format_timestamp, Event};
use crate::storage::EventStore;
use chrono::{Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BruteForceAlert {
    pub actor_id: String,
    /// Matching events inside the window, including the triggering one
    pub count: u64,
    pub window_secs: u64,
    pub timestamp: String,
}

impl BruteForceAlert {
    pub fn message(&self) -> String {
        format!(
            "🚨 Repeated login failures! actor: {} count: {} in last {}s (at {})",
            self.actor_id, self.count, self.window_secs, self.timestamp
        )
    }
}

pub struct WindowRule {
    config: WindowConfig,
    last_alert: Mutex<HashMap<String, NaiveDateTime>>,
}

impl WindowRule {
    pub fn new(config: WindowConfig) -> Self {
        Self {
            config,
            last_alert: Mutex::new(HashMap::new()),
        }
    }

    /// Count the actor's matching events in `[t - window, t]` where `t` is the
    /// event's own timestamp, and alert when the count reaches the threshold.
    pub fn evaluate(
        &self,
        store: &dyn EventStore,
        event: &Event,
    ) -> Result<Option<BruteForceAlert>, RuleError> {
        let now = event
            .parsed_timestamp()
            .unwrap_or_else(|| Utc::now().naive_utc());
        let window_secs = self.config.window_secs;
        let since = i64::try_from(window_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|window| now.checked_sub_signed(window))
            .ok_or(RuleError::WindowOverflow { window_secs })?;
        let count = store.count_events(
            &event.actor_id,
            &self.config.event_type,
            &format_timestamp(&since),
            &format_timestamp(&now),
        )?;
        debug!(actor = %event.actor_id, count, "window rule evaluated");

        if count < self.config.threshold {
            return Ok(None);
        }
        if self.suppressed(&event.actor_id, now) {
            debug!(actor = %event.actor_id, count, "alert suppressed by cooldown");
            return Ok(None);
        }
        Ok(Some(BruteForceAlert {
            actor_id: event.actor_id.clone(),
            count,
            window_secs: self.config.window_secs,
            timestamp: event.timestamp.clone(),
        }))
    }

    /// Records `now` as the actor's last alert unless still inside the cooldown.
    fn suppressed(&self, actor_id: &str, now: NaiveDateTime) -> bool {
        let RepeatPolicy::Suppress { cooldown_secs } = self.config.repeat_policy else {
            return false;
        };
        let Ok(mut last) = self.last_alert.lock() else {
            return false;
        };
        if let Some(prev) = last.get(actor_id) {
            // A cooldown too large for a TimeDelta never expires.
            let inside = match i64::try_from(cooldown_secs).ok().and_then(Duration::try_seconds) {
                Some(cooldown) => now - *prev < cooldown,
                None => true,
            };
            if inside && now >= *prev {
                return true;
            }
        }
        last.insert(actor_id.to_string(), now);
        false
    }

    pub fn config(&self) -> &WindowConfig {
        &self.config
    }
}
