//! Ingest payload. Unknown fields are rejected; blank required fields fail validation.

use super::{format_timestamp, parse_timestamp};
use crate::error::ValidationError;
use chrono::Local;
use serde::{Deserialize, Serialize};

/// Event as submitted by a caller. `ip` and `event` are accepted for
/// `actor_id` and `event_type` so legacy collectors keep working.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, alias = "ip")]
    pub actor_id: Option<String>,
    #[serde(default, alias = "event")]
    pub event_type: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Event that passed validation; timestamp is in the stored layout.
/// Only `NewEvent::validate` builds one:
///
/// ```compile_fail
/// let _ = authwatch::events::ValidEvent {
///     timestamp: "not a time".into(),
///     actor_id: String::new(),
///     event_type: String::new(),
///     status: String::new(),
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidEvent {
    timestamp: String,
    actor_id: String,
    event_type: String,
    status: String,
}

impl ValidEvent {
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn actor_id(&self) -> &str {
        &self.actor_id
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn status(&self) -> &str {
        &self.status
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String, ValidationError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(ValidationError::MissingField(field)),
    }
}

impl NewEvent {
    pub fn new(
        actor_id: impl Into<String>,
        event_type: impl Into<String>,
        status: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: None,
            actor_id: Some(actor_id.into()),
            event_type: Some(event_type.into()),
            status: Some(status.into()),
        }
    }

    pub fn at(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    /// Check required fields and normalize the timestamp; a missing timestamp is
    /// stamped with local wall-clock time, so time-of-day bins follow the host clock.
    pub fn validate(self) -> Result<ValidEvent, ValidationError> {
        let actor_id = required(self.actor_id, "actor_id")?;
        let event_type = required(self.event_type, "event_type")?;
        let status = required(self.status, "status")?;
        let timestamp = match self.timestamp {
            Some(raw) => {
                let ts = parse_timestamp(&raw).ok_or(ValidationError::InvalidTimestamp(raw))?;
                format_timestamp(&ts)
            }
            None => format_timestamp(&Local::now().naive_local()),
        };
        Ok(ValidEvent {
            timestamp,
            actor_id,
            event_type,
            status,
        })
    }
}
