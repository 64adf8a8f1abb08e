//! Alert delivery. Failures are reported to the caller, which logs them;
//! they never fail ingestion.

mod telegram;

pub use telegram::TelegramSink;

use crate::config::AlertConfig;
use crate::error::AlertError;
use std::sync::Arc;
use tracing::{info, warn};

pub trait AlertSink: Send + Sync {
    fn send_alert(&self, message: &str) -> Result<(), AlertError>;
}

/// Writes alerts to the log. Used when no delivery credentials are configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl AlertSink for LogSink {
    fn send_alert(&self, message: &str) -> Result<(), AlertError> {
        warn!(alert = %message, "alert");
        Ok(())
    }
}

/// Telegram when credentials are present, otherwise the log.
pub fn sink_from_config(config: &AlertConfig) -> Arc<dyn AlertSink> {
    match TelegramSink::new(config) {
        Ok(sink) => {
            info!("alerts delivered via telegram");
            Arc::new(sink)
        }
        Err(AlertError::NotConfigured(field)) => {
            info!(missing = field, "telegram not configured; alerts go to the log");
            Arc::new(LogSink)
        }
        Err(e) => {
            warn!(error = %e, "telegram client setup failed; alerts go to the log");
            Arc::new(LogSink)
        }
    }
}
