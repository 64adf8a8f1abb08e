//! authwatch — access-log watcher.
//!
//! Modular structure:
//! - [`events`] — Stored events and validated ingest input
//! - [`storage`] — Event store trait and SQLite implementation
//! - [`rules`] — Sliding-window brute-force rule
//! - [`features`] — Per-actor behavioral feature extraction
//! - [`model`] — Seeded isolation forest anomaly scoring
//! - [`alert`] — Alert delivery (Telegram, log)
//! - [`service`] — Ingest and query surface over all of the above
//! - [`ingest`] — NDJSON and CSV bulk loaders
//! - [`logging`] — Structured JSON logging

pub mod config;
pub mod error;
pub mod events;
pub mod storage;
pub mod rules;
pub mod features;
pub mod model;
pub mod alert;
pub mod service;
pub mod ingest;
pub mod logging;

pub use config::WatchConfig;
pub use error::{AlertError, ConfigError, RuleError, StoreError, ValidationError, WatchError};
pub use events::{Event, NewEvent};
pub use features::{ActorFeatureVector, FeatureExtractor};
pub use model::{ActorAnomaly, AnomalyLabel, AnomalyScorer};
pub use storage::{EventStore, SqliteStore};
pub use rules::{BruteForceAlert, WindowRule};
pub use alert::AlertSink;
pub use service::{Dashboard, WatchService};
pub use ingest::IngestSummary;
pub use logging::StructuredLogger;
