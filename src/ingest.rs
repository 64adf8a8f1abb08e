//! Bulk loaders. Every row goes through `WatchService::record_event`, so
//! validation and the window rule apply exactly as for single events.

use crate::events::NewEvent;
use crate::service::WatchService;
use serde::{Deserialize, Serialize};
use std::io::{BufRead, Read};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestSummary {
    pub stored: u64,
    pub rejected: u64,
}

impl IngestSummary {
    fn record(&mut self, service: &WatchService, line: usize, input: Result<NewEvent, String>) {
        match input.and_then(|ev| service.record_event(ev).map_err(|e| e.to_string())) {
            Ok(_) => self.stored += 1,
            Err(e) => {
                self.rejected += 1;
                warn!(line, error = %e, "event rejected");
            }
        }
    }
}

/// One JSON `NewEvent` per line; blank lines are skipped.
pub fn ingest_ndjson(service: &WatchService, reader: impl BufRead) -> std::io::Result<IngestSummary> {
    let mut summary = IngestSummary::default();
    for (n, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let input = serde_json::from_str::<NewEvent>(&line).map_err(|e| e.to_string());
        summary.record(service, n + 1, input);
    }
    info!(stored = summary.stored, rejected = summary.rejected, "ndjson ingest complete");
    Ok(summary)
}

/// CSV with a header row naming `timestamp`, `ip` (or `actor_id`),
/// `event_type` (or `event`) and `status`. Unknown columns reject the row.
pub fn import_csv(service: &WatchService, reader: impl Read) -> Result<IngestSummary, csv::Error> {
    let mut rows = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut summary = IngestSummary::default();
    for (n, row) in rows.deserialize::<NewEvent>().enumerate() {
        let input = match row {
            Ok(ev) => Ok(ev),
            Err(e) if e.is_io_error() => return Err(e),
            Err(e) => Err(e.to_string()),
        };
        // Line 1 is the header.
        summary.record(service, n + 2, input);
    }
    info!(stored = summary.stored, rejected = summary.rejected, "csv import complete");
    Ok(summary)
}
