//! authwatch entrypoint: record access events, run the brute-force rule inline,
//! and score actors on demand. Output is JSON on stdout; logs go to stderr.

use authwatch::{
    config::WatchConfig,
    events::NewEvent,
    ingest::{import_csv, ingest_ndjson},
    logging::StructuredLogger,
    service::WatchService,
    storage::{EventStore, SqliteStore},
};
use clap::{Parser, Subcommand};
use std::io::{BufReader, Write};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "authwatch", version, about = "Access-log brute-force and anomaly watcher")]
struct Cli {
    /// JSON config file
    #[arg(long, env = "AUTHWATCH_CONFIG_PATH", default_value = "config.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Copy all events from another authwatch database
    Merge { other: PathBuf },
    #[command(flatten)]
    Watch(WatchCommand),
}

/// Commands served through the watch service.
#[derive(Subcommand)]
enum WatchCommand {
    /// Store one event and evaluate the brute-force rule
    Record {
        #[arg(long)]
        actor: String,
        #[arg(long)]
        event_type: String,
        #[arg(long)]
        status: String,
        /// Defaults to now (local time)
        #[arg(long)]
        timestamp: Option<String>,
    },
    /// Store NDJSON events from a file (stdin when omitted)
    Ingest { file: Option<PathBuf> },
    /// Store events from a CSV export (timestamp, ip, event_type, status)
    ImportCsv { file: PathBuf },
    /// Print every stored event as NDJSON
    Logs,
    /// Score every actor and print the result as JSON
    Anomalies,
    /// Print dashboard aggregates as JSON
    Dashboard,
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();
    let (mut config, load_error) = match WatchConfig::try_load(&cli.config) {
        Ok(c) => (c, None),
        Err(e) => (WatchConfig::default(), Some(e)),
    };
    let env_errors = config.apply_env();

    StructuredLogger::init(config.log.json, &config.log.level);
    if let Some(e) = load_error {
        warn!(error = %e, "using default config");
    }
    for e in env_errors {
        warn!(error = %e, "ignoring environment override");
    }
    info!(db = %config.db_path().display(), "authwatch starting");

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Command::Merge { other } => {
            let store = SqliteStore::open(&config.db_path())?;
            let merged = store.merge_from(&other)?;
            let total = store.len()?;
            StructuredLogger::emit_json(&serde_json::json!({ "merged": merged, "total": total }), &mut out)?;
        }
        Command::Watch(command) => {
            let service = WatchService::from_config(&config)?;
            run(&service, command, &mut out)?;
        }
    }
    Ok(())
}

fn run(
    service: &WatchService,
    command: WatchCommand,
    out: &mut impl Write,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    match command {
        WatchCommand::Record {
            actor,
            event_type,
            status,
            timestamp,
        } => {
            let mut input = NewEvent::new(actor, event_type, status);
            input.timestamp = timestamp;
            let event = service.record_event(input)?;
            StructuredLogger::emit_json(&event, out)?;
        }
        WatchCommand::Ingest { file } => {
            let summary = match file {
                Some(path) => ingest_ndjson(service, BufReader::new(std::fs::File::open(path)?))?,
                None => ingest_ndjson(service, std::io::stdin().lock())?,
            };
            StructuredLogger::emit_json(&summary, out)?;
        }
        WatchCommand::ImportCsv { file } => {
            let summary = import_csv(service, std::fs::File::open(file)?)?;
            StructuredLogger::emit_json(&summary, out)?;
        }
        WatchCommand::Logs => {
            for event in service.list_events()? {
                StructuredLogger::emit_json(&event, out)?;
            }
        }
        WatchCommand::Anomalies => StructuredLogger::emit_json(&service.compute_anomalies(), out)?,
        WatchCommand::Dashboard => StructuredLogger::emit_json(&service.dashboard(), out)?,
    }
    Ok(())
}
