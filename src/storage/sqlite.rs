//! SQLite-backed event store. One connection behind a mutex, so writes are
//! visible to the following window query.

use super::EventStore;
use crate::error::StoreError;
use crate::events::{Event, ValidEvent};
use rusqlite::{params, Connection, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::info;

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS events (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        timestamp TEXT NOT NULL,
        actor_id TEXT NOT NULL,
        event_type TEXT NOT NULL,
        status TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_events_actor_type_ts ON events(actor_id, event_type, timestamp);
    CREATE INDEX IF NOT EXISTS idx_events_ts ON events(timestamp);
"#;

fn row_to_event(row: &Row<'_>) -> rusqlite::Result<Event> {
    Ok(Event {
        id: row.get(0)?,
        timestamp: row.get(1)?,
        actor_id: row.get(2)?,
        event_type: row.get(3)?,
        status: row.get(4)?,
    })
}

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create DB at path.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Self::init(Connection::open(path)?)
    }

    pub fn in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }

    /// Copy every event from another authwatch database. Ids are reassigned;
    /// timestamps and fields are kept. Returns rows copied.
    pub fn merge_from(&self, other: &Path) -> Result<u64, StoreError> {
        let rows: Vec<(String, String, String, String)> = {
            let src = Connection::open_with_flags(other, rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY)?;
            let mut stmt =
                src.prepare("SELECT timestamp, actor_id, event_type, status FROM events ORDER BY id")?;
            let rows = stmt
                .query_map([], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)))?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        };

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        {
            let mut insert = tx.prepare(
                "INSERT INTO events (timestamp, actor_id, event_type, status) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for (ts, actor, kind, status) in &rows {
                insert.execute(params![ts, actor, kind, status])?;
            }
        }
        tx.commit()?;
        info!(source = %other.display(), copied = rows.len(), "merged events");
        Ok(rows.len() as u64)
    }
}

impl EventStore for SqliteStore {
    fn insert(&self, event: &ValidEvent) -> Result<Event, StoreError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO events (timestamp, actor_id, event_type, status) VALUES (?1, ?2, ?3, ?4)",
            params![event.timestamp(), event.actor_id(), event.event_type(), event.status()],
        )?;
        Ok(Event {
            id: conn.last_insert_rowid(),
            timestamp: event.timestamp().to_string(),
            actor_id: event.actor_id().to_string(),
            event_type: event.event_type().to_string(),
            status: event.status().to_string(),
        })
    }

    fn count_events(
        &self,
        actor_id: &str,
        event_type: &str,
        since: &str,
        until: &str,
    ) -> Result<u64, StoreError> {
        let conn = self.conn()?;
        let n: i64 = conn.query_row(
            "SELECT COUNT(*) FROM events \
             WHERE actor_id = ?1 AND event_type = ?2 AND timestamp >= ?3 AND timestamp <= ?4",
            params![actor_id, event_type, since, until],
            |r| r.get(0),
        )?;
        Ok(n as u64)
    }

    fn all_events(&self) -> Result<Vec<Event>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, timestamp, actor_id, event_type, status FROM events ORDER BY timestamp, id",
        )?;
        let events = stmt.query_map([], row_to_event)?.collect::<Result<Vec<_>, _>>()?;
        Ok(events)
    }

    fn len(&self) -> Result<u64, StoreError> {
        let n: i64 = self
            .conn()?
            .query_row("SELECT COUNT(*) FROM events", [], |r| r.get(0))?;
        Ok(n as u64)
    }
}
