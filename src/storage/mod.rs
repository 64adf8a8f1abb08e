//! Append-only event storage.

mod sqlite;

pub use sqlite::SqliteStore;

use crate::error::StoreError;
use crate::events::{Event, ValidEvent};

/// Event store seam. Implementations must give read-your-writes:
/// an inserted event is visible to the next `count_events`.
pub trait EventStore: Send + Sync {
    fn insert(&self, event: &ValidEvent) -> Result<Event, StoreError>;

    /// Events for `actor_id` of `event_type` with `since <= timestamp <= until` (stored layout).
    fn count_events(
        &self,
        actor_id: &str,
        event_type: &str,
        since: &str,
        until: &str,
    ) -> Result<u64, StoreError>;

    /// Every event ordered by timestamp, ties by insertion order.
    fn all_events(&self) -> Result<Vec<Event>, StoreError>;

    fn len(&self) -> Result<u64, StoreError>;

    fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}
