//! VestingEventStore trait definition.

use async_trait::async_trait;
use uuid::Uuid;

use super::Result;
use crate::model::{VestingEvent, VestingStatus};

/// Interface for vesting event persistence.
///
/// Every mutation recomputes the owning grant's `vested_shares` cache from
/// the settled events in the same transaction, so the cache is never
/// observed out of step with the events.
///
/// Implementations:
/// - `SqliteVestingEventStore`: SQLite storage
/// - `MemoryStore`: In-memory storage
#[async_trait]
pub trait VestingEventStore: Send + Sync {
    /// All events of a grant, ordered by sequence number.
    async fn list(&self, grant_id: Uuid) -> Result<Vec<VestingEvent>>;

    /// Retrieve a single event.
    async fn get(&self, event_id: Uuid) -> Result<Option<VestingEvent>>;

    /// Atomically delete every event of the grant and insert `events`.
    ///
    /// Fails with `StorageError::SettledEventsExist` and changes nothing if
    /// any existing event is vested, transferred or exercised. Every event
    /// must belong to `grant_id`. An empty `events` clears the grant.
    async fn replace(&self, grant_id: Uuid, events: Vec<VestingEvent>) -> Result<()>;

    /// Compare-and-set the status of one event.
    ///
    /// Fails with `StorageError::StatusConflict` if the stored status is not
    /// `expected`. Returns the updated event.
    async fn update_status(
        &self,
        event_id: Uuid,
        expected: VestingStatus,
        status: VestingStatus,
    ) -> Result<VestingEvent>;
}
