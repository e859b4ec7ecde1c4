//! GrantStore trait definition.

use async_trait::async_trait;
use uuid::Uuid;

use super::Result;
use crate::model::Grant;

/// Interface for grant persistence.
///
/// A grant's `vested_shares` column is owned by the vesting event store:
/// `put` writes it only when inserting a new grant and leaves it untouched
/// on update, so the cache can never drift from the event rows through
/// this interface.
///
/// Implementations:
/// - `SqliteGrantStore`: SQLite storage
/// - `MemoryStore`: In-memory storage
#[async_trait]
pub trait GrantStore: Send + Sync {
    /// Insert a grant, or update every field but `vested_shares`.
    async fn put(&self, grant: &Grant) -> Result<()>;

    /// Retrieve a grant by id.
    async fn get(&self, id: Uuid) -> Result<Option<Grant>>;
}
