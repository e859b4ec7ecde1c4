//! ScheduleStore trait definition.

use async_trait::async_trait;
use uuid::Uuid;

use super::Result;
use crate::model::VestingScheduleTemplate;

/// Interface for schedule template persistence.
///
/// Templates are stored together with their milestones; `put` replaces the
/// whole milestone list atomically. Stores do not validate templates; the
/// vesting service does before calling `put`.
///
/// Implementations:
/// - `SqliteScheduleStore`: SQLite storage
/// - `MemoryStore`: In-memory storage
#[async_trait]
pub trait ScheduleStore: Send + Sync {
    /// Insert or replace a template and its milestones.
    async fn put(&self, template: &VestingScheduleTemplate) -> Result<()>;

    /// Retrieve a template with milestones ordered by `sequence_order`.
    async fn get(&self, id: Uuid) -> Result<Option<VestingScheduleTemplate>>;
}
