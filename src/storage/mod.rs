//! Storage interfaces and implementations.
//!
//! The vesting core never talks to a database directly; it goes through
//! these traits:
//! - [`GrantStore`]: grant records
//! - [`ScheduleStore`]: templates with their milestones
//! - [`VestingEventStore`]: generated events, status changes and the
//!   derived `vested_shares` cache

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::config::{StorageConfig, StorageType};
use crate::model::{UnknownVariant, VestingStatus};

mod grant_store;
pub mod memory;
mod schedule_store;
mod vesting_event_store;

#[cfg(feature = "sqlite")]
pub mod schema;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use grant_store::GrantStore;
pub use memory::MemoryStore;
pub use schedule_store::ScheduleStore;
pub use vesting_event_store::VestingEventStore;

#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteGrantStore, SqliteScheduleStore, SqliteVestingEventStore};

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Grant not found: {0}")]
    GrantNotFound(Uuid),

    #[error("Vesting event not found: {0}")]
    EventNotFound(Uuid),

    #[error("Status conflict on vesting event {event_id}: expected {expected}, found {actual}")]
    StatusConflict {
        event_id: Uuid,
        expected: VestingStatus,
        actual: VestingStatus,
    },

    #[error("Grant {grant_id} has {count} settled vesting events")]
    SettledEventsExist { grant_id: Uuid, count: usize },

    #[error("Vesting event {event_id} does not belong to grant {grant_id}")]
    GrantMismatch { grant_id: Uuid, event_id: Uuid },

    #[error("Invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),

    #[error("Invalid date: {0}")]
    InvalidDate(#[from] chrono::ParseError),

    #[error("Invalid stored value: {0}")]
    InvalidValue(#[from] UnknownVariant),

    #[error("Share count {0} does not fit in a database integer")]
    SharesOutOfRange(i128),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "sqlite")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// The three stores of one backend, sharing its connection.
#[derive(Clone)]
pub struct Storage {
    pub grants: Arc<dyn GrantStore>,
    pub schedules: Arc<dyn ScheduleStore>,
    pub events: Arc<dyn VestingEventStore>,
}

impl Storage {
    /// Stores backed by one in-memory state.
    pub fn in_memory() -> Self {
        Self::from_memory(Arc::new(MemoryStore::new()))
    }

    /// Stores backed by `store`, which the caller keeps for inspection.
    pub fn from_memory(store: Arc<MemoryStore>) -> Self {
        Self {
            grants: store.clone(),
            schedules: store.clone(),
            events: store,
        }
    }
}

/// Initialize storage based on configuration.
pub async fn init_storage(config: &StorageConfig) -> std::result::Result<Storage, Box<dyn std::error::Error>> {
    info!(storage_type = %config.storage_type, "Initializing storage");

    match config.storage_type {
        StorageType::Memory => Ok(Storage::in_memory()),
        #[cfg(feature = "sqlite")]
        StorageType::Sqlite => {
            info!(path = %config.sqlite.path, "Opening SQLite database");
            let pool = sqlite::connect(&config.sqlite.path).await?;
            Ok(sqlite::init(pool).await?)
        }
        #[cfg(not(feature = "sqlite"))]
        StorageType::Sqlite => {
            tracing::error!("SQLite storage requested but 'sqlite' feature is not enabled");
            Err("SQLite feature not enabled".into())
        }
    }
}
