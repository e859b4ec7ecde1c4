//! SQLite implementations of storage interfaces.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

use super::{Result, Storage, StorageError};

mod grant_store;
mod schedule_store;
mod vesting_event_store;

pub use grant_store::SqliteGrantStore;
pub use schedule_store::SqliteScheduleStore;
pub use vesting_event_store::SqliteVestingEventStore;

/// Open a pool on the database file at `path`, creating it if missing.
pub async fn connect(path: &str) -> Result<SqlitePool> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let opts = SqliteConnectOptions::new()
        .filename(path)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(30))
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(opts)
        .await?;

    Ok(pool)
}

/// Create all tables and bundle the three stores on one pool.
pub async fn init(pool: SqlitePool) -> Result<Storage> {
    let grants = SqliteGrantStore::new(pool.clone());
    grants.init().await?;

    let schedules = SqliteScheduleStore::new(pool.clone());
    schedules.init().await?;

    let events = SqliteVestingEventStore::new(pool);
    events.init().await?;

    Ok(Storage {
        grants: Arc::new(grants),
        schedules: Arc::new(schedules),
        events: Arc::new(events),
    })
}

/// Start a write transaction.
///
/// BEGIN IMMEDIATE acquires the write lock upfront, preventing deadlocks
/// when concurrent DEFERRED transactions race to upgrade from shared to exclusive.
async fn begin_immediate(conn: &mut SqliteConnection) -> Result<()> {
    sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;
    Ok(())
}

/// Commit on success, roll back on failure.
async fn finish_tx<T>(conn: &mut SqliteConnection, result: Result<T>) -> Result<T> {
    match result {
        Ok(value) => {
            sqlx::query("COMMIT").execute(&mut *conn).await?;
            Ok(value)
        }
        Err(e) => {
            let _ = sqlx::query("ROLLBACK").execute(&mut *conn).await;
            Err(e)
        }
    }
}

fn parse_uuid(value: &str) -> Result<Uuid> {
    Ok(Uuid::parse_str(value)?)
}

fn parse_optional_uuid(value: Option<String>) -> Result<Option<Uuid>> {
    value.as_deref().map(parse_uuid).transpose()
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    Ok(value.parse::<NaiveDate>()?)
}

fn parse_optional_date(value: Option<String>) -> Result<Option<NaiveDate>> {
    value.as_deref().map(parse_date).transpose()
}

/// Share counts are `u64` in the model and `INTEGER` (i64) in SQLite.
fn shares_to_db(shares: u64) -> Result<i64> {
    i64::try_from(shares).map_err(|_| StorageError::SharesOutOfRange(i128::from(shares)))
}

fn shares_from_db(value: i64) -> Result<u64> {
    u64::try_from(value).map_err(|_| StorageError::SharesOutOfRange(i128::from(value)))
}
