//! SQLite VestingEventStore implementation.

use async_trait::async_trait;
use sea_query::{Expr, Order, Query, SelectStatement, SqliteQueryBuilder};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use uuid::Uuid;

use super::{
    begin_immediate, finish_tx, parse_date, parse_optional_uuid, parse_uuid, shares_from_db,
    shares_to_db,
};
use crate::model::{VestingEvent, VestingStatus};
use crate::storage::schema::{Grants, VestingEvents, CREATE_VESTING_EVENTS_TABLE};
use crate::storage::{Result, StorageError, VestingEventStore};

/// SQLite implementation of VestingEventStore.
pub struct SqliteVestingEventStore {
    pool: SqlitePool,
}

fn settled_statuses() -> impl Iterator<Item = &'static str> {
    VestingStatus::ALL
        .into_iter()
        .filter(|s| s.is_settled())
        .map(|s| s.as_str())
}

fn select_events() -> SelectStatement {
    Query::select()
        .columns([
            VestingEvents::Id,
            VestingEvents::GrantId,
            VestingEvents::ScheduleId,
            VestingEvents::MilestoneId,
            VestingEvents::SequenceNumber,
            VestingEvents::VestingDate,
            VestingEvents::Percentage,
            VestingEvents::Shares,
            VestingEvents::Status,
        ])
        .from(VestingEvents::Table)
        .to_owned()
}

fn event_from_row(row: &SqliteRow) -> Result<VestingEvent> {
    let id: String = row.get("id");
    let grant_id: String = row.get("grant_id");
    let sequence_number: i64 = row.get("sequence_number");
    let vesting_date: String = row.get("vesting_date");
    let shares: i64 = row.get("shares");
    let status: String = row.get("status");

    Ok(VestingEvent {
        id: parse_uuid(&id)?,
        grant_id: parse_uuid(&grant_id)?,
        schedule_id: parse_optional_uuid(row.get("schedule_id"))?,
        milestone_id: parse_optional_uuid(row.get("milestone_id"))?,
        sequence_number: sequence_number as u32,
        vesting_date: parse_date(&vesting_date)?,
        percentage: row.get("percentage"),
        shares: shares_from_db(shares)?,
        status: status.parse::<VestingStatus>()?,
    })
}

impl SqliteVestingEventStore {
    /// Create a new SQLite vesting event store.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the vesting events table if it does not exist.
    pub async fn init(&self) -> Result<()> {
        sqlx::raw_sql(CREATE_VESTING_EVENTS_TABLE)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn fetch_event(conn: &mut SqliteConnection, event_id: Uuid) -> Result<Option<VestingEvent>> {
        let query = select_events()
            .and_where(Expr::col(VestingEvents::Id).eq(event_id.to_string()))
            .to_string(SqliteQueryBuilder);

        let row = sqlx::query(&query).fetch_optional(&mut *conn).await?;
        row.as_ref().map(event_from_row).transpose()
    }

    /// Recompute the grant's vested_shares from its settled events.
    async fn refresh_vested_shares(conn: &mut SqliteConnection, grant_id: &str) -> Result<()> {
        let query = Query::select()
            .expr(Expr::col(VestingEvents::Shares).sum())
            .from(VestingEvents::Table)
            .and_where(Expr::col(VestingEvents::GrantId).eq(grant_id))
            .and_where(Expr::col(VestingEvents::Status).is_in(settled_statuses()))
            .to_string(SqliteQueryBuilder);

        let row = sqlx::query(&query).fetch_one(&mut *conn).await?;
        let vested: Option<i64> = row.get(0);

        let query = Query::update()
            .table(Grants::Table)
            .values([
                (Grants::VestedShares, vested.unwrap_or(0).into()),
                (Grants::UpdatedAt, chrono::Utc::now().to_rfc3339().into()),
            ])
            .and_where(Expr::col(Grants::Id).eq(grant_id))
            .to_string(SqliteQueryBuilder);

        sqlx::query(&query).execute(&mut *conn).await?;
        Ok(())
    }

    async fn replace_events(
        conn: &mut SqliteConnection,
        grant_id: Uuid,
        events: Vec<VestingEvent>,
    ) -> Result<()> {
        let grant_str = grant_id.to_string();

        let query = Query::select()
            .expr(Expr::col(VestingEvents::Id).count())
            .from(VestingEvents::Table)
            .and_where(Expr::col(VestingEvents::GrantId).eq(grant_str.as_str()))
            .and_where(Expr::col(VestingEvents::Status).is_in(settled_statuses()))
            .to_string(SqliteQueryBuilder);

        let row = sqlx::query(&query).fetch_one(&mut *conn).await?;
        let settled: i64 = row.get(0);
        if settled > 0 {
            return Err(StorageError::SettledEventsExist {
                grant_id,
                count: settled as usize,
            });
        }

        let query = Query::delete()
            .from_table(VestingEvents::Table)
            .and_where(Expr::col(VestingEvents::GrantId).eq(grant_str.as_str()))
            .to_string(SqliteQueryBuilder);
        sqlx::query(&query).execute(&mut *conn).await?;

        for event in events {
            let query = Query::insert()
                .into_table(VestingEvents::Table)
                .columns([
                    VestingEvents::Id,
                    VestingEvents::GrantId,
                    VestingEvents::ScheduleId,
                    VestingEvents::MilestoneId,
                    VestingEvents::SequenceNumber,
                    VestingEvents::VestingDate,
                    VestingEvents::Percentage,
                    VestingEvents::Shares,
                    VestingEvents::Status,
                ])
                .values_panic([
                    event.id.to_string().into(),
                    grant_str.clone().into(),
                    event.schedule_id.map(|id| id.to_string()).into(),
                    event.milestone_id.map(|id| id.to_string()).into(),
                    event.sequence_number.into(),
                    event.vesting_date.to_string().into(),
                    event.percentage.into(),
                    shares_to_db(event.shares)?.into(),
                    event.status.as_str().into(),
                ])
                .to_string(SqliteQueryBuilder);
            sqlx::query(&query).execute(&mut *conn).await?;
        }

        Self::refresh_vested_shares(conn, &grant_str).await
    }

    async fn compare_and_set(
        conn: &mut SqliteConnection,
        event_id: Uuid,
        expected: VestingStatus,
        status: VestingStatus,
    ) -> Result<VestingEvent> {
        let query = Query::update()
            .table(VestingEvents::Table)
            .values([(VestingEvents::Status, status.as_str().into())])
            .and_where(Expr::col(VestingEvents::Id).eq(event_id.to_string()))
            .and_where(Expr::col(VestingEvents::Status).eq(expected.as_str()))
            .to_string(SqliteQueryBuilder);

        let affected = sqlx::query(&query).execute(&mut *conn).await?.rows_affected();

        let event = Self::fetch_event(conn, event_id)
            .await?
            .ok_or(StorageError::EventNotFound(event_id))?;

        if affected == 0 {
            return Err(StorageError::StatusConflict {
                event_id,
                expected,
                actual: event.status,
            });
        }

        Self::refresh_vested_shares(conn, &event.grant_id.to_string()).await?;
        Ok(event)
    }
}

#[async_trait]
impl VestingEventStore for SqliteVestingEventStore {
    async fn list(&self, grant_id: Uuid) -> Result<Vec<VestingEvent>> {
        let query = select_events()
            .and_where(Expr::col(VestingEvents::GrantId).eq(grant_id.to_string()))
            .order_by(VestingEvents::SequenceNumber, Order::Asc)
            .to_string(SqliteQueryBuilder);

        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;
        rows.iter().map(event_from_row).collect()
    }

    async fn get(&self, event_id: Uuid) -> Result<Option<VestingEvent>> {
        let mut conn = self.pool.acquire().await?;
        Self::fetch_event(&mut conn, event_id).await
    }

    async fn replace(&self, grant_id: Uuid, events: Vec<VestingEvent>) -> Result<()> {
        if let Some(foreign) = events.iter().find(|e| e.grant_id != grant_id) {
            return Err(StorageError::GrantMismatch {
                grant_id,
                event_id: foreign.id,
            });
        }

        let mut conn = self.pool.acquire().await?;
        begin_immediate(&mut conn).await?;

        let result = Self::replace_events(&mut conn, grant_id, events).await;
        finish_tx(&mut conn, result).await
    }

    async fn update_status(
        &self,
        event_id: Uuid,
        expected: VestingStatus,
        status: VestingStatus,
    ) -> Result<VestingEvent> {
        let mut conn = self.pool.acquire().await?;
        begin_immediate(&mut conn).await?;

        let result = Self::compare_and_set(&mut conn, event_id, expected, status).await;
        finish_tx(&mut conn, result).await
    }
}
