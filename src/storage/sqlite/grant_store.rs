//! SQLite GrantStore implementation.

use async_trait::async_trait;
use sea_query::{Expr, OnConflict, Query, SqliteQueryBuilder};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::{
    parse_date, parse_optional_date, parse_optional_uuid, parse_uuid, shares_from_db, shares_to_db,
};
use crate::model::{Grant, GrantStatus};
use crate::storage::schema::{Grants, CREATE_GRANTS_TABLE};
use crate::storage::{GrantStore, Result};

/// SQLite implementation of GrantStore.
pub struct SqliteGrantStore {
    pool: SqlitePool,
}

impl SqliteGrantStore {
    /// Create a new SQLite grant store.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the grants table if it does not exist.
    pub async fn init(&self) -> Result<()> {
        sqlx::raw_sql(CREATE_GRANTS_TABLE).execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl GrantStore for SqliteGrantStore {
    async fn put(&self, grant: &Grant) -> Result<()> {
        let updated_at = chrono::Utc::now().to_rfc3339();

        let query = Query::insert()
            .into_table(Grants::Table)
            .columns([
                Grants::Id,
                Grants::CompanyId,
                Grants::EmployeeId,
                Grants::ScheduleId,
                Grants::TotalShares,
                Grants::VestingStartDate,
                Grants::VestingEndDate,
                Grants::Status,
                Grants::VestedShares,
                Grants::UpdatedAt,
            ])
            .values_panic([
                grant.id.to_string().into(),
                grant.company_id.to_string().into(),
                grant.employee_id.to_string().into(),
                grant.schedule_id.map(|id| id.to_string()).into(),
                shares_to_db(grant.total_shares)?.into(),
                grant.vesting_start_date.to_string().into(),
                grant.vesting_end_date.map(|d| d.to_string()).into(),
                grant.status.as_str().into(),
                shares_to_db(grant.vested_shares)?.into(),
                updated_at.into(),
            ])
            .on_conflict(
                OnConflict::column(Grants::Id)
                    .update_columns([
                        Grants::CompanyId,
                        Grants::EmployeeId,
                        Grants::ScheduleId,
                        Grants::TotalShares,
                        Grants::VestingStartDate,
                        Grants::VestingEndDate,
                        Grants::Status,
                        Grants::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .to_string(SqliteQueryBuilder);

        sqlx::query(&query).execute(&self.pool).await?;

        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Grant>> {
        let query = Query::select()
            .columns([
                Grants::Id,
                Grants::CompanyId,
                Grants::EmployeeId,
                Grants::ScheduleId,
                Grants::TotalShares,
                Grants::VestingStartDate,
                Grants::VestingEndDate,
                Grants::Status,
                Grants::VestedShares,
            ])
            .from(Grants::Table)
            .and_where(Expr::col(Grants::Id).eq(id.to_string()))
            .to_string(SqliteQueryBuilder);

        let row = sqlx::query(&query).fetch_optional(&self.pool).await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let id: String = row.get("id");
        let company_id: String = row.get("company_id");
        let employee_id: String = row.get("employee_id");
        let start: String = row.get("vesting_start_date");
        let status: String = row.get("status");
        let total_shares: i64 = row.get("total_shares");
        let vested_shares: i64 = row.get("vested_shares");

        Ok(Some(Grant {
            id: parse_uuid(&id)?,
            company_id: parse_uuid(&company_id)?,
            employee_id: parse_uuid(&employee_id)?,
            schedule_id: parse_optional_uuid(row.get("schedule_id"))?,
            total_shares: shares_from_db(total_shares)?,
            vesting_start_date: parse_date(&start)?,
            vesting_end_date: parse_optional_date(row.get("vesting_end_date"))?,
            status: status.parse::<GrantStatus>()?,
            vested_shares: shares_from_db(vested_shares)?,
        }))
    }
}
