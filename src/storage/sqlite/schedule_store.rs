//! SQLite ScheduleStore implementation.

use async_trait::async_trait;
use sea_query::{Expr, OnConflict, Order, Query, SqliteQueryBuilder};
use sqlx::{Row, SqliteConnection, SqlitePool};
use uuid::Uuid;

use super::{begin_immediate, finish_tx, parse_optional_date, parse_uuid};
use crate::model::{
    MilestoneType, ScheduleType, VestingFrequency, VestingMilestone, VestingScheduleTemplate,
};
use crate::storage::schema::{VestingMilestones, VestingSchedules, CREATE_SCHEDULES_TABLES};
use crate::storage::{Result, ScheduleStore};

/// SQLite implementation of ScheduleStore.
pub struct SqliteScheduleStore {
    pool: SqlitePool,
}

impl SqliteScheduleStore {
    /// Create a new SQLite schedule store.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the schedule and milestone tables if they do not exist.
    pub async fn init(&self) -> Result<()> {
        sqlx::raw_sql(CREATE_SCHEDULES_TABLES)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Upsert the template row and rewrite its milestones.
    async fn write_template(
        conn: &mut SqliteConnection,
        template: &VestingScheduleTemplate,
    ) -> Result<()> {
        let schedule_id = template.id.to_string();

        let query = Query::insert()
            .into_table(VestingSchedules::Table)
            .columns([
                VestingSchedules::Id,
                VestingSchedules::Name,
                VestingSchedules::ScheduleType,
                VestingSchedules::TotalDurationMonths,
                VestingSchedules::CliffMonths,
                VestingSchedules::CliffPercentage,
                VestingSchedules::Frequency,
            ])
            .values_panic([
                schedule_id.clone().into(),
                template.name.clone().into(),
                template.schedule_type.as_str().into(),
                template.total_duration_months.into(),
                template.cliff_months.into(),
                template.cliff_percentage.into(),
                template.frequency.as_str().into(),
            ])
            .on_conflict(
                OnConflict::column(VestingSchedules::Id)
                    .update_columns([
                        VestingSchedules::Name,
                        VestingSchedules::ScheduleType,
                        VestingSchedules::TotalDurationMonths,
                        VestingSchedules::CliffMonths,
                        VestingSchedules::CliffPercentage,
                        VestingSchedules::Frequency,
                    ])
                    .to_owned(),
            )
            .to_string(SqliteQueryBuilder);
        sqlx::query(&query).execute(&mut *conn).await?;

        let query = Query::delete()
            .from_table(VestingMilestones::Table)
            .and_where(Expr::col(VestingMilestones::ScheduleId).eq(schedule_id.as_str()))
            .to_string(SqliteQueryBuilder);
        sqlx::query(&query).execute(&mut *conn).await?;

        for milestone in &template.milestones {
            let query = Query::insert()
                .into_table(VestingMilestones::Table)
                .columns([
                    VestingMilestones::Id,
                    VestingMilestones::ScheduleId,
                    VestingMilestones::SequenceOrder,
                    VestingMilestones::MilestoneType,
                    VestingMilestones::VestingPercentage,
                    VestingMilestones::MonthsFromStart,
                    VestingMilestones::TargetDate,
                ])
                .values_panic([
                    milestone.id.to_string().into(),
                    schedule_id.clone().into(),
                    milestone.sequence_order.into(),
                    milestone.milestone_type.as_str().into(),
                    milestone.vesting_percentage.into(),
                    milestone.months_from_start.into(),
                    milestone.target_date.map(|d| d.to_string()).into(),
                ])
                .to_string(SqliteQueryBuilder);
            sqlx::query(&query).execute(&mut *conn).await?;
        }

        Ok(())
    }

    async fn load_milestones(&self, schedule_id: &str) -> Result<Vec<VestingMilestone>> {
        let query = Query::select()
            .columns([
                VestingMilestones::Id,
                VestingMilestones::SequenceOrder,
                VestingMilestones::MilestoneType,
                VestingMilestones::VestingPercentage,
                VestingMilestones::MonthsFromStart,
                VestingMilestones::TargetDate,
            ])
            .from(VestingMilestones::Table)
            .and_where(Expr::col(VestingMilestones::ScheduleId).eq(schedule_id))
            .order_by(VestingMilestones::SequenceOrder, Order::Asc)
            .to_string(SqliteQueryBuilder);

        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;

        let mut milestones = Vec::with_capacity(rows.len());
        for row in rows {
            let id: String = row.get("id");
            let sequence_order: i64 = row.get("sequence_order");
            let milestone_type: String = row.get("milestone_type");
            let months_from_start: Option<i64> = row.get("months_from_start");

            milestones.push(VestingMilestone {
                id: parse_uuid(&id)?,
                sequence_order: sequence_order as u32,
                milestone_type: milestone_type.parse::<MilestoneType>()?,
                vesting_percentage: row.get("vesting_percentage"),
                months_from_start: months_from_start.map(|m| m as u32),
                target_date: parse_optional_date(row.get("target_date"))?,
            });
        }

        Ok(milestones)
    }
}

#[async_trait]
impl ScheduleStore for SqliteScheduleStore {
    async fn put(&self, template: &VestingScheduleTemplate) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        begin_immediate(&mut conn).await?;

        let result = Self::write_template(&mut conn, template).await;
        finish_tx(&mut conn, result).await
    }

    async fn get(&self, id: Uuid) -> Result<Option<VestingScheduleTemplate>> {
        let schedule_id = id.to_string();

        let query = Query::select()
            .columns([
                VestingSchedules::Name,
                VestingSchedules::ScheduleType,
                VestingSchedules::TotalDurationMonths,
                VestingSchedules::CliffMonths,
                VestingSchedules::CliffPercentage,
                VestingSchedules::Frequency,
            ])
            .from(VestingSchedules::Table)
            .and_where(Expr::col(VestingSchedules::Id).eq(schedule_id.as_str()))
            .to_string(SqliteQueryBuilder);

        let row = sqlx::query(&query).fetch_optional(&self.pool).await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let schedule_type: String = row.get("schedule_type");
        let frequency: String = row.get("frequency");
        let total_duration_months: i64 = row.get("total_duration_months");
        let cliff_months: i64 = row.get("cliff_months");

        Ok(Some(VestingScheduleTemplate {
            id,
            name: row.get("name"),
            schedule_type: schedule_type.parse::<ScheduleType>()?,
            total_duration_months: total_duration_months as u32,
            cliff_months: cliff_months as u32,
            cliff_percentage: row.get("cliff_percentage"),
            frequency: frequency.parse::<VestingFrequency>()?,
            milestones: self.load_milestones(&schedule_id).await?,
        }))
    }
}
