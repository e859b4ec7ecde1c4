//! Database schema definitions using sea-query.
//!
//! These define the table and column identifiers for type-safe query building.

use sea_query::Iden;

/// Grants table schema.
#[derive(Iden)]
pub enum Grants {
    Table,
    #[iden = "id"]
    Id,
    #[iden = "company_id"]
    CompanyId,
    #[iden = "employee_id"]
    EmployeeId,
    #[iden = "schedule_id"]
    ScheduleId,
    #[iden = "total_shares"]
    TotalShares,
    #[iden = "vesting_start_date"]
    VestingStartDate,
    #[iden = "vesting_end_date"]
    VestingEndDate,
    #[iden = "status"]
    Status,
    #[iden = "vested_shares"]
    VestedShares,
    #[iden = "updated_at"]
    UpdatedAt,
}

/// Vesting schedule templates table schema.
#[derive(Iden)]
pub enum VestingSchedules {
    Table,
    #[iden = "id"]
    Id,
    #[iden = "name"]
    Name,
    #[iden = "schedule_type"]
    ScheduleType,
    #[iden = "total_duration_months"]
    TotalDurationMonths,
    #[iden = "cliff_months"]
    CliffMonths,
    #[iden = "cliff_percentage"]
    CliffPercentage,
    #[iden = "frequency"]
    Frequency,
}

/// Vesting milestones table schema.
#[derive(Iden)]
pub enum VestingMilestones {
    Table,
    #[iden = "id"]
    Id,
    #[iden = "schedule_id"]
    ScheduleId,
    #[iden = "sequence_order"]
    SequenceOrder,
    #[iden = "milestone_type"]
    MilestoneType,
    #[iden = "vesting_percentage"]
    VestingPercentage,
    #[iden = "months_from_start"]
    MonthsFromStart,
    #[iden = "target_date"]
    TargetDate,
}

/// Vesting events table schema.
#[derive(Iden)]
pub enum VestingEvents {
    Table,
    #[iden = "id"]
    Id,
    #[iden = "grant_id"]
    GrantId,
    #[iden = "schedule_id"]
    ScheduleId,
    #[iden = "milestone_id"]
    MilestoneId,
    #[iden = "sequence_number"]
    SequenceNumber,
    #[iden = "vesting_date"]
    VestingDate,
    #[iden = "percentage"]
    Percentage,
    #[iden = "shares"]
    Shares,
    #[iden = "status"]
    Status,
}

/// SQL for creating the grants table.
pub const CREATE_GRANTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS grants (
    id TEXT NOT NULL PRIMARY KEY,
    company_id TEXT NOT NULL,
    employee_id TEXT NOT NULL,
    schedule_id TEXT,
    total_shares INTEGER NOT NULL,
    vesting_start_date TEXT NOT NULL,
    vesting_end_date TEXT,
    status TEXT NOT NULL,
    vested_shares INTEGER NOT NULL DEFAULT 0,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_grants_employee ON grants(employee_id);
"#;

/// SQL for creating the schedule template and milestone tables.
pub const CREATE_SCHEDULES_TABLES: &str = r#"
CREATE TABLE IF NOT EXISTS vesting_schedules (
    id TEXT NOT NULL PRIMARY KEY,
    name TEXT NOT NULL,
    schedule_type TEXT NOT NULL,
    total_duration_months INTEGER NOT NULL,
    cliff_months INTEGER NOT NULL,
    cliff_percentage REAL,
    frequency TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS vesting_milestones (
    id TEXT NOT NULL PRIMARY KEY,
    schedule_id TEXT NOT NULL,
    sequence_order INTEGER NOT NULL,
    milestone_type TEXT NOT NULL,
    vesting_percentage REAL NOT NULL,
    months_from_start INTEGER,
    target_date TEXT,
    UNIQUE (schedule_id, sequence_order)
);
"#;

/// SQL for creating the vesting events table.
pub const CREATE_VESTING_EVENTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS vesting_events (
    id TEXT NOT NULL PRIMARY KEY,
    grant_id TEXT NOT NULL,
    schedule_id TEXT,
    milestone_id TEXT,
    sequence_number INTEGER NOT NULL,
    vesting_date TEXT NOT NULL,
    percentage REAL NOT NULL,
    shares INTEGER NOT NULL,
    status TEXT NOT NULL,
    UNIQUE (grant_id, sequence_number)
);

CREATE INDEX IF NOT EXISTS idx_vesting_events_grant ON vesting_events(grant_id);
"#;
