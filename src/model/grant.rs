//! Employee equity grants.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::string_enum;

/// Lifecycle label of a grant.
///
/// This is a status label, not an enforced state machine: only activation
/// and the completion/forfeiture paths in the vesting service move it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantStatus {
    PendingSignature,
    Active,
    Completed,
    Forfeited,
    Cancelled,
}

string_enum!(GrantStatus, "grant status", {
    PendingSignature => "pending_signature",
    Active => "active",
    Completed => "completed",
    Forfeited => "forfeited",
    Cancelled => "cancelled",
});

/// A share grant to one employee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grant {
    pub id: Uuid,
    pub company_id: Uuid,
    pub employee_id: Uuid,
    /// Template the grant's events are generated from.
    pub schedule_id: Option<Uuid>,
    pub total_shares: u64,
    pub vesting_start_date: NaiveDate,
    /// Date of the last scheduled vesting event, set on activation.
    pub vesting_end_date: Option<NaiveDate>,
    pub status: GrantStatus,
    /// Cache of the shares in settled events. The event rows are
    /// authoritative; stores rewrite this in the same transaction that
    /// mutates events.
    pub vested_shares: u64,
}

impl Grant {
    pub fn new(
        company_id: Uuid,
        employee_id: Uuid,
        total_shares: u64,
        vesting_start_date: NaiveDate,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            company_id,
            employee_id,
            schedule_id: None,
            total_shares,
            vesting_start_date,
            vesting_end_date: None,
            status: GrantStatus::PendingSignature,
            vested_shares: 0,
        }
    }

    pub fn with_schedule(mut self, schedule_id: Uuid) -> Self {
        self.schedule_id = Some(schedule_id);
        self
    }
}
