//! Vesting events persisted per grant.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::string_enum;

/// Lifecycle status of a single vesting event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VestingStatus {
    Pending,
    Due,
    Vested,
    Transferred,
    Exercised,
    Forfeited,
    Cancelled,
}

string_enum!(VestingStatus, "vesting status", {
    Pending => "pending",
    Due => "due",
    Vested => "vested",
    Transferred => "transferred",
    Exercised => "exercised",
    Forfeited => "forfeited",
    Cancelled => "cancelled",
});

impl VestingStatus {
    pub const ALL: [VestingStatus; 7] = [
        Self::Pending,
        Self::Due,
        Self::Vested,
        Self::Transferred,
        Self::Exercised,
        Self::Forfeited,
        Self::Cancelled,
    ];

    /// Shares have actually moved to the employee.
    ///
    /// Settled events count towards vested shares and block destructive
    /// regeneration of the grant's schedule.
    pub const fn is_settled(self) -> bool {
        matches!(self, Self::Vested | Self::Transferred | Self::Exercised)
    }

    /// Still expected to vest.
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Pending | Self::Due)
    }

    /// The shares will never vest.
    pub const fn is_void(self) -> bool {
        matches!(self, Self::Forfeited | Self::Cancelled)
    }

    /// Statuses reachable from this one in a single step.
    pub const fn next(self) -> &'static [VestingStatus] {
        match self {
            Self::Pending => &[Self::Due, Self::Vested, Self::Forfeited, Self::Cancelled],
            Self::Due => &[Self::Vested, Self::Forfeited, Self::Cancelled],
            Self::Vested => &[Self::Transferred, Self::Exercised],
            Self::Transferred | Self::Exercised | Self::Forfeited | Self::Cancelled => &[],
        }
    }

    pub fn can_transition_to(self, to: VestingStatus) -> bool {
        self.next().contains(&to)
    }
}

/// One dated share allocation belonging to a grant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VestingEvent {
    pub id: Uuid,
    pub grant_id: Uuid,
    pub schedule_id: Option<Uuid>,
    pub milestone_id: Option<Uuid>,
    pub sequence_number: u32,
    pub vesting_date: NaiveDate,
    pub percentage: f64,
    pub shares: u64,
    pub status: VestingStatus,
}

/// Stable identifier of the event at `sequence_number` within a grant.
///
/// Regenerating a grant's events from the same inputs reproduces the same ids.
pub fn event_id(grant_id: Uuid, sequence_number: u32) -> Uuid {
    Uuid::new_v5(
        &grant_id,
        format!("vesting-event:{}", sequence_number).as_bytes(),
    )
}
