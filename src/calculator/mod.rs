//! Vesting schedule computation.
//!
//! Two call shapes share one engine:
//! - [`generate_frequency_schedule`]: a cliff followed by evenly spaced
//!   periods (document previews, templates without milestones)
//! - [`expand_milestones`]: an explicit, percentage-allocated milestone list
//!
//! Both validate their input up front, use calendar-month date arithmetic
//! and guarantee that the emitted share counts sum to the grant total and
//! the cumulative percentage closes at exactly 100.
//!
//! Everything here is pure and synchronous.

mod dates;
mod frequency;
mod milestones;
mod summary;

pub use dates::add_months;
pub use frequency::generate_frequency_schedule;
pub use milestones::expand_milestones;
pub use summary::{NextVesting, VestingSummary};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{
    event_id, Grant, VestingEvent, VestingFrequency, VestingMilestone, VestingScheduleTemplate,
    VestingStatus,
};
use crate::validation::ValidationError;

/// Errors raised while computing a schedule.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScheduleError {
    #[error("Invalid vesting configuration: {0}")]
    Invalid(#[from] ValidationError),

    #[error("Vesting date overflow: {months} months after {start}")]
    DateOverflow { start: NaiveDate, months: u32 },

    /// Allocated shares do not add up to the grant total. Indicates a
    /// defect, never a recoverable condition.
    #[error("Share reconciliation failed: expected {expected}, allocated {actual}")]
    Reconciliation { expected: u64, actual: u64 },
}

pub type Result<T> = std::result::Result<T, ScheduleError>;

/// Cliff-plus-periodic vesting parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencyParams {
    pub total_duration_months: u32,
    pub cliff_months: u32,
    /// Percentage released at the cliff. When absent the cliff releases the
    /// share proportional to its length.
    #[serde(default)]
    pub cliff_percentage: Option<f64>,
    pub frequency: VestingFrequency,
}

impl FrequencyParams {
    /// Percentage released at the cliff, after defaulting.
    pub fn resolved_cliff_percentage(&self) -> f64 {
        if self.cliff_months == 0 {
            return 0.0;
        }
        match self.cliff_percentage {
            Some(percentage) => percentage,
            None => {
                f64::from(self.cliff_months) * 100.0 / f64::from(self.total_duration_months)
            }
        }
    }
}

impl From<&VestingScheduleTemplate> for FrequencyParams {
    fn from(template: &VestingScheduleTemplate) -> Self {
        Self {
            total_duration_months: template.total_duration_months,
            cliff_months: template.cliff_months,
            cliff_percentage: template.cliff_percentage,
            frequency: template.frequency,
        }
    }
}

/// How a grant's shares are spread over time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VestingPlan {
    Frequency(FrequencyParams),
    Milestones { milestones: Vec<VestingMilestone> },
}

impl VestingPlan {
    /// The plan a template describes: its milestones when it has any,
    /// otherwise its cliff and frequency fields.
    pub fn from_template(template: &VestingScheduleTemplate) -> Self {
        if template.milestones.is_empty() {
            Self::Frequency(FrequencyParams::from(template))
        } else {
            Self::Milestones {
                milestones: template.milestones.clone(),
            }
        }
    }

    /// Fill in a cliff percentage for frequency plans that leave it open.
    pub fn with_default_cliff_percentage(mut self, default: Option<f64>) -> Self {
        if let Self::Frequency(params) = &mut self {
            if params.cliff_percentage.is_none() && params.cliff_months > 0 {
                params.cliff_percentage = default;
            }
        }
        self
    }
}

/// Compute the schedule for `total_shares` starting at `start`.
pub fn compute(total_shares: u64, start: NaiveDate, plan: &VestingPlan) -> Result<ComputedSchedule> {
    match plan {
        VestingPlan::Frequency(params) => generate_frequency_schedule(total_shares, start, params),
        VestingPlan::Milestones { milestones } => expand_milestones(total_shares, start, milestones),
    }
}

/// One row of a computed schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub sequence: u32,
    /// Offset from the vesting start, absent for milestones anchored on a
    /// target date.
    pub months_from_start: Option<u32>,
    pub vesting_date: NaiveDate,
    pub percentage: f64,
    pub shares: u64,
    pub cumulative_percentage: f64,
    pub cumulative_shares: u64,
    pub milestone_id: Option<Uuid>,
}

/// An ordered, reconciled vesting schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputedSchedule {
    pub total_shares: u64,
    pub entries: Vec<ScheduleEntry>,
}

impl ComputedSchedule {
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.entries.last().map(|e| e.vesting_date)
    }

    /// Pending vesting events for `grant`, with ids stable across
    /// regenerations from the same inputs.
    pub fn to_events(&self, grant: &Grant) -> Vec<VestingEvent> {
        self.entries
            .iter()
            .map(|entry| VestingEvent {
                id: event_id(grant.id, entry.sequence),
                grant_id: grant.id,
                schedule_id: grant.schedule_id,
                milestone_id: entry.milestone_id,
                sequence_number: entry.sequence,
                vesting_date: entry.vesting_date,
                percentage: entry.percentage,
                shares: entry.shares,
                status: VestingStatus::Pending,
            })
            .collect()
    }
}

/// Guards against float error when a percentage of a whole share count is
/// itself whole (e.g. 29% of 100).
const SHARE_EPSILON: f64 = 1e-9;

/// `floor(total * percentage / 100)`, capped at `total`.
pub(crate) fn floor_share(total: u64, percentage: f64) -> u64 {
    let raw = total as f64 * percentage / 100.0;
    ((raw + SHARE_EPSILON).floor() as u64).min(total)
}

/// `round(total * percentage / 100)`.
pub(crate) fn round_share(total: u64, percentage: f64) -> u64 {
    (total as f64 * percentage / 100.0).round() as u64
}

/// Accumulates entries and closes the schedule.
pub(crate) struct Ledger {
    total_shares: u64,
    entries: Vec<ScheduleEntry>,
    cumulative_shares: u64,
    cumulative_percentage: f64,
}

impl Ledger {
    pub(crate) fn new(total_shares: u64, capacity: usize) -> Self {
        Self {
            total_shares,
            entries: Vec::with_capacity(capacity),
            cumulative_shares: 0,
            cumulative_percentage: 0.0,
        }
    }

    pub(crate) fn allocated(&self) -> u64 {
        self.cumulative_shares
    }

    pub(crate) fn push(
        &mut self,
        months_from_start: Option<u32>,
        vesting_date: NaiveDate,
        percentage: f64,
        shares: u64,
        milestone_id: Option<Uuid>,
    ) {
        self.cumulative_shares += shares;
        self.cumulative_percentage += percentage;
        self.entries.push(ScheduleEntry {
            sequence: self.entries.len() as u32,
            months_from_start,
            vesting_date,
            percentage,
            shares,
            cumulative_percentage: self.cumulative_percentage,
            cumulative_shares: self.cumulative_shares,
            milestone_id,
        });
    }

    /// Verify conservation and pin the final cumulative percentage to 100.
    ///
    /// The last entry's percentage absorbs whatever float drift the running
    /// sum accumulated.
    pub(crate) fn finish(mut self) -> Result<ComputedSchedule> {
        if self.cumulative_shares != self.total_shares {
            return Err(ScheduleError::Reconciliation {
                expected: self.total_shares,
                actual: self.cumulative_shares,
            });
        }

        if let Some(last) = self.entries.last_mut() {
            let before_last = last.cumulative_percentage - last.percentage;
            last.percentage = 100.0 - before_last;
            last.cumulative_percentage = 100.0;
        }

        Ok(ComputedSchedule {
            total_shares: self.total_shares,
            entries: self.entries,
        })
    }
}
