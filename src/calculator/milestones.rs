//! Milestone template expansion.

use chrono::NaiveDate;
use tracing::debug;

use super::{add_months, round_share, ComputedSchedule, Ledger, Result, ScheduleError};
use crate::model::VestingMilestone;
use crate::validation::{validate_milestones, ValidationError};

/// Expand milestones, in `sequence_order`, into dated share allocations.
///
/// Each milestone receives `round(total * percentage / 100)` shares, capped
/// at what is still unallocated, and the final milestone receives whatever
/// is left, so rounding never leaks or creates shares.
pub fn expand_milestones(
    total_shares: u64,
    start: NaiveDate,
    milestones: &[VestingMilestone],
) -> Result<ComputedSchedule> {
    validate_milestones(milestones)?;

    let mut ordered: Vec<&VestingMilestone> = milestones.iter().collect();
    ordered.sort_by_key(|m| m.sequence_order);

    let mut ledger = Ledger::new(total_shares, ordered.len());
    let mut previous_date: Option<NaiveDate> = None;
    let last_index = ordered.len() - 1;

    for (index, milestone) in ordered.into_iter().enumerate() {
        let vesting_date = milestone_date(start, milestone)?;
        if vesting_date < start {
            return Err(ValidationError::MilestoneBeforeStart {
                sequence_order: milestone.sequence_order,
                date: vesting_date,
                start,
            }
            .into());
        }
        if previous_date.is_some_and(|previous| vesting_date <= previous) {
            return Err(ValidationError::MilestoneOutOfOrder {
                sequence_order: milestone.sequence_order,
                date: vesting_date,
            }
            .into());
        }
        previous_date = Some(vesting_date);

        let shares = if index == last_index {
            total_shares
                .checked_sub(ledger.allocated())
                .ok_or(ScheduleError::Reconciliation {
                    expected: total_shares,
                    actual: ledger.allocated(),
                })?
        } else {
            round_share(total_shares, milestone.vesting_percentage)
                .min(total_shares.saturating_sub(ledger.allocated()))
        };

        ledger.push(
            milestone.months_from_start,
            vesting_date,
            milestone.vesting_percentage,
            shares,
            Some(milestone.id),
        );
    }

    debug!(
        total_shares,
        milestones = milestones.len(),
        "Expanded milestone schedule"
    );

    ledger.finish()
}

/// Offset-based milestones vest at `start + months_from_start`; the rest at
/// their target date.
fn milestone_date(start: NaiveDate, milestone: &VestingMilestone) -> Result<NaiveDate> {
    match (milestone.months_from_start, milestone.target_date) {
        (Some(months), _) => add_months(start, months),
        (None, Some(date)) => Ok(date),
        (None, None) => Err(ValidationError::MilestoneWithoutDate(milestone.sequence_order).into()),
    }
}
