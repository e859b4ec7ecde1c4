//! Calendar-month date arithmetic.

use chrono::{Months, NaiveDate};

use super::{Result, ScheduleError};

/// `start` plus `months` calendar months.
///
/// Offsets are always taken from the vesting start rather than chained from
/// the previous event, so a 31st-of-month start clamps to each target
/// month's last day without drifting (Jan 31 -> Feb 28 -> Mar 31).
pub fn add_months(start: NaiveDate, months: u32) -> Result<NaiveDate> {
    start
        .checked_add_months(Months::new(months))
        .ok_or(ScheduleError::DateOverflow { start, months })
}
