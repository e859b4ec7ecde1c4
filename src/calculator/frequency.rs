//! Cliff-plus-periodic schedule generation.

use chrono::NaiveDate;
use tracing::debug;

use super::{add_months, floor_share, FrequencyParams, Ledger, ComputedSchedule, Result};
use crate::validation::validate_frequency_params;

/// Generate a cliff followed by evenly spaced vesting periods.
///
/// The cliff entry (when `cliff_months > 0`) releases
/// `floor(total * cliff% / 100)` shares. The rest is split over
/// `(duration - cliff) / frequency` periods of `floor(rest / periods)`
/// shares, and the final period absorbs the rounding remainder.
pub fn generate_frequency_schedule(
    total_shares: u64,
    start: NaiveDate,
    params: &FrequencyParams,
) -> Result<ComputedSchedule> {
    validate_frequency_params(params)?;

    let step = params.frequency.months();
    let periods = (params.total_duration_months - params.cliff_months) / step;
    let cliff_percentage = params.resolved_cliff_percentage();

    let capacity = periods as usize + usize::from(params.cliff_months > 0);
    let mut ledger = Ledger::new(total_shares, capacity);

    let mut cliff_shares = 0;
    if params.cliff_months > 0 {
        cliff_shares = floor_share(total_shares, cliff_percentage);
        ledger.push(
            Some(params.cliff_months),
            add_months(start, params.cliff_months)?,
            cliff_percentage,
            cliff_shares,
            None,
        );
    }

    let remaining_shares = total_shares - cliff_shares;
    let per_period = remaining_shares / u64::from(periods);
    let period_percentage = (100.0 - cliff_percentage) / f64::from(periods);

    for period in 1..=periods {
        let shares = if period == periods {
            remaining_shares - per_period * u64::from(periods - 1)
        } else {
            per_period
        };
        let months = params.cliff_months + period * step;
        ledger.push(
            Some(months),
            add_months(start, months)?,
            period_percentage,
            shares,
            None,
        );
    }

    debug!(
        total_shares,
        periods,
        cliff_shares,
        per_period,
        "Generated frequency schedule"
    );

    ledger.finish()
}
