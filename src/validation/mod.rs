//! Validation of vesting configuration.
//!
//! Every schedule input is checked here before any entry is generated, so a
//! malformed configuration is rejected as a whole instead of producing a
//! partial or inconsistent schedule.

use std::collections::HashSet;

use chrono::NaiveDate;

use crate::calculator::FrequencyParams;
use crate::config::VestingConfig;
use crate::model::{MilestoneType, VestingFrequency, VestingMilestone, VestingScheduleTemplate};

/// Numeric limits for validated fields.
pub mod limits {
    /// Allowed distance of a milestone percentage sum from 100.
    pub const PERCENTAGE_TOLERANCE: f64 = 1e-6;
    /// Maximum template name length.
    pub const MAX_NAME_LENGTH: usize = 128;
}

/// Rejected vesting configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("total vesting duration must be positive")]
    NonPositiveDuration,

    #[error("vesting duration of {months} months exceeds the maximum of {max}")]
    DurationTooLong { months: u32, max: u32 },

    #[error(
        "cliff of {cliff_months} months must be shorter than the {total_duration_months} month vesting duration"
    )]
    CliffNotBeforeEnd {
        cliff_months: u32,
        total_duration_months: u32,
    },

    #[error("{frequency} vesting does not evenly divide the {post_cliff_months} month post-cliff span")]
    FrequencyMismatch {
        frequency: VestingFrequency,
        post_cliff_months: u32,
    },

    #[error("cliff percentage {0} is outside 0..=100")]
    CliffPercentageOutOfRange(f64),

    #[error("cliff percentage {0} given for a schedule without a cliff")]
    CliffPercentageWithoutCliff(f64),

    #[error("schedule has no milestones")]
    NoMilestones,

    #[error("milestone {sequence_order}: percentage {percentage} must be greater than 0 and at most 100")]
    MilestonePercentageOutOfRange { sequence_order: u32, percentage: f64 },

    #[error("milestone percentages sum to {0}, expected 100")]
    MilestoneSum(f64),

    #[error("duplicate milestone sequence order {0}")]
    DuplicateSequenceOrder(u32),

    #[error("time milestone {0} has no months_from_start")]
    TimeMilestoneWithoutOffset(u32),

    #[error("milestone {0} has neither months_from_start nor target_date")]
    MilestoneWithoutDate(u32),

    #[error("milestone {sequence_order} vests on {date}, before the vesting start {start}")]
    MilestoneBeforeStart {
        sequence_order: u32,
        date: NaiveDate,
        start: NaiveDate,
    },

    #[error("milestone {sequence_order} vests on {date}, not after the previous milestone")]
    MilestoneOutOfOrder { sequence_order: u32, date: NaiveDate },

    #[error("schedule name cannot be empty")]
    EmptyName,

    #[error("schedule name exceeds maximum length (max: {max}, got: {len})")]
    NameTooLong { max: usize, len: usize },
}

pub type Result<T> = std::result::Result<T, ValidationError>;

/// Validate cliff-plus-frequency parameters.
///
/// Rules:
/// - Total duration is positive and the cliff ends strictly before it
/// - The frequency evenly divides the post-cliff span
/// - A cliff percentage, when given, lies in 0..=100 and needs a cliff
pub fn validate_frequency_params(params: &FrequencyParams) -> Result<()> {
    if params.total_duration_months == 0 {
        return Err(ValidationError::NonPositiveDuration);
    }
    if params.cliff_months >= params.total_duration_months {
        return Err(ValidationError::CliffNotBeforeEnd {
            cliff_months: params.cliff_months,
            total_duration_months: params.total_duration_months,
        });
    }

    let post_cliff_months = params.total_duration_months - params.cliff_months;
    if post_cliff_months % params.frequency.months() != 0 {
        return Err(ValidationError::FrequencyMismatch {
            frequency: params.frequency,
            post_cliff_months,
        });
    }

    if let Some(percentage) = params.cliff_percentage {
        if !(0.0..=100.0).contains(&percentage) {
            return Err(ValidationError::CliffPercentageOutOfRange(percentage));
        }
        if params.cliff_months == 0 && percentage > 0.0 {
            return Err(ValidationError::CliffPercentageWithoutCliff(percentage));
        }
    }

    Ok(())
}

/// Validate the date-independent rules of a milestone list.
///
/// Rules:
/// - At least one milestone, with unique sequence orders
/// - Each percentage lies in (0, 100] and together they sum to 100
/// - Time milestones carry `months_from_start`; performance milestones
///   carry `months_from_start` or `target_date`
///
/// Date ordering depends on the vesting start and is checked during
/// expansion.
pub fn validate_milestones(milestones: &[VestingMilestone]) -> Result<()> {
    if milestones.is_empty() {
        return Err(ValidationError::NoMilestones);
    }

    let mut seen = HashSet::with_capacity(milestones.len());
    let mut sum = 0.0;
    for milestone in milestones {
        if !seen.insert(milestone.sequence_order) {
            return Err(ValidationError::DuplicateSequenceOrder(
                milestone.sequence_order,
            ));
        }

        let percentage = milestone.vesting_percentage;
        if !(percentage > 0.0 && percentage <= 100.0) {
            return Err(ValidationError::MilestonePercentageOutOfRange {
                sequence_order: milestone.sequence_order,
                percentage,
            });
        }
        sum += percentage;

        match milestone.milestone_type {
            MilestoneType::Time if milestone.months_from_start.is_none() => {
                return Err(ValidationError::TimeMilestoneWithoutOffset(
                    milestone.sequence_order,
                ));
            }
            MilestoneType::Performance
                if milestone.months_from_start.is_none() && milestone.target_date.is_none() =>
            {
                return Err(ValidationError::MilestoneWithoutDate(
                    milestone.sequence_order,
                ));
            }
            _ => {}
        }
    }

    if (sum - 100.0).abs() > limits::PERCENTAGE_TOLERANCE {
        return Err(ValidationError::MilestoneSum(sum));
    }

    Ok(())
}

/// Validate a template before it is stored.
///
/// The milestone sum invariant is enforced here so that no template that
/// would fail expansion can be persisted.
pub fn validate_template(template: &VestingScheduleTemplate, config: &VestingConfig) -> Result<()> {
    let name = template.name.trim();
    if name.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if name.len() > limits::MAX_NAME_LENGTH {
        return Err(ValidationError::NameTooLong {
            max: limits::MAX_NAME_LENGTH,
            len: name.len(),
        });
    }
    if template.total_duration_months > config.max_duration_months {
        return Err(ValidationError::DurationTooLong {
            months: template.total_duration_months,
            max: config.max_duration_months,
        });
    }

    if template.milestones.is_empty() {
        validate_frequency_params(&FrequencyParams::from(template))
    } else {
        validate_milestones(&template.milestones)
    }
}
