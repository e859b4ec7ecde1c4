//! Vesting schedule templates and their milestones.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::string_enum;

/// Spacing between post-cliff vesting events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VestingFrequency {
    Monthly,
    Quarterly,
    SemiAnnual,
    Annual,
}

impl VestingFrequency {
    /// Number of calendar months between consecutive events.
    pub const fn months(self) -> u32 {
        match self {
            Self::Monthly => 1,
            Self::Quarterly => 3,
            Self::SemiAnnual => 6,
            Self::Annual => 12,
        }
    }
}

string_enum!(VestingFrequency, "vesting frequency", {
    Monthly => "monthly",
    Quarterly => "quarterly",
    SemiAnnual => "semi_annual",
    Annual => "annual",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleType {
    TimeBased,
    PerformanceBased,
    Hybrid,
}

string_enum!(ScheduleType, "schedule type", {
    TimeBased => "time_based",
    PerformanceBased => "performance_based",
    Hybrid => "hybrid",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MilestoneType {
    /// Vests a fixed number of months after the vesting start.
    Time,
    /// Vests on a target date, conditional on a business outcome.
    Performance,
}

string_enum!(MilestoneType, "milestone type", {
    Time => "time",
    Performance => "performance",
});

/// One allocation step of a schedule template.
///
/// Milestones are authored together with their template and are immutable
/// inputs to event generation afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VestingMilestone {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub sequence_order: u32,
    pub milestone_type: MilestoneType,
    /// Share of the grant, in percent, released by this milestone.
    pub vesting_percentage: f64,
    /// Offset from the vesting start. Required for time milestones.
    #[serde(default)]
    pub months_from_start: Option<u32>,
    /// Expected achievement date for performance milestones without an offset.
    #[serde(default)]
    pub target_date: Option<NaiveDate>,
}

impl VestingMilestone {
    pub fn time(sequence_order: u32, vesting_percentage: f64, months_from_start: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            sequence_order,
            milestone_type: MilestoneType::Time,
            vesting_percentage,
            months_from_start: Some(months_from_start),
            target_date: None,
        }
    }

    pub fn performance(sequence_order: u32, vesting_percentage: f64, target_date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            sequence_order,
            milestone_type: MilestoneType::Performance,
            vesting_percentage,
            months_from_start: None,
            target_date: Some(target_date),
        }
    }
}

/// A reusable vesting plan that grants reference by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VestingScheduleTemplate {
    pub id: Uuid,
    pub name: String,
    pub schedule_type: ScheduleType,
    pub total_duration_months: u32,
    pub cliff_months: u32,
    /// Percentage released at the cliff. Defaulted when absent.
    #[serde(default)]
    pub cliff_percentage: Option<f64>,
    pub frequency: VestingFrequency,
    /// When non-empty, events follow these milestones instead of the
    /// cliff-plus-frequency rule.
    #[serde(default)]
    pub milestones: Vec<VestingMilestone>,
}

impl VestingScheduleTemplate {
    /// A time-based template with no explicit milestones.
    pub fn time_based(
        name: impl Into<String>,
        total_duration_months: u32,
        cliff_months: u32,
        frequency: VestingFrequency,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            schedule_type: ScheduleType::TimeBased,
            total_duration_months,
            cliff_months,
            cliff_percentage: None,
            frequency,
            milestones: Vec::new(),
        }
    }

    pub fn with_cliff_percentage(mut self, percentage: f64) -> Self {
        self.cliff_percentage = Some(percentage);
        self
    }

    pub fn with_milestones(mut self, milestones: Vec<VestingMilestone>) -> Self {
        self.milestones = milestones;
        self
    }
}
