//! Schedule generation defaults and limits.

use serde::Deserialize;

/// Vesting configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VestingConfig {
    /// Cliff percentage applied when a frequency plan with a cliff leaves
    /// it unset. When absent the cliff releases the share proportional to
    /// its length (12 of 48 months -> 25%).
    pub default_cliff_percentage: Option<f64>,
    /// Longest template duration accepted, in months.
    /// Default: 120
    pub max_duration_months: u32,
}

impl Default for VestingConfig {
    fn default() -> Self {
        Self {
            default_cliff_percentage: None,
            max_duration_months: 120,
        }
    }
}
