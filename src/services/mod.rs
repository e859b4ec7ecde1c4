//! Grant-level vesting operations over the storage traits.

pub mod vesting;

pub use vesting::{ServiceError, VestingService};
