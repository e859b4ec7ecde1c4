//! LTIP vesting engine.
//!
//! Computes cliff-plus-periodic and milestone-based vesting schedules for
//! employee equity grants, and manages the lifecycle of the vesting events
//! persisted for each grant.

pub mod calculator;
pub mod config;
pub mod model;
pub mod services;
pub mod storage;
pub mod utils;
pub mod validation;
