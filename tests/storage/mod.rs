//! Shared storage integration tests.
//!
//! Tests the grant, schedule and vesting event store contracts against all
//! implementations. Each backend's test binary runs these functions.

pub mod event_store_tests;
pub mod schedule_store_tests;

use chrono::NaiveDate;
use uuid::Uuid;

use ltip_vesting::model::{event_id, Grant, VestingEvent, VestingStatus};

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid test date")
}

pub fn make_grant(total_shares: u64) -> Grant {
    Grant::new(Uuid::new_v4(), Uuid::new_v4(), total_shares, date(2024, 1, 1))
}

/// Pending annual events for `grant_id`, one per share count.
pub fn make_events(grant_id: Uuid, shares: &[u64]) -> Vec<VestingEvent> {
    let count = shares.len() as f64;
    shares
        .iter()
        .enumerate()
        .map(|(i, shares)| VestingEvent {
            id: event_id(grant_id, i as u32),
            grant_id,
            schedule_id: None,
            milestone_id: None,
            sequence_number: i as u32,
            vesting_date: date(2025 + i as i32, 1, 1),
            percentage: 100.0 / count,
            shares: *shares,
            status: VestingStatus::Pending,
        })
        .collect()
}
