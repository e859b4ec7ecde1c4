//! Vested totals derived from a grant's vesting events.

use chrono::NaiveDate;
use serde::Serialize;

use crate::model::VestingEvent;

/// Upcoming open allocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NextVesting {
    pub sequence_number: u32,
    pub vesting_date: NaiveDate,
    pub shares: u64,
}

/// Share totals of a grant, recomputed from its events.
///
/// This is the authoritative view; a grant's stored `vested_shares` is only
/// a cache of `vested_shares` here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VestingSummary {
    pub total_shares: u64,
    pub as_of: NaiveDate,
    /// Vested, transferred or exercised.
    pub vested_shares: u64,
    /// Pending or due.
    pub unvested_shares: u64,
    /// Forfeited or cancelled.
    pub forfeited_shares: u64,
    /// Non-void shares scheduled on or before `as_of`, whatever their
    /// status.
    pub scheduled_shares: u64,
    pub next_vesting: Option<NextVesting>,
}

impl VestingSummary {
    pub fn from_events(total_shares: u64, events: &[VestingEvent], as_of: NaiveDate) -> Self {
        let mut summary = Self {
            total_shares,
            as_of,
            vested_shares: 0,
            unvested_shares: 0,
            forfeited_shares: 0,
            scheduled_shares: 0,
            next_vesting: None,
        };

        for event in events {
            if event.status.is_settled() {
                summary.vested_shares += event.shares;
            } else if event.status.is_open() {
                summary.unvested_shares += event.shares;
            } else {
                summary.forfeited_shares += event.shares;
            }

            if !event.status.is_void() && event.vesting_date <= as_of {
                summary.scheduled_shares += event.shares;
            }
        }

        summary.next_vesting = events
            .iter()
            .filter(|e| e.status.is_open())
            .min_by_key(|e| (e.vesting_date, e.sequence_number))
            .map(|e| NextVesting {
                sequence_number: e.sequence_number,
                vesting_date: e.vesting_date,
                shares: e.shares,
            });

        summary
    }

    /// Events exist for every share of the grant.
    pub fn is_fully_allocated(&self) -> bool {
        self.vested_shares + self.unvested_shares + self.forfeited_shares == self.total_shares
    }
}
