//! Vesting service.
//!
//! Ties the pure calculator to persisted grants, templates and events:
//! template creation, activation, destructive regeneration, status
//! transitions and derived summaries.

use chrono::NaiveDate;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::calculator::{self, ComputedSchedule, ScheduleError, VestingPlan, VestingSummary};
use crate::config::VestingConfig;
use crate::model::{Grant, GrantStatus, VestingEvent, VestingScheduleTemplate, VestingStatus};
use crate::storage::{Storage, StorageError};
use crate::validation::{validate_template, ValidationError};

/// Errors returned by [`VestingService`].
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Grant not found: {0}")]
    GrantNotFound(Uuid),

    #[error("Vesting event not found: {0}")]
    EventNotFound(Uuid),

    #[error("Grant {0} has no vesting schedule assigned")]
    ScheduleNotAssigned(Uuid),

    #[error("Vesting schedule not found: {0}")]
    ScheduleNotFound(Uuid),

    #[error("Grant {grant_id} is {status}")]
    InvalidGrantStatus { grant_id: Uuid, status: GrantStatus },

    #[error("Grant {grant_id} already has vesting events in progress")]
    EventsAlreadyGenerated { grant_id: Uuid },

    #[error("Regeneration refused for grant {grant_id}: {settled} events already settled")]
    RegenerationRefused { grant_id: Uuid, settled: usize },

    #[error("Vesting event {event_id} cannot move from {from} to {to}")]
    InvalidTransition {
        event_id: Uuid,
        from: VestingStatus,
        to: VestingStatus,
    },
}

pub type Result<T> = std::result::Result<T, ServiceError>;

impl ServiceError {
    /// Map the store's settled-events guard onto the regeneration error.
    fn from_replace(error: StorageError) -> Self {
        match error {
            StorageError::SettledEventsExist { grant_id, count } => Self::RegenerationRefused {
                grant_id,
                settled: count,
            },
            other => Self::Storage(other),
        }
    }
}

/// Vesting operations for grants.
pub struct VestingService {
    storage: Storage,
    config: VestingConfig,
}

impl VestingService {
    pub fn new(storage: Storage, config: VestingConfig) -> Self {
        Self { storage, config }
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Validate and persist a schedule template.
    #[tracing::instrument(name = "vesting.create_schedule", skip_all, fields(schedule_id = %template.id))]
    pub async fn create_schedule(&self, template: &VestingScheduleTemplate) -> Result<()> {
        validate_template(template, &self.config)?;
        self.storage.schedules.put(template).await?;

        info!(
            name = %template.name,
            milestones = template.milestones.len(),
            "Stored vesting schedule"
        );
        Ok(())
    }

    /// Compute a schedule without persisting anything.
    pub fn preview(
        &self,
        total_shares: u64,
        start: NaiveDate,
        plan: &VestingPlan,
    ) -> Result<ComputedSchedule> {
        let plan = self.resolve_plan(plan.clone())?;
        Ok(calculator::compute(total_shares, start, &plan)?)
    }

    /// Generate and persist a grant's events, then mark it active.
    ///
    /// Events left behind by an interrupted activation are overwritten as
    /// long as all of them are still pending.
    #[tracing::instrument(name = "vesting.activate_grant", skip_all, fields(%grant_id))]
    pub async fn activate_grant(&self, grant_id: Uuid) -> Result<Grant> {
        let mut grant = self.load_grant(grant_id).await?;
        if grant.status != GrantStatus::PendingSignature {
            return Err(ServiceError::InvalidGrantStatus {
                grant_id,
                status: grant.status,
            });
        }

        let existing = self.storage.events.list(grant_id).await?;
        if existing.iter().any(|e| e.status != VestingStatus::Pending) {
            return Err(ServiceError::EventsAlreadyGenerated { grant_id });
        }

        let schedule = self.schedule_for(&grant).await?;
        let events = schedule.to_events(&grant);
        let count = events.len();
        self.storage
            .events
            .replace(grant_id, events)
            .await
            .map_err(ServiceError::from_replace)?;

        grant.status = GrantStatus::Active;
        grant.vesting_end_date = schedule.last_date();
        self.storage.grants.put(&grant).await?;

        info!(events = count, end_date = ?grant.vesting_end_date, "Activated grant");
        Ok(grant)
    }

    /// Destructively replace all events of an active grant.
    ///
    /// Refused once any event is vested, transferred or exercised.
    #[tracing::instrument(name = "vesting.regenerate_events", skip_all, fields(%grant_id))]
    pub async fn regenerate_events(&self, grant_id: Uuid) -> Result<Vec<VestingEvent>> {
        let mut grant = self.load_grant(grant_id).await?;
        if grant.status != GrantStatus::Active {
            return Err(ServiceError::InvalidGrantStatus {
                grant_id,
                status: grant.status,
            });
        }

        let settled = self
            .storage
            .events
            .list(grant_id)
            .await?
            .iter()
            .filter(|e| e.status.is_settled())
            .count();
        if settled > 0 {
            warn!(settled, "Refusing to regenerate settled vesting events");
            return Err(ServiceError::RegenerationRefused { grant_id, settled });
        }

        let schedule = self.schedule_for(&grant).await?;
        let events = schedule.to_events(&grant);
        self.storage
            .events
            .replace(grant_id, events.clone())
            .await
            .map_err(ServiceError::from_replace)?;

        if grant.vesting_end_date != schedule.last_date() {
            grant.vesting_end_date = schedule.last_date();
            self.storage.grants.put(&grant).await?;
        }

        info!(events = events.len(), "Regenerated vesting events");
        Ok(events)
    }

    /// Move one event to `to`, completing the grant once nothing is open.
    #[tracing::instrument(name = "vesting.advance_event", skip_all, fields(%event_id, %to))]
    pub async fn advance_event(&self, event_id: Uuid, to: VestingStatus) -> Result<VestingEvent> {
        let event = self
            .storage
            .events
            .get(event_id)
            .await?
            .ok_or(ServiceError::EventNotFound(event_id))?;

        if !event.status.can_transition_to(to) {
            return Err(ServiceError::InvalidTransition {
                event_id,
                from: event.status,
                to,
            });
        }

        let updated = self
            .storage
            .events
            .update_status(event_id, event.status, to)
            .await?;

        debug!(grant_id = %updated.grant_id, from = %event.status, "Vesting event advanced");
        self.settle_grant_status(updated.grant_id).await?;
        Ok(updated)
    }

    /// Mark pending events dated on or before `as_of` as due.
    #[tracing::instrument(name = "vesting.mark_due", skip_all, fields(%grant_id, %as_of))]
    pub async fn mark_due(&self, grant_id: Uuid, as_of: NaiveDate) -> Result<Vec<VestingEvent>> {
        let events = self.storage.events.list(grant_id).await?;

        let mut marked = Vec::new();
        for event in events
            .iter()
            .filter(|e| e.status == VestingStatus::Pending && e.vesting_date <= as_of)
        {
            match self
                .storage
                .events
                .update_status(event.id, VestingStatus::Pending, VestingStatus::Due)
                .await
            {
                Ok(updated) => marked.push(updated),
                Err(StorageError::StatusConflict { actual, .. }) => {
                    debug!(event_id = %event.id, %actual, "Event changed concurrently, skipping");
                }
                Err(e) => return Err(e.into()),
            }
        }

        if !marked.is_empty() {
            info!(marked = marked.len(), "Marked vesting events due");
        }
        Ok(marked)
    }

    /// Forfeit every open event of a terminated employee's grant.
    ///
    /// Returns the number of shares forfeited.
    #[tracing::instrument(name = "vesting.forfeit_unvested", skip_all, fields(%grant_id))]
    pub async fn forfeit_unvested(&self, grant_id: Uuid) -> Result<u64> {
        let mut grant = self.load_grant(grant_id).await?;
        if !matches!(
            grant.status,
            GrantStatus::Active | GrantStatus::PendingSignature
        ) {
            return Err(ServiceError::InvalidGrantStatus {
                grant_id,
                status: grant.status,
            });
        }

        let mut events = 0;
        let mut shares = 0;
        for event in self.storage.events.list(grant_id).await? {
            if !event.status.is_open() {
                continue;
            }
            let event_shares = event.shares;
            if self.forfeit_event(event).await? {
                events += 1;
                shares += event_shares;
            }
        }

        grant.status = GrantStatus::Forfeited;
        self.storage.grants.put(&grant).await?;

        info!(events, shares, "Forfeited unvested shares");
        Ok(shares)
    }

    /// Share totals recomputed from the grant's events.
    pub async fn summary(&self, grant_id: Uuid, as_of: NaiveDate) -> Result<VestingSummary> {
        let grant = self.load_grant(grant_id).await?;
        let events = self.storage.events.list(grant_id).await?;
        Ok(VestingSummary::from_events(grant.total_shares, &events, as_of))
    }

    async fn load_grant(&self, grant_id: Uuid) -> Result<Grant> {
        self.storage
            .grants
            .get(grant_id)
            .await?
            .ok_or(ServiceError::GrantNotFound(grant_id))
    }

    /// Apply configured defaults and limits to a plan.
    fn resolve_plan(&self, plan: VestingPlan) -> Result<VestingPlan> {
        if let VestingPlan::Frequency(params) = &plan {
            if params.total_duration_months > self.config.max_duration_months {
                return Err(ValidationError::DurationTooLong {
                    months: params.total_duration_months,
                    max: self.config.max_duration_months,
                }
                .into());
            }
        }
        Ok(plan.with_default_cliff_percentage(self.config.default_cliff_percentage))
    }

    async fn schedule_for(&self, grant: &Grant) -> Result<ComputedSchedule> {
        let schedule_id = grant
            .schedule_id
            .ok_or(ServiceError::ScheduleNotAssigned(grant.id))?;
        let template = self
            .storage
            .schedules
            .get(schedule_id)
            .await?
            .ok_or(ServiceError::ScheduleNotFound(schedule_id))?;

        let plan = self.resolve_plan(VestingPlan::from_template(&template))?;
        Ok(calculator::compute(
            grant.total_shares,
            grant.vesting_start_date,
            &plan,
        )?)
    }

    /// Forfeit one open event, following it from pending to due if it moved
    /// concurrently. Returns whether the event was forfeited.
    async fn forfeit_event(&self, event: VestingEvent) -> Result<bool> {
        let mut expected = event.status;
        loop {
            match self
                .storage
                .events
                .update_status(event.id, expected, VestingStatus::Forfeited)
                .await
            {
                Ok(_) => return Ok(true),
                Err(StorageError::StatusConflict { actual, .. })
                    if actual.is_open() && actual != expected =>
                {
                    expected = actual;
                }
                Err(StorageError::StatusConflict { actual, .. }) => {
                    debug!(event_id = %event.id, %actual, "Event no longer open, skipping");
                    return Ok(false);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Close an active grant once none of its events is pending or due.
    async fn settle_grant_status(&self, grant_id: Uuid) -> Result<()> {
        let mut grant = self.load_grant(grant_id).await?;
        if grant.status != GrantStatus::Active {
            return Ok(());
        }

        let events = self.storage.events.list(grant_id).await?;
        if events.is_empty() || events.iter().any(|e| e.status.is_open()) {
            return Ok(());
        }

        grant.status = if events.iter().any(|e| e.status.is_settled()) {
            GrantStatus::Completed
        } else {
            GrantStatus::Forfeited
        };
        self.storage.grants.put(&grant).await?;

        info!(%grant_id, status = %grant.status, "Grant closed");
        Ok(())
    }
}
