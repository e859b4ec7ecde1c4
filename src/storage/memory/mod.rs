//! In-memory storage.
//!
//! Backs the `memory` storage type and the service tests. One lock guards
//! all three stores, which gives every operation the same atomicity as a
//! database transaction.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{GrantStore, Result, ScheduleStore, StorageError, VestingEventStore};
use crate::model::{Grant, VestingEvent, VestingScheduleTemplate, VestingStatus};

#[derive(Default)]
struct State {
    grants: HashMap<Uuid, Grant>,
    schedules: HashMap<Uuid, VestingScheduleTemplate>,
    /// Events per grant, ordered by sequence number.
    events: HashMap<Uuid, Vec<VestingEvent>>,
}

impl State {
    fn find_event_mut(&mut self, event_id: Uuid) -> Option<&mut VestingEvent> {
        self.events
            .values_mut()
            .flat_map(|events| events.iter_mut())
            .find(|e| e.id == event_id)
    }

    fn refresh_vested_shares(&mut self, grant_id: Uuid) {
        let vested = self
            .events
            .get(&grant_id)
            .map(|events| {
                events
                    .iter()
                    .filter(|e| e.status.is_settled())
                    .map(|e| e.shares)
                    .sum()
            })
            .unwrap_or(0);
        if let Some(grant) = self.grants.get_mut(&grant_id) {
            grant.vested_shares = vested;
        }
    }
}

/// In-memory implementation of every storage trait.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
    fail_on_write: RwLock<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail without touching state.
    pub async fn set_fail_on_write(&self, fail: bool) {
        *self.fail_on_write.write().await = fail;
    }

    async fn check_writable(&self) -> Result<()> {
        if *self.fail_on_write.read().await {
            return Err(StorageError::Unavailable(
                "writes disabled for testing".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl GrantStore for MemoryStore {
    async fn put(&self, grant: &Grant) -> Result<()> {
        self.check_writable().await?;
        let mut state = self.state.write().await;
        let mut grant = grant.clone();
        if let Some(existing) = state.grants.get(&grant.id) {
            grant.vested_shares = existing.vested_shares;
        }
        state.grants.insert(grant.id, grant);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Grant>> {
        Ok(self.state.read().await.grants.get(&id).cloned())
    }
}

#[async_trait]
impl ScheduleStore for MemoryStore {
    async fn put(&self, template: &VestingScheduleTemplate) -> Result<()> {
        self.check_writable().await?;
        let mut template = template.clone();
        template.milestones.sort_by_key(|m| m.sequence_order);
        self.state
            .write()
            .await
            .schedules
            .insert(template.id, template);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<VestingScheduleTemplate>> {
        Ok(self.state.read().await.schedules.get(&id).cloned())
    }
}

#[async_trait]
impl VestingEventStore for MemoryStore {
    async fn list(&self, grant_id: Uuid) -> Result<Vec<VestingEvent>> {
        Ok(self
            .state
            .read()
            .await
            .events
            .get(&grant_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn get(&self, event_id: Uuid) -> Result<Option<VestingEvent>> {
        let state = self.state.read().await;
        Ok(state
            .events
            .values()
            .flat_map(|events| events.iter())
            .find(|e| e.id == event_id)
            .cloned())
    }

    async fn replace(&self, grant_id: Uuid, mut events: Vec<VestingEvent>) -> Result<()> {
        self.check_writable().await?;

        if let Some(foreign) = events.iter().find(|e| e.grant_id != grant_id) {
            return Err(StorageError::GrantMismatch {
                grant_id,
                event_id: foreign.id,
            });
        }

        let mut state = self.state.write().await;
        let settled = state
            .events
            .get(&grant_id)
            .map(|existing| existing.iter().filter(|e| e.status.is_settled()).count())
            .unwrap_or(0);
        if settled > 0 {
            return Err(StorageError::SettledEventsExist {
                grant_id,
                count: settled,
            });
        }

        events.sort_by_key(|e| e.sequence_number);
        if events.is_empty() {
            state.events.remove(&grant_id);
        } else {
            state.events.insert(grant_id, events);
        }
        state.refresh_vested_shares(grant_id);
        Ok(())
    }

    async fn update_status(
        &self,
        event_id: Uuid,
        expected: VestingStatus,
        status: VestingStatus,
    ) -> Result<VestingEvent> {
        self.check_writable().await?;
        let mut state = self.state.write().await;

        let event = state
            .find_event_mut(event_id)
            .ok_or(StorageError::EventNotFound(event_id))?;
        if event.status != expected {
            return Err(StorageError::StatusConflict {
                event_id,
                expected,
                actual: event.status,
            });
        }
        event.status = status;
        let updated = event.clone();

        state.refresh_vested_shares(updated.grant_id);
        Ok(updated)
    }
}
