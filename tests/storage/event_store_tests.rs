//! VestingEventStore interface tests.
//!
//! Cover the atomic replacement, the settled-events guard, compare-and-set
//! status updates and the grant's vested_shares cache.

use uuid::Uuid;

use ltip_vesting::model::VestingStatus;
use ltip_vesting::storage::{Storage, StorageError};

use super::{make_events, make_grant};

async fn vested_shares(storage: &Storage, grant_id: Uuid) -> u64 {
    storage
        .grants
        .get(grant_id)
        .await
        .unwrap()
        .expect("grant should exist")
        .vested_shares
}

pub async fn test_replace_and_list(storage: &Storage) {
    let grant = make_grant(1_000);
    storage.grants.put(&grant).await.unwrap();

    let mut events = make_events(grant.id, &[250, 250, 500]);
    events.reverse();
    storage
        .events
        .replace(grant.id, events)
        .await
        .expect("replace should succeed");

    let listed = storage.events.list(grant.id).await.expect("list should succeed");
    let sequences: Vec<u32> = listed.iter().map(|e| e.sequence_number).collect();
    assert_eq!(sequences, vec![0, 1, 2], "events ordered by sequence");
    assert_eq!(listed.iter().map(|e| e.shares).sum::<u64>(), 1_000);
}

pub async fn test_replace_overwrites(storage: &Storage) {
    let grant = make_grant(1_000);
    storage.grants.put(&grant).await.unwrap();

    storage
        .events
        .replace(grant.id, make_events(grant.id, &[500, 500]))
        .await
        .unwrap();
    let second = make_events(grant.id, &[1_000]);
    storage.events.replace(grant.id, second.clone()).await.unwrap();

    assert_eq!(storage.events.list(grant.id).await.unwrap(), second);
}

pub async fn test_replace_with_empty_clears(storage: &Storage) {
    let grant = make_grant(1_000);
    storage.grants.put(&grant).await.unwrap();
    storage
        .events
        .replace(grant.id, make_events(grant.id, &[1_000]))
        .await
        .unwrap();

    storage.events.replace(grant.id, vec![]).await.unwrap();

    assert!(storage.events.list(grant.id).await.unwrap().is_empty());
}

pub async fn test_replace_refused_when_settled(storage: &Storage) {
    let grant = make_grant(1_000);
    storage.grants.put(&grant).await.unwrap();
    let events = make_events(grant.id, &[400, 600]);
    storage.events.replace(grant.id, events.clone()).await.unwrap();
    storage
        .events
        .update_status(events[0].id, VestingStatus::Pending, VestingStatus::Vested)
        .await
        .unwrap();

    let err = storage
        .events
        .replace(grant.id, make_events(grant.id, &[1_000]))
        .await
        .expect_err("replace over settled events must fail");
    assert!(
        matches!(err, StorageError::SettledEventsExist { count: 1, .. }),
        "unexpected error: {err}"
    );

    let listed = storage.events.list(grant.id).await.unwrap();
    assert_eq!(listed.len(), 2, "original events untouched");
    assert_eq!(listed[0].status, VestingStatus::Vested);
}

pub async fn test_replace_rejects_foreign_events(storage: &Storage) {
    let grant = make_grant(1_000);
    let foreign = make_events(Uuid::new_v4(), &[1_000]);

    let err = storage.events.replace(grant.id, foreign).await.unwrap_err();
    assert!(matches!(err, StorageError::GrantMismatch { .. }));
    assert!(storage.events.list(grant.id).await.unwrap().is_empty());
}

pub async fn test_get_event(storage: &Storage) {
    let grant = make_grant(1_000);
    let events = make_events(grant.id, &[400, 600]);
    storage.events.replace(grant.id, events.clone()).await.unwrap();

    let loaded = storage.events.get(events[1].id).await.unwrap();
    assert_eq!(loaded.as_ref(), Some(&events[1]));
    assert!(storage.events.get(Uuid::new_v4()).await.unwrap().is_none());
}

pub async fn test_update_status_compare_and_set(storage: &Storage) {
    let grant = make_grant(1_000);
    let events = make_events(grant.id, &[1_000]);
    storage.events.replace(grant.id, events.clone()).await.unwrap();

    let updated = storage
        .events
        .update_status(events[0].id, VestingStatus::Pending, VestingStatus::Due)
        .await
        .expect("first update should succeed");
    assert_eq!(updated.status, VestingStatus::Due);

    let err = storage
        .events
        .update_status(events[0].id, VestingStatus::Pending, VestingStatus::Vested)
        .await
        .expect_err("stale expected status must fail");
    assert!(matches!(
        err,
        StorageError::StatusConflict {
            expected: VestingStatus::Pending,
            actual: VestingStatus::Due,
            ..
        }
    ));

    let err = storage
        .events
        .update_status(Uuid::new_v4(), VestingStatus::Pending, VestingStatus::Due)
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::EventNotFound(_)));
}

pub async fn test_vested_cache_follows_events(storage: &Storage) {
    let grant = make_grant(1_000);
    storage.grants.put(&grant).await.unwrap();
    let events = make_events(grant.id, &[250, 250, 500]);
    storage.events.replace(grant.id, events.clone()).await.unwrap();

    assert_eq!(vested_shares(storage, grant.id).await, 0);

    storage
        .events
        .update_status(events[0].id, VestingStatus::Pending, VestingStatus::Vested)
        .await
        .unwrap();
    assert_eq!(vested_shares(storage, grant.id).await, 250);

    storage
        .events
        .update_status(events[0].id, VestingStatus::Vested, VestingStatus::Exercised)
        .await
        .unwrap();
    storage
        .events
        .update_status(events[1].id, VestingStatus::Pending, VestingStatus::Forfeited)
        .await
        .unwrap();
    assert_eq!(vested_shares(storage, grant.id).await, 250, "forfeited shares never vest");

    storage
        .events
        .update_status(events[2].id, VestingStatus::Pending, VestingStatus::Vested)
        .await
        .unwrap();
    assert_eq!(vested_shares(storage, grant.id).await, 750);
}

/// Run all VestingEventStore interface tests against a storage bundle.
#[macro_export]
macro_rules! run_event_store_tests {
    ($storage:expr) => {
        use $crate::storage::event_store_tests::*;

        test_replace_and_list($storage).await;
        println!("  test_replace_and_list: PASSED");

        test_replace_overwrites($storage).await;
        println!("  test_replace_overwrites: PASSED");

        test_replace_with_empty_clears($storage).await;
        println!("  test_replace_with_empty_clears: PASSED");

        test_replace_refused_when_settled($storage).await;
        println!("  test_replace_refused_when_settled: PASSED");

        test_replace_rejects_foreign_events($storage).await;
        println!("  test_replace_rejects_foreign_events: PASSED");

        test_get_event($storage).await;
        println!("  test_get_event: PASSED");

        test_update_status_compare_and_set($storage).await;
        println!("  test_update_status_compare_and_set: PASSED");

        test_vested_cache_follows_events($storage).await;
        println!("  test_vested_cache_follows_events: PASSED");
    };
}
