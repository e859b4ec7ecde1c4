//! ScheduleStore interface tests.

use uuid::Uuid;

use ltip_vesting::model::{VestingFrequency, VestingMilestone, VestingScheduleTemplate};
use ltip_vesting::storage::Storage;

use super::date;

pub async fn test_frequency_template_roundtrip(storage: &Storage) {
    let template =
        VestingScheduleTemplate::time_based("4y monthly", 48, 12, VestingFrequency::Monthly)
            .with_cliff_percentage(25.0);

    storage
        .schedules
        .put(&template)
        .await
        .expect("put should succeed");

    let loaded = storage
        .schedules
        .get(template.id)
        .await
        .expect("get should succeed")
        .expect("template should exist");
    assert_eq!(loaded, template);
}

pub async fn test_milestones_loaded_in_order(storage: &Storage) {
    let template = VestingScheduleTemplate::time_based("Hybrid", 36, 0, VestingFrequency::Annual)
        .with_milestones(vec![
            VestingMilestone::performance(3, 40.0, date(2027, 6, 30)),
            VestingMilestone::time(1, 30.0, 12),
            VestingMilestone::time(2, 30.0, 24),
        ]);

    storage.schedules.put(&template).await.unwrap();

    let loaded = storage.schedules.get(template.id).await.unwrap().unwrap();
    let orders: Vec<u32> = loaded.milestones.iter().map(|m| m.sequence_order).collect();
    assert_eq!(orders, vec![1, 2, 3]);
    assert_eq!(loaded.milestones[2].target_date, Some(date(2027, 6, 30)));
    assert_eq!(loaded.milestones[0].months_from_start, Some(12));
}

pub async fn test_put_replaces_milestones(storage: &Storage) {
    let mut template =
        VestingScheduleTemplate::time_based("Two step", 24, 0, VestingFrequency::Annual)
            .with_milestones(vec![
                VestingMilestone::time(1, 50.0, 12),
                VestingMilestone::time(2, 50.0, 24),
            ]);
    storage.schedules.put(&template).await.unwrap();

    template.name = "Single step".to_string();
    template.milestones = vec![VestingMilestone::time(1, 100.0, 24)];
    storage.schedules.put(&template).await.unwrap();

    let loaded = storage.schedules.get(template.id).await.unwrap().unwrap();
    assert_eq!(loaded.name, "Single step");
    assert_eq!(loaded.milestones, template.milestones);
}

pub async fn test_get_missing_schedule(storage: &Storage) {
    let loaded = storage.schedules.get(Uuid::new_v4()).await.unwrap();
    assert!(loaded.is_none(), "unknown template should be None");
}

/// Run all ScheduleStore interface tests against a storage bundle.
#[macro_export]
macro_rules! run_schedule_store_tests {
    ($storage:expr) => {
        use $crate::storage::schedule_store_tests::*;

        test_frequency_template_roundtrip($storage).await;
        println!("  test_frequency_template_roundtrip: PASSED");

        test_milestones_loaded_in_order($storage).await;
        println!("  test_milestones_loaded_in_order: PASSED");

        test_put_replaces_milestones($storage).await;
        println!("  test_put_replaces_milestones: PASSED");

        test_get_missing_schedule($storage).await;
        println!("  test_get_missing_schedule: PASSED");
    };
}
