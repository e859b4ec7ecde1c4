//! Schedule generation scenarios using cucumber-rs (Gherkin).

use chrono::NaiveDate;
use cucumber::{gherkin::Step, given, then, when, World};
use uuid::Uuid;

use ltip_vesting::calculator::{ComputedSchedule, FrequencyParams, VestingPlan};
use ltip_vesting::config::VestingConfig;
use ltip_vesting::model::{
    Grant, VestingEvent, VestingFrequency, VestingMilestone, VestingScheduleTemplate, VestingStatus,
};
use ltip_vesting::services::VestingService;
use ltip_vesting::storage::Storage;

#[derive(World)]
#[world(init = Self::new)]
pub struct ScheduleWorld {
    service: VestingService,
    total_shares: u64,
    start: NaiveDate,
    plan: Option<VestingPlan>,
    schedule: Option<ComputedSchedule>,
    last_error: Option<String>,
    grant_id: Option<Uuid>,
    original_events: Vec<VestingEvent>,
    regenerated_events: Vec<VestingEvent>,
}

impl std::fmt::Debug for ScheduleWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScheduleWorld")
            .field("total_shares", &self.total_shares)
            .field("start", &self.start)
            .field("plan", &self.plan)
            .field("last_error", &self.last_error)
            .field("grant_id", &self.grant_id)
            .finish_non_exhaustive()
    }
}

impl ScheduleWorld {
    fn new() -> Self {
        Self {
            service: VestingService::new(Storage::in_memory(), VestingConfig::default()),
            total_shares: 0,
            start: parse_date("2024-01-01"),
            plan: None,
            schedule: None,
            last_error: None,
            grant_id: None,
            original_events: Vec::new(),
            regenerated_events: Vec::new(),
        }
    }

    fn schedule(&self) -> &ComputedSchedule {
        match (&self.schedule, &self.last_error) {
            (Some(schedule), _) => schedule,
            (None, Some(error)) => panic!("Expected a schedule, generation failed: {error}"),
            (None, None) => panic!("No schedule generated"),
        }
    }

    fn grant_id(&self) -> Uuid {
        self.grant_id.expect("No grant set up")
    }
}

fn parse_date(value: &str) -> NaiveDate {
    value.parse().expect("dates are written as YYYY-MM-DD")
}

fn parse_frequency(value: &str) -> VestingFrequency {
    value.parse().expect("unknown vesting frequency")
}

/// Time milestones from a `| order | percentage | months |` table.
fn milestones_from_table(step: &Step) -> Vec<VestingMilestone> {
    let table = step.table.as_ref().expect("step needs a milestone table");
    table
        .rows
        .iter()
        .skip(1)
        .map(|row| {
            VestingMilestone::time(
                row[0].parse().expect("order"),
                row[1].parse().expect("percentage"),
                row[2].parse().expect("months"),
            )
        })
        .collect()
}

fn frequency_plan(
    frequency: &str,
    total_duration_months: u32,
    cliff_months: u32,
    cliff_percentage: Option<f64>,
) -> VestingPlan {
    VestingPlan::Frequency(FrequencyParams {
        total_duration_months,
        cliff_months,
        cliff_percentage,
        frequency: parse_frequency(frequency),
    })
}

// =============================================================================
// Given
// =============================================================================

#[given(expr = "a grant of {int} shares vesting from {string}")]
fn given_grant(world: &mut ScheduleWorld, total_shares: u64, start: String) {
    world.total_shares = total_shares;
    world.start = parse_date(&start);
}

#[given(expr = "a {word} plan over {int} months with a {int} month cliff at {float} percent")]
fn given_plan_with_cliff_percentage(
    world: &mut ScheduleWorld,
    frequency: String,
    duration: u32,
    cliff: u32,
    percentage: f64,
) {
    world.plan = Some(frequency_plan(&frequency, duration, cliff, Some(percentage)));
}

#[given(expr = "a {word} plan over {int} months with a {int} month cliff")]
fn given_plan_with_default_cliff(
    world: &mut ScheduleWorld,
    frequency: String,
    duration: u32,
    cliff: u32,
) {
    world.plan = Some(frequency_plan(&frequency, duration, cliff, None));
}

#[given(expr = "a {word} plan over {int} months with no cliff")]
fn given_plan_without_cliff(world: &mut ScheduleWorld, frequency: String, duration: u32) {
    world.plan = Some(frequency_plan(&frequency, duration, 0, None));
}

#[given("the milestones:")]
fn given_milestones(world: &mut ScheduleWorld, step: &Step) {
    world.plan = Some(VestingPlan::Milestones {
        milestones: milestones_from_table(step),
    });
}

#[given(expr = "{int} equal milestones {int} months apart")]
fn given_equal_milestones(world: &mut ScheduleWorld, count: u32, spacing: u32) {
    let percentage = 100.0 / f64::from(count);
    let milestones = (1..=count)
        .map(|order| VestingMilestone::time(order, percentage, order * spacing))
        .collect();
    world.plan = Some(VestingPlan::Milestones { milestones });
}

#[given("no milestones")]
fn given_no_milestones(world: &mut ScheduleWorld) {
    world.plan = Some(VestingPlan::Milestones { milestones: vec![] });
}

#[given(expr = "an active grant of {int} shares from {string} on the milestones:")]
async fn given_active_grant(world: &mut ScheduleWorld, total_shares: u64, start: String, step: &Step) {
    let template = VestingScheduleTemplate::time_based("Scenario", 48, 0, VestingFrequency::Annual)
        .with_milestones(milestones_from_table(step));
    world
        .service
        .create_schedule(&template)
        .await
        .expect("template should be valid");

    let grant = Grant::new(Uuid::new_v4(), Uuid::new_v4(), total_shares, parse_date(&start))
        .with_schedule(template.id);
    world.service.storage().grants.put(&grant).await.unwrap();
    world
        .service
        .activate_grant(grant.id)
        .await
        .expect("activation should succeed");

    world.original_events = world.service.storage().events.list(grant.id).await.unwrap();
    world.grant_id = Some(grant.id);
}

// =============================================================================
// When
// =============================================================================

#[when("the schedule is generated")]
fn when_generated(world: &mut ScheduleWorld) {
    let plan = world.plan.as_ref().expect("No plan given");
    match world.service.preview(world.total_shares, world.start, plan) {
        Ok(schedule) => {
            world.schedule = Some(schedule);
            world.last_error = None;
        }
        Err(e) => {
            world.schedule = None;
            world.last_error = Some(e.to_string());
        }
    }
}

#[when(expr = "event {int} vests")]
async fn when_event_vests(world: &mut ScheduleWorld, sequence: usize) {
    let event_id = world.original_events[sequence].id;
    world
        .service
        .advance_event(event_id, VestingStatus::Vested)
        .await
        .expect("event should vest");
}

#[when("the events are regenerated")]
async fn when_regenerated(world: &mut ScheduleWorld) {
    match world.service.regenerate_events(world.grant_id()).await {
        Ok(events) => {
            world.regenerated_events = events;
            world.last_error = None;
        }
        Err(e) => world.last_error = Some(e.to_string()),
    }
}

// =============================================================================
// Then
// =============================================================================

#[then(expr = "the schedule has {int} entries")]
fn then_entry_count(world: &mut ScheduleWorld, count: usize) {
    assert_eq!(world.schedule().entries.len(), count);
}

#[then(expr = "entry {int} vests {int} shares on {string}")]
fn then_entry_vests(world: &mut ScheduleWorld, index: usize, shares: u64, on: String) {
    let entry = &world.schedule().entries[index];
    assert_eq!(entry.shares, shares, "shares of entry {index}");
    assert_eq!(entry.vesting_date, parse_date(&on), "date of entry {index}");
}

#[then(expr = "entry {int} releases {float} percent")]
fn then_entry_percentage(world: &mut ScheduleWorld, index: usize, percentage: f64) {
    let entry = &world.schedule().entries[index];
    assert!(
        (entry.percentage - percentage).abs() < 1e-9,
        "entry {index} releases {} percent, expected {percentage}",
        entry.percentage
    );
}

#[then(expr = "entry {int} is {int} months from the start")]
fn then_entry_offset(world: &mut ScheduleWorld, index: usize, months: u32) {
    assert_eq!(world.schedule().entries[index].months_from_start, Some(months));
}

#[then(expr = "entries {int} to {int} vest {int} shares each")]
fn then_entries_vest(world: &mut ScheduleWorld, from: usize, to: usize, shares: u64) {
    for entry in &world.schedule().entries[from..=to] {
        assert_eq!(entry.shares, shares, "shares of entry {}", entry.sequence);
    }
}

#[then(expr = "the last entry vests {int} shares on {string}")]
fn then_last_entry_vests(world: &mut ScheduleWorld, shares: u64, on: String) {
    let last = world.schedule().entries.last().expect("schedule is empty");
    assert_eq!(last.shares, shares);
    assert_eq!(last.vesting_date, parse_date(&on));
}

#[then(expr = "the vesting dates are {string}")]
fn then_vesting_dates(world: &mut ScheduleWorld, dates: String) {
    let expected: Vec<NaiveDate> = dates.split(',').map(|d| parse_date(d.trim())).collect();
    let actual: Vec<NaiveDate> = world.schedule().entries.iter().map(|e| e.vesting_date).collect();
    assert_eq!(actual, expected);
}

#[then(expr = "the shares are {string}")]
fn then_shares(world: &mut ScheduleWorld, shares: String) {
    let expected: Vec<u64> = shares.split(',').map(|s| s.trim().parse().unwrap()).collect();
    let actual: Vec<u64> = world.schedule().entries.iter().map(|e| e.shares).collect();
    assert_eq!(actual, expected);
}

#[then(expr = "the cumulative shares are {string}")]
fn then_cumulative_shares(world: &mut ScheduleWorld, shares: String) {
    let expected: Vec<u64> = shares.split(',').map(|s| s.trim().parse().unwrap()).collect();
    let actual: Vec<u64> = world
        .schedule()
        .entries
        .iter()
        .map(|e| e.cumulative_shares)
        .collect();
    assert_eq!(actual, expected);
}

#[then(expr = "the shares sum to {int}")]
fn then_shares_sum(world: &mut ScheduleWorld, total: u64) {
    let sum: u64 = world.schedule().entries.iter().map(|e| e.shares).sum();
    assert_eq!(sum, total);

    let last = world.schedule().entries.last().expect("schedule is empty");
    assert_eq!(last.cumulative_shares, total);
}

#[then("the final cumulative percentage is 100")]
fn then_percentage_closes(world: &mut ScheduleWorld) {
    let last = world.schedule().entries.last().expect("schedule is empty");
    assert_eq!(last.cumulative_percentage, 100.0);
}

#[then("the vesting dates strictly increase")]
fn then_dates_increase(world: &mut ScheduleWorld) {
    for pair in world.schedule().entries.windows(2) {
        assert!(
            pair[0].vesting_date < pair[1].vesting_date,
            "entry {} on {} is not before entry {} on {}",
            pair[0].sequence,
            pair[0].vesting_date,
            pair[1].sequence,
            pair[1].vesting_date
        );
    }
}

#[then(expr = "generation is rejected with {string}")]
fn then_rejected(world: &mut ScheduleWorld, expected: String) {
    assert!(world.schedule.is_none(), "Expected rejection, got a schedule");
    let error = world.last_error.as_ref().expect("Expected an error");
    assert!(
        error.contains(&expected),
        "Expected error containing '{expected}', got '{error}'"
    );
}

#[then("the regenerated events are identical to the originals")]
async fn then_regenerated_identical(world: &mut ScheduleWorld) {
    assert!(world.last_error.is_none(), "{:?}", world.last_error);
    assert_eq!(world.regenerated_events, world.original_events);

    let stored = world
        .service
        .storage()
        .events
        .list(world.grant_id())
        .await
        .unwrap();
    assert_eq!(stored, world.original_events);
}

#[then(expr = "regeneration is refused with {string}")]
async fn then_regeneration_refused(world: &mut ScheduleWorld, expected: String) {
    let error = world.last_error.as_ref().expect("Expected regeneration to fail");
    assert!(
        error.contains(&expected),
        "Expected error containing '{expected}', got '{error}'"
    );

    let stored = world
        .service
        .storage()
        .events
        .list(world.grant_id())
        .await
        .unwrap();
    assert_eq!(stored.len(), world.original_events.len());
    assert_eq!(stored[0].status, VestingStatus::Vested);
}

#[tokio::main]
async fn main() {
    ScheduleWorld::cucumber()
        .run_and_exit("tests/schedule/features")
        .await;
}
