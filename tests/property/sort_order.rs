//! Property tests for list sorting.
//!
//! Uses proptest to verify, for every sort key over arbitrary collections:
//! 1. The result is a permutation of the input.
//! 2. Adjacent tasks are in key order.
//! 3. Tasks with equal keys keep their fetch order (stability).

#![allow(clippy::unwrap_used)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use taskdeck::tasks::{SortKey, sort_tasks};
use taskdeck_proto::{Priority, Task, TaskId};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

fn arb_priority() -> impl Strategy<Value = Priority> {
    prop_oneof![Just(Priority::Low), Just(Priority::Medium), Just(Priority::High)]
}

/// Offsets from `now()` in hours, with deliberate collisions on both sides.
fn arb_due_date() -> impl Strategy<Value = Option<DateTime<Utc>>> {
    prop::option::of((-6i64..=6).prop_map(|h| now() + Duration::hours(h)))
}

/// Tasks whose id is their fetch position, so stability is checkable.
fn arb_collection() -> impl Strategy<Value = Vec<Task>> {
    prop::collection::vec((arb_priority(), any::<bool>(), arb_due_date()), 0..24).prop_map(
        |fields| {
            fields
                .into_iter()
                .enumerate()
                .map(|(i, (priority, completed, due_date))| {
                    let mut task = Task::new(TaskId::from(format!("{i:03}")), format!("task {i}"));
                    task.priority = priority;
                    task.completed = completed;
                    task.due_date = due_date;
                    task
                })
                .collect()
        },
    )
}

fn arb_sort_key() -> impl Strategy<Value = SortKey> {
    prop_oneof![
        Just(SortKey::None),
        Just(SortKey::Priority),
        Just(SortKey::Completion),
        Just(SortKey::DueProximity),
    ]
}

/// The comparison key each strategy orders by, lowest first.
fn key_of(task: &Task, key: SortKey) -> (u64, u64) {
    match key {
        SortKey::None => (0, 0),
        SortKey::Priority => (u64::from(task.priority.rank()), 0),
        SortKey::Completion => (u64::from(task.completed), 0),
        SortKey::DueProximity => task.due_date.map_or((1, 0), |due| {
            (0, (due - now()).num_milliseconds().unsigned_abs())
        }),
    }
}

proptest! {
    #[test]
    fn sort_is_a_stable_ordered_permutation(tasks in arb_collection(), key in arb_sort_key()) {
        let mut sorted = tasks.clone();
        sort_tasks(&mut sorted, key, now());

        let mut before: Vec<&str> = tasks.iter().map(|t| t.id.as_str()).collect();
        let mut after: Vec<&str> = sorted.iter().map(|t| t.id.as_str()).collect();
        before.sort_unstable();
        after.sort_unstable();
        prop_assert_eq!(before, after);

        for pair in sorted.windows(2) {
            let (a, b) = (key_of(&pair[0], key), key_of(&pair[1], key));
            prop_assert!(a <= b, "{:?} sorted before {:?}", pair[0].id, pair[1].id);
            if a == b {
                prop_assert!(pair[0].id < pair[1].id, "equal keys reordered");
            }
        }
    }

    #[test]
    fn sorting_twice_changes_nothing(tasks in arb_collection(), key in arb_sort_key()) {
        let mut once = tasks;
        sort_tasks(&mut once, key, now());
        let mut twice = once.clone();
        sort_tasks(&mut twice, key, now());
        prop_assert_eq!(once, twice);
    }
}
