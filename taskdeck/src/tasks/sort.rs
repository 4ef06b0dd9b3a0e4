//! Comparison strategies for the local task view.
//!
//! Every strategy is a stable sort: tasks that compare equal keep the order
//! they had before sorting.

use chrono::{DateTime, Utc};
use taskdeck_proto::Task;

/// Which ordering the list view currently shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    /// Order of the last fetch.
    #[default]
    None,
    /// High, then Medium, then Low.
    Priority,
    /// Incomplete tasks before completed ones.
    Completion,
    /// Closest due date (past or future) first; undated tasks last.
    DueProximity,
}

impl std::fmt::Display for SortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Priority => write!(f, "priority"),
            Self::Completion => write!(f, "completion"),
            Self::DueProximity => write!(f, "due"),
        }
    }
}

impl std::str::FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" | "fetch" => Ok(Self::None),
            "priority" => Ok(Self::Priority),
            "completion" | "completed" => Ok(Self::Completion),
            "due" | "due-date" | "due_date" | "dueproximity" => Ok(Self::DueProximity),
            other => Err(format!("unknown sort key: {other}")),
        }
    }
}

/// Re-orders `tasks` in place by `key`.
///
/// `now` is the reference instant for [`SortKey::DueProximity`]; it is
/// captured once by the caller so the order does not drift while sorting.
/// [`SortKey::None`] leaves the slice untouched.
pub fn sort_tasks(tasks: &mut [Task], key: SortKey, now: DateTime<Utc>) {
    match key {
        SortKey::None => {}
        SortKey::Priority => tasks.sort_by_key(|t| t.priority.rank()),
        SortKey::Completion => tasks.sort_by_key(|t| t.completed),
        SortKey::DueProximity => tasks.sort_by_key(|t| due_distance(t, now)),
    }
}

/// `(undated, |due - now| in ms)` so dated tasks sort before undated ones.
fn due_distance(task: &Task, now: DateTime<Utc>) -> (bool, u64) {
    task.due_date.map_or((true, 0), |due| {
        (false, (due - now).num_milliseconds().unsigned_abs())
    })
}
