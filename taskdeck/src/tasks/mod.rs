//! Task list view and task mutations.
//!
//! - [`controller::TaskListController`] owns the local view: single-flight
//!   fetches, staleness and in-place sorting
//! - [`mutation::TaskMutationCoordinator`] validates drafts, performs the
//!   remote create/update/delete and invalidates the view on success
//! - [`sort`] holds the comparison strategies
//!
//! The remote store is authoritative. The view is only ever replaced by a
//! fetch, never patched after a mutation.

pub mod controller;
pub mod mutation;
pub mod sort;

pub use controller::{FetchState, ListSnapshot, RefreshOutcome, TaskListController};
pub use mutation::{MutationError, MutationOutcome, TaskDraft, TaskMutationCoordinator};
pub use sort::{SortKey, sort_tasks};
