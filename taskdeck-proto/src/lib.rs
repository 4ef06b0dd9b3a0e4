//! Shared task model and wire format for `TaskDeck`.

pub mod session;
pub mod task;
pub mod wire;

pub use session::SessionIdentifier;
pub use task::{MAX_TASK_NAME_LENGTH, Priority, Task, TaskId, ValidationFailure, validate_name};
pub use wire::{TaskRecord, WireError};
