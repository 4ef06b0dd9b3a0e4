//! Subcommands of the `taskdeck` binary.

use chrono::{DateTime, Utc};
use taskdeck_proto::Priority;

use crate::tasks::{SortKey, TaskDraft};

/// What to do. Every command mounts the app first, so a missing session is
/// reported the same way everywhere.
#[derive(clap::Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Store the user id issued by the identity provider.
    Login {
        /// Identifier of the signed-in user.
        #[arg(long)]
        user_id: String,
    },

    /// Forget the stored user id.
    Logout,

    /// Show the task list.
    List {
        /// Ordering: priority, completion or due.
        #[arg(long, default_value_t = SortKey::None)]
        sort: SortKey,
    },

    /// Create a task.
    Add(TaskArgs),

    /// Edit a task. Fields not given keep their current value.
    Update {
        /// Task id.
        id: String,

        #[command(flatten)]
        fields: TaskArgs,

        /// Mark done (`true`) or not done (`false`).
        #[arg(long)]
        completed: Option<bool>,
    },

    /// Toggle a task between done and not done.
    Complete {
        /// Task id.
        id: String,
    },

    /// Delete a task.
    Remove {
        /// Task id.
        id: String,

        /// Confirm the deletion.
        #[arg(long)]
        yes: bool,
    },
}

/// Editable task fields shared by `add` and `update`.
#[derive(clap::Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskArgs {
    /// Task name.
    #[arg(long)]
    pub name: Option<String>,

    /// Free-form description.
    #[arg(long)]
    pub description: Option<String>,

    /// low, medium or high.
    #[arg(long)]
    pub priority: Option<Priority>,

    /// Due date as RFC 3339, e.g. `2024-06-01T12:00:00Z`.
    #[arg(long)]
    pub due: Option<DateTime<Utc>>,

    /// Image reference.
    #[arg(long)]
    pub image: Option<String>,
}

impl TaskArgs {
    /// Overwrites the fields of `draft` that were given on the command line.
    #[must_use]
    pub fn apply(self, mut draft: TaskDraft) -> TaskDraft {
        if let Some(name) = self.name {
            draft.name = name;
        }
        if let Some(description) = self.description {
            draft.description = description;
        }
        if let Some(priority) = self.priority {
            draft.priority = priority;
        }
        if let Some(due) = self.due {
            draft.due_date = Some(due);
        }
        if let Some(image) = self.image {
            draft.image_ref = Some(image);
        }
        draft
    }
}
