//! `TaskDeck` command-line client.
//!
//! Each invocation mounts the app (reads the stored session, loads the list)
//! and then performs one action. Configuration via CLI flags, environment
//! variables, or config file (`~/.config/taskdeck/config.toml`).
//!
//! ```bash
//! # Sign in with the id issued by the identity provider
//! cargo run --bin taskdeck -- login --user-id 6bX0e2
//!
//! # Show tasks, highest priority first
//! cargo run --bin taskdeck -- list --sort priority
//!
//! # Against another task service
//! TASKDECK_URL=http://10.0.0.5:3000 cargo run --bin taskdeck -- add --name "Buy milk"
//! ```

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;

use taskdeck::app::{App, AppError, EMPTY_LIST_MESSAGE, Route};
use taskdeck::cli::Command;
use taskdeck::config::{CliArgs, ClientConfig};
use taskdeck::session::SessionCache;
use taskdeck::session::file::FileKvStore;
use taskdeck::store::TaskStoreError;
use taskdeck::store::http::HttpTaskStore;
use taskdeck::tasks::{ListSnapshot, MutationOutcome, SortKey};
use taskdeck_proto::{SessionIdentifier, TaskId};

type CliApp = App<HttpTaskStore, FileKvStore>;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    App(#[from] AppError),

    #[error(transparent)]
    Store(#[from] TaskStoreError),

    #[error("user id must not be empty")]
    EmptyUserId,

    #[error("not signed in; run `taskdeck login --user-id <id>` first")]
    SignedOut,

    #[error("refusing to delete {0} without --yes")]
    NotConfirmed(TaskId),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = CliArgs::parse();

    let config = match ClientConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Logs go to a file so stdout only carries command output.
    let _log_guard = init_logging(&cli.log_level, cli.log_file.as_deref());

    tracing::info!(base_url = %config.base_url, "taskdeck starting");

    let command = cli.command.unwrap_or(Command::List { sort: SortKey::None });
    let result = match HttpTaskStore::with_timeout(config.base_url.clone(), config.request_timeout)
    {
        Ok(store) => {
            let session = SessionCache::new(FileKvStore::new(config.session_path()));
            let mut app = App::new(Arc::new(store), session);
            run(&mut app, command).await
        }
        Err(e) => Err(e.into()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Initialize file-based logging.
///
/// Returns a [`WorkerGuard`] that must be held until shutdown to ensure all
/// buffered log entries are flushed.
fn init_logging(level: &str, file_path: Option<&Path>) -> Option<WorkerGuard> {
    let default_path = std::env::temp_dir().join("taskdeck.log");
    let log_path = file_path.unwrap_or(&default_path);

    let log_dir = log_path.parent()?;
    let file_name = log_path.file_name()?.to_str()?;

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(env_filter)
        .with_ansi(false)
        .init();

    Some(guard)
}

async fn run(app: &mut CliApp, command: Command) -> Result<(), CliError> {
    match command {
        Command::Login { user_id } => {
            let id = SessionIdentifier::new(user_id).ok_or(CliError::EmptyUserId)?;
            app.adopt_session(&id).await?;
            println!("Signed in as {id}");
            print_tasks(&app.snapshot());
        }
        Command::Logout => {
            app.logout().await?;
            println!("Signed out");
        }
        Command::List { sort } => {
            mount_signed_in(app).await?;
            app.sort_by(sort);
            print_tasks(&app.snapshot());
        }
        Command::Add(fields) => {
            mount_signed_in(app).await?;
            let draft = fields.apply(app.open_editor(None)?);
            let outcome = app.submit(draft).await?;
            report(&outcome, "Added");
        }
        Command::Update {
            id,
            fields,
            completed,
        } => {
            mount_signed_in(app).await?;
            let id = TaskId::from(id);
            let mut draft = fields.apply(app.open_editor(Some(&id))?);
            if let Some(completed) = completed {
                draft.completed = completed;
            }
            let outcome = app.submit(draft).await?;
            report(&outcome, "Updated");
        }
        Command::Complete { id } => {
            mount_signed_in(app).await?;
            let outcome = app.toggle_completed(&TaskId::from(id)).await?;
            report(&outcome, "Toggled");
        }
        Command::Remove { id, yes } => {
            let id = TaskId::from(id);
            if !yes {
                return Err(CliError::NotConfirmed(id));
            }
            mount_signed_in(app).await?;
            let outcome = app.delete(&id).await?;
            report(&outcome, "Removed");
        }
    }
    Ok(())
}

async fn mount_signed_in(app: &mut CliApp) -> Result<(), CliError> {
    if app.mount().await? == &Route::Auth {
        return Err(CliError::SignedOut);
    }
    Ok(())
}

fn report(outcome: &MutationOutcome, verb: &str) {
    match outcome {
        MutationOutcome::Saved(task) => println!("{verb} task {} ({})", task.id, task.name),
        MutationOutcome::Removed(id) => println!("{verb} task {id}"),
    }
}

fn print_tasks(snapshot: &ListSnapshot) {
    if let Some(error) = &snapshot.last_error {
        eprintln!("warning: {error}");
    }
    if snapshot.is_empty_state() {
        println!("{EMPTY_LIST_MESSAGE}");
        return;
    }
    for task in &snapshot.tasks {
        let mark = if task.completed { "x" } else { " " };
        let due = task
            .due_date
            .map(|d| format!("  due {}", d.format("%Y-%m-%d %H:%M")))
            .unwrap_or_default();
        println!(
            "[{mark}] {:<6} {}{due}  ({})",
            task.priority.to_string(),
            task.name,
            task.id
        );
        if !task.description.is_empty() {
            println!("           {}", task.description);
        }
    }
}
