//! Task management commands for CLI.

use clap::Subcommand;
use covey_pomodoro_core::error::Result;
use covey_pomodoro_core::storage::Database;
use covey_pomodoro_core::CoreError;

use super::print_json;

#[derive(Subcommand)]
pub enum TaskAction {
    /// Create a new task
    Add {
        /// Task title
        title: String,
    },
    /// List tasks with their accumulated time
    List,
}

pub fn run(action: TaskAction) -> Result<()> {
    let db = Database::open()?;
    match action {
        TaskAction::Add { title } => {
            let title = title.trim();
            if title.is_empty() {
                return Err(CoreError::InvalidArgument(
                    "task title must not be empty".into(),
                ));
            }
            print_json(&db.create_task(title)?)?;
        }
        TaskAction::List => print_json(&db.tasks()?)?,
    }
    Ok(())
}
