pub mod config;
pub mod stats;
pub mod task;
pub mod timer;

use covey_pomodoro_core::error::Result;

/// Print a value as pretty JSON on stdout.
pub fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
