use covey_pomodoro_core::error::Result;
use covey_pomodoro_core::storage::Database;
use serde_json::json;

use super::print_json;

pub fn run_stats(today: bool) -> Result<()> {
    let db = Database::open()?;
    let stats = db.stats_all()?;
    if today {
        print_json(&json!({
            "sessions": stats.today_sessions,
            "work_secs": stats.today_work_secs,
        }))
    } else {
        print_json(&stats)
    }
}

pub fn run_sessions(task_id: Option<&str>) -> Result<()> {
    let db = Database::open()?;
    print_json(&db.sessions(task_id)?)
}
