//! End-to-end test: controller writing into the SQLite store.

use std::sync::Arc;

use covey_pomodoro_core::{
    ControllerOptions, Database, LogNotifier, ManualClock, ManualScheduler, PhaseDurations,
    TimerController, TimerEngine,
};

fn controller_on(
    db: Arc<Database>,
    clock: &ManualClock,
    options: ControllerOptions,
) -> TimerController {
    TimerController::new(
        TimerEngine::with_clock(
            PhaseDurations {
                work_secs: 60,
                ..PhaseDurations::default()
            },
            Arc::new(clock.clone()),
        ),
        db.clone(),
        db,
        Arc::new(LogNotifier),
        Arc::new(ManualScheduler::new()),
        options,
    )
}

#[tokio::test]
async fn saved_sessions_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("covey.db");
    let clock = ManualClock::default();

    let task_id = {
        let db = Arc::new(Database::open_at(&path).unwrap());
        let task = db.create_task("Quarterly review").unwrap();
        let controller = controller_on(db.clone(), &clock, ControllerOptions::default());
        controller.set_current_task(Some(task.id.clone()), Some(task.title.clone()));

        controller.start().unwrap();
        clock.advance_secs(25);
        let outcome = controller.stop_and_save().await.unwrap();
        assert_eq!(outcome.task_time_secs, Some(25));

        controller.start().unwrap();
        clock.advance_secs(15);
        let outcome = controller.stop_and_save().await.unwrap();
        assert_eq!(outcome.task_time_secs, Some(40));
        task.id
    };

    let db = Database::open_at(&path).unwrap();
    let sessions = db.sessions(Some(&task_id)).unwrap();
    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions.iter().map(|s| s.duration_secs).sum::<u64>(), 40);
    assert!(sessions.iter().all(|s| !s.completed));
    assert!(sessions.iter().all(|s| s.task_title == "Quarterly review"));

    let task = db.task(&task_id).unwrap().unwrap();
    assert_eq!(task.time_spent_secs, 40);

    let stats = db.stats_all().unwrap();
    assert_eq!(stats.total_sessions, 2);
    assert_eq!(stats.completed_sessions, 0);
    assert_eq!(stats.total_work_secs, 40);
}

#[tokio::test]
async fn completed_phase_is_recorded_as_completed() {
    let db = Arc::new(Database::open_memory().unwrap());
    let clock = ManualClock::default();
    let options = ControllerOptions {
        save_on_completion: true,
        ..ControllerOptions::default()
    };
    let controller = controller_on(db.clone(), &clock, options);
    controller.set_current_task(Some("t1".into()), Some("Deep work".into()));

    controller.start().unwrap();
    clock.advance_secs(90);
    controller.tick_now();
    assert_eq!(controller.pending_completed(), 1);

    let outcome = controller.stop_and_save().await.unwrap();
    assert_eq!(outcome.flushed_completed, 1);
    assert!(outcome.record.is_none());

    let sessions = db.sessions(None).unwrap();
    assert_eq!(sessions.len(), 1);
    assert!(sessions[0].completed);
    assert_eq!(sessions[0].duration_secs, 60);
    assert_eq!(db.task_time_spent("t1").unwrap(), 60);
    assert_eq!(db.stats_all().unwrap().completed_sessions, 1);
}
