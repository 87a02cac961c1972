//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `taskminder_core` linkage without a UI shell.
//! - Walk one task through create, complete and delete against an in-memory
//!   store and the local scheduler, printing the reminder state at each step.
//!
//! Set `TASKMINDER_LOG_DIR` to an absolute path to also write core logs.

use chrono::{Duration, Utc};
use log::info;
use std::error::Error;
use std::process::ExitCode;
use taskminder_core::db::open_db_in_memory;
use taskminder_core::{
    core_version, init_logging, LocalScheduler, LogLevel, SqlitePersistence, TaskService,
};

const LOG_DIR_ENV: &str = "TASKMINDER_LOG_DIR";

fn main() -> ExitCode {
    println!("taskminder_core version={}", core_version());

    if let Ok(log_dir) = std::env::var(LOG_DIR_ENV) {
        if let Err(err) = init_logging(LogLevel::build_default().as_str(), &log_dir) {
            eprintln!("logging disabled: {err}");
        }
    }

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("smoke run failed: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let conn = open_db_in_memory()?;
    let scheduler = LocalScheduler::new();
    let _subscription = scheduler.subscribe(|reminder| {
        println!(
            "reminder delivered task_id={} fire_at={}",
            reminder.content.task_id, reminder.fire_at
        );
    })?;

    let mut tasks = TaskService::new(SqlitePersistence::new(&conn), scheduler.clone());
    let report = tasks.sync_reminders()?;
    println!(
        "startup sync scheduled={} cleared={} removed={}",
        report.scheduled, report.cleared, report.removed
    );

    let due_at = Utc::now() + Duration::minutes(5);
    let created = tasks.create_task("Smoke check", "Created by taskminder_cli", due_at)?;
    println!(
        "created task_id={} reminder={:?}",
        created.id(),
        tasks.reminders().state(created.id())
    );

    let delivered = scheduler.fire_due(due_at)?;
    for reminder in &delivered {
        tasks
            .reminders_mut()
            .on_reminder_delivered(&reminder.content.task_id, &reminder.handle);
    }

    let completed = tasks.toggle_completion(&created)?;
    println!(
        "completed task_id={} reminder={:?}",
        completed.id(),
        tasks.reminders().state(completed.id())
    );

    tasks.delete_task(completed.id())?;
    println!(
        "deleted task_id={} remaining={}",
        completed.id(),
        tasks.list_tasks()?.len()
    );

    info!(
        "event=cli_smoke module=cli status=ok delivered={}",
        delivered.len()
    );
    Ok(())
}
