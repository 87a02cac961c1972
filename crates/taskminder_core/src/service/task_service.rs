//! Task use-case service.
//!
//! # Responsibility
//! - Expose the task operations UI callers use.
//! - Hand every confirmed store mutation to the reminder coordinator.
//!
//! # Invariants
//! - The coordinator only sees tasks the store has confirmed.
//! - A reminder failure is reported as `ReminderSchedulingFailed` carrying
//!   the confirmed task; the store mutation is never rolled back.
//! - Failed store calls never reach the coordinator.

use crate::clock::{Clock, SystemClock};
use crate::error::{TaskError, TaskResult};
use crate::model::edit::{EditSession, TaskEdit};
use crate::model::task::{Task, TaskId};
use crate::model::views::TaskViews;
use crate::reminder::coordinator::{
    ReconcileReport, ReminderCoordinator, ReminderResult, ReminderState,
};
use crate::reminder::scheduler::ReminderScheduler;
use crate::store::client::TaskStoreClient;
use crate::store::PersistenceService;
use chrono::{DateTime, Utc};
use log::warn;

/// Store client plus reminder coordinator, wired in mutation order.
pub struct TaskService<P, S, C = SystemClock> {
    store: TaskStoreClient<P>,
    reminders: ReminderCoordinator<S, C>,
}

impl<P: PersistenceService, S: ReminderScheduler> TaskService<P, S, SystemClock> {
    pub fn new(service: P, scheduler: S) -> Self {
        Self::from_parts(
            TaskStoreClient::new(service),
            ReminderCoordinator::new(scheduler),
        )
    }
}

impl<P: PersistenceService, S: ReminderScheduler, C: Clock> TaskService<P, S, C> {
    pub fn from_parts(store: TaskStoreClient<P>, reminders: ReminderCoordinator<S, C>) -> Self {
        Self { store, reminders }
    }

    pub fn store(&self) -> &TaskStoreClient<P> {
        &self.store
    }

    pub fn reminders(&self) -> &ReminderCoordinator<S, C> {
        &self.reminders
    }

    pub fn reminders_mut(&mut self) -> &mut ReminderCoordinator<S, C> {
        &mut self.reminders
    }

    pub fn list_tasks(&self) -> TaskResult<Vec<Task>> {
        self.store.list_tasks()
    }

    /// Active/completed projections of one fresh listing.
    pub fn list_views(&self) -> TaskResult<TaskViews> {
        self.store.list_tasks().map(TaskViews::partition)
    }

    pub fn create_task(
        &mut self,
        title: impl Into<String>,
        description: impl Into<String>,
        due_at: DateTime<Utc>,
    ) -> TaskResult<Task> {
        let task = self.store.create_task(title, description, due_at)?;
        let outcome = self.reminders.on_task_created(&task);
        confirm(task, outcome)
    }

    pub fn update_task(&mut self, id: &TaskId, edit: &TaskEdit) -> TaskResult<Task> {
        let task = self.store.update_task(id, edit)?;
        let outcome = self.reminders.on_task_updated(&task);
        confirm(task, outcome)
    }

    /// Persists the changed fields of an edit session.
    pub fn save_edit(&mut self, session: &EditSession) -> TaskResult<Task> {
        self.update_task(session.task_id(), &session.changes())
    }

    pub fn toggle_completion(&mut self, snapshot: &Task) -> TaskResult<Task> {
        let task = self.store.toggle_completion(snapshot)?;
        let outcome = self.reminders.on_task_completed_toggle(&task);
        confirm(task, outcome)
    }

    pub fn delete_task(&mut self, id: &TaskId) -> TaskResult<()> {
        self.store.delete_task(id)?;
        self.reminders.on_task_deleted(id).map_err(|source| {
            warn!(
                "event=task_delete module=service status=error task_id={id} error_code=reminder_scheduling_failed error={source}"
            );
            TaskError::reminder(id.clone(), None, source)
        })
    }

    /// Lists tasks and reconciles reminders against the listing.
    ///
    /// Per-task reminder failures are reported inside the returned report.
    pub fn sync_reminders(&mut self) -> TaskResult<ReconcileReport> {
        let tasks = self.store.list_tasks()?;
        Ok(self.reminders.reconcile(&tasks))
    }
}

fn confirm(task: Task, outcome: ReminderResult<ReminderState>) -> TaskResult<Task> {
    match outcome {
        Ok(_) => Ok(task),
        Err(source) => {
            warn!(
                "event=task_reminder module=service status=error task_id={} error_code=reminder_scheduling_failed error={source}",
                task.id()
            );
            Err(TaskError::reminder(task.id().clone(), Some(task), source))
        }
    }
}
