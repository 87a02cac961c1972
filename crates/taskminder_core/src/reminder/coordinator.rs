//! Reminder lifecycle coordinator.
//!
//! # Responsibility
//! - Track, per task id, at most one pending reminder handle.
//! - Decide schedule/reschedule/cancel transitions from confirmed task
//!   mutations handed over by callers.
//!
//! # Invariants
//! - Any existing handle for an id is cancelled before a new one is
//!   requested, so repeated events never leave two live reminders.
//! - A reminder exists only while `due_at` is strictly after "now" and the
//!   task is not completed.
//! - The coordinator never talks to the persistence service.
//! - Scheduler failures are reported; they never touch task records.

use crate::clock::{Clock, SystemClock};
use crate::model::task::{Task, TaskId};
use crate::reminder::scheduler::{
    PermissionStatus, ReminderContent, ReminderHandle, ReminderScheduler, SchedulerError,
};
use log::{info, warn};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ReminderResult<T> = Result<T, ReminderError>;

/// Per-task reminder state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReminderState {
    None,
    Scheduled(ReminderHandle),
}

impl ReminderState {
    pub fn handle(&self) -> Option<&ReminderHandle> {
        match self {
            Self::None => None,
            Self::Scheduled(handle) => Some(handle),
        }
    }

    pub fn is_scheduled(&self) -> bool {
        matches!(self, Self::Scheduled(_))
    }
}

/// Reminder coordination failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReminderError {
    /// The user has not allowed notifications.
    PermissionDenied,
    /// The permission request itself failed.
    Permission(SchedulerError),
    /// Listing pending reminders failed.
    Inspect(SchedulerError),
    /// Requesting a new reminder failed; the task now has none.
    Schedule {
        task_id: TaskId,
        source: SchedulerError,
    },
    /// Cancelling an existing reminder failed; the old handle is still tracked.
    Cancel {
        task_id: TaskId,
        handle: ReminderHandle,
        source: SchedulerError,
    },
}

impl Display for ReminderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PermissionDenied => write!(f, "notification permission denied"),
            Self::Permission(err) => write!(f, "notification permission request failed: {err}"),
            Self::Inspect(err) => write!(f, "failed to list pending reminders: {err}"),
            Self::Schedule { task_id, source } => {
                write!(f, "failed to schedule reminder for task {task_id}: {source}")
            }
            Self::Cancel {
                task_id,
                handle,
                source,
            } => write!(
                f,
                "failed to cancel reminder {handle} for task {task_id}: {source}"
            ),
        }
    }
}

impl Error for ReminderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::PermissionDenied => None,
            Self::Permission(source)
            | Self::Inspect(source)
            | Self::Schedule { source, .. }
            | Self::Cancel { source, .. } => Some(source),
        }
    }
}

/// Outcome summary of `ReminderCoordinator::reconcile`.
#[derive(Debug, Default)]
pub struct ReconcileReport {
    /// Tasks that ended with a live reminder.
    pub scheduled: usize,
    /// Tasks that ended tracked with no reminder.
    pub cleared: usize,
    /// Tracked ids missing from the listing, now forgotten.
    pub removed: usize,
    pub failures: Vec<(TaskId, ReminderError)>,
}

impl ReconcileReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Owns the task-id to reminder mapping.
pub struct ReminderCoordinator<S, C = SystemClock> {
    scheduler: S,
    clock: C,
    states: BTreeMap<TaskId, ReminderState>,
    permission_granted: bool,
}

impl<S: ReminderScheduler> ReminderCoordinator<S, SystemClock> {
    pub fn new(scheduler: S) -> Self {
        Self::with_clock(scheduler, SystemClock)
    }
}

impl<S: ReminderScheduler, C: Clock> ReminderCoordinator<S, C> {
    pub fn with_clock(scheduler: S, clock: C) -> Self {
        Self {
            scheduler,
            clock,
            states: BTreeMap::new(),
            permission_granted: false,
        }
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Returns the tracked state for `id`; untracked ids report `None`.
    pub fn state(&self, id: &TaskId) -> ReminderState {
        self.states.get(id).cloned().unwrap_or(ReminderState::None)
    }

    pub fn is_tracked(&self, id: &TaskId) -> bool {
        self.states.contains_key(id)
    }

    pub fn tracked_len(&self) -> usize {
        self.states.len()
    }

    /// Number of ids currently holding a live handle.
    pub fn scheduled_len(&self) -> usize {
        self.states
            .values()
            .filter(|state| state.is_scheduled())
            .count()
    }

    /// Asks the scheduler for notification permission up front.
    ///
    /// `Granted` is cached; `Denied` is asked again on the next schedule.
    pub fn request_permission(&mut self) -> ReminderResult<PermissionStatus> {
        if self.permission_granted {
            return Ok(PermissionStatus::Granted);
        }
        let status = self
            .scheduler
            .request_permission()
            .map_err(ReminderError::Permission)?;
        self.permission_granted = status == PermissionStatus::Granted;
        info!(
            "event=reminder_permission module=reminder status=ok granted={}",
            self.permission_granted
        );
        Ok(status)
    }

    pub fn on_task_created(&mut self, task: &Task) -> ReminderResult<ReminderState> {
        self.evaluate(task)
    }

    pub fn on_task_updated(&mut self, task: &Task) -> ReminderResult<ReminderState> {
        self.evaluate(task)
    }

    pub fn on_task_completed_toggle(&mut self, task: &Task) -> ReminderResult<ReminderState> {
        self.evaluate(task)
    }

    /// Cancels any reminder for `id` and stops tracking it.
    ///
    /// The id ends untracked only when the scheduler accepts the cancel. On
    /// cancel failure the id stays tracked with its old handle so a later
    /// call can retry.
    pub fn on_task_deleted(&mut self, id: &TaskId) -> ReminderResult<()> {
        self.cancel_existing(id)?;
        self.states.remove(id);
        info!("event=reminder_forget module=reminder status=ok task_id={id}");
        Ok(())
    }

    /// Marks a delivered reminder as no longer pending.
    ///
    /// Ignored when `handle` is stale (the task was rescheduled since).
    pub fn on_reminder_delivered(&mut self, id: &TaskId, handle: &ReminderHandle) {
        if let Some(state) = self.states.get_mut(id) {
            if state.handle() == Some(handle) {
                *state = ReminderState::None;
                info!("event=reminder_delivered module=reminder status=ok task_id={id}");
            }
        }
    }

    /// Re-evaluates every listed task and forgets tracked ids not listed.
    ///
    /// Failures are collected per task; one failure does not stop the pass.
    pub fn reconcile(&mut self, tasks: &[Task]) -> ReconcileReport {
        let mut report = ReconcileReport::default();

        for task in tasks {
            match self.evaluate(task) {
                Ok(ReminderState::Scheduled(_)) => report.scheduled += 1,
                Ok(ReminderState::None) => report.cleared += 1,
                Err(err) => report.failures.push((task.id().clone(), err)),
            }
        }

        let stale: Vec<TaskId> = self
            .states
            .keys()
            .filter(|id| !tasks.iter().any(|task| task.id() == *id))
            .cloned()
            .collect();
        for id in stale {
            match self.on_task_deleted(&id) {
                Ok(()) => report.removed += 1,
                Err(err) => report.failures.push((id, err)),
            }
        }

        info!(
            "event=reminder_reconcile module=reminder status={} scheduled={} cleared={} removed={} failures={}",
            if report.is_clean() { "ok" } else { "partial" },
            report.scheduled,
            report.cleared,
            report.removed,
            report.failures.len()
        );
        report
    }

    /// Handles still pending at the scheduler.
    pub fn pending_handles(&self) -> ReminderResult<Vec<ReminderHandle>> {
        self.scheduler
            .list_pending()
            .map_err(ReminderError::Inspect)
    }

    fn evaluate(&mut self, task: &Task) -> ReminderResult<ReminderState> {
        let id = task.id();
        let now = self.clock.now();

        self.cancel_existing(id)?;

        if task.is_completed() || !task.is_due_after(now) {
            let reason = if task.is_completed() {
                "completed"
            } else {
                "not_future"
            };
            info!(
                "event=reminder_skip module=reminder status=skip task_id={id} reason={reason}"
            );
            self.states.insert(id.clone(), ReminderState::None);
            return Ok(ReminderState::None);
        }

        self.states.insert(id.clone(), ReminderState::None);
        match self.request_permission()? {
            PermissionStatus::Granted => {}
            PermissionStatus::Denied => {
                warn!(
                    "event=reminder_schedule module=reminder status=error task_id={id} error_code=permission_denied"
                );
                return Err(ReminderError::PermissionDenied);
            }
        }

        let content = ReminderContent::for_task(task);
        let handle = self
            .scheduler
            .schedule(&content, task.due_at())
            .map_err(|source| {
                warn!(
                    "event=reminder_schedule module=reminder status=error task_id={id} error={source}"
                );
                ReminderError::Schedule {
                    task_id: id.clone(),
                    source,
                }
            })?;

        info!("event=reminder_schedule module=reminder status=ok task_id={id} handle={handle}");
        let state = ReminderState::Scheduled(handle);
        self.states.insert(id.clone(), state.clone());
        Ok(state)
    }

    fn cancel_existing(&mut self, id: &TaskId) -> ReminderResult<()> {
        let Some(ReminderState::Scheduled(handle)) = self.states.get(id) else {
            return Ok(());
        };
        let handle = handle.clone();

        if let Err(source) = self.scheduler.cancel(&handle) {
            warn!(
                "event=reminder_cancel module=reminder status=error task_id={id} error={source}"
            );
            return Err(ReminderError::Cancel {
                task_id: id.clone(),
                handle,
                source,
            });
        }

        info!("event=reminder_cancel module=reminder status=ok task_id={id}");
        self.states.insert(id.clone(), ReminderState::None);
        Ok(())
    }
}
