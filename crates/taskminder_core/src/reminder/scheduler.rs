//! External reminder scheduler contract.
//!
//! # Responsibility
//! - Describe the platform facility that fires a notification at an instant.
//! - Define the opaque `ReminderHandle` used to cancel a pending reminder.
//!
//! # Invariants
//! - Handles are only meaningful to the scheduler that issued them.
//! - Implementations must not deduplicate on behalf of callers; the
//!   coordinator owns the at-most-one-per-task rule.

use crate::model::task::{Task, TaskId};
use chrono::{DateTime, Utc};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type SchedulerResult<T> = Result<T, SchedulerError>;

/// Opaque token identifying one pending reminder.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReminderHandle(String);

impl ReminderHandle {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ReminderHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Notification payload shown to the user on delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderContent {
    pub task_id: TaskId,
    pub title: String,
    pub body: String,
}

impl ReminderContent {
    pub fn for_task(task: &Task) -> Self {
        Self {
            task_id: task.id().clone(),
            title: task.title().to_string(),
            body: task.description().to_string(),
        }
    }
}

/// Result of a notification permission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
}

/// Failure reported by an external scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    /// The scheduler refused the request (bad fire time, quota...).
    Rejected(String),
    /// The scheduler could not be reached or is in a broken state.
    Unavailable(String),
}

impl Display for SchedulerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rejected(message) => write!(f, "scheduler rejected request: {message}"),
            Self::Unavailable(message) => write!(f, "scheduler unavailable: {message}"),
        }
    }
}

impl Error for SchedulerError {}

/// Platform scheduler that fires a callback at a wall-clock instant.
pub trait ReminderScheduler {
    fn request_permission(&self) -> SchedulerResult<PermissionStatus>;
    fn schedule(
        &self,
        content: &ReminderContent,
        fire_at: DateTime<Utc>,
    ) -> SchedulerResult<ReminderHandle>;
    /// Cancels a pending reminder. Unknown handles are not an error.
    fn cancel(&self, handle: &ReminderHandle) -> SchedulerResult<()>;
    /// Lists handles still pending. Observability only.
    fn list_pending(&self) -> SchedulerResult<Vec<ReminderHandle>>;
}

impl<S: ReminderScheduler + ?Sized> ReminderScheduler for &S {
    fn request_permission(&self) -> SchedulerResult<PermissionStatus> {
        (**self).request_permission()
    }

    fn schedule(
        &self,
        content: &ReminderContent,
        fire_at: DateTime<Utc>,
    ) -> SchedulerResult<ReminderHandle> {
        (**self).schedule(content, fire_at)
    }

    fn cancel(&self, handle: &ReminderHandle) -> SchedulerResult<()> {
        (**self).cancel(handle)
    }

    fn list_pending(&self) -> SchedulerResult<Vec<ReminderHandle>> {
        (**self).list_pending()
    }
}
