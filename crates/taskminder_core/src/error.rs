//! Caller-facing error taxonomy for task operations.
//!
//! # Invariants
//! - `InvalidInput` is raised before any network or scheduler call.
//! - `ReminderSchedulingFailed` never implies the store mutation was undone;
//!   it carries the confirmed task when there is one.
//! - Each kind maps to a distinct user message.

use crate::model::task::{Task, TaskId, TaskValidationError};
use crate::reminder::coordinator::ReminderError;
use crate::store::PersistenceError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type TaskResult<T> = Result<T, TaskError>;

#[derive(Debug)]
pub enum TaskError {
    /// Local validation failed; nothing was sent.
    InvalidInput(TaskValidationError),
    /// The target id does not exist at the persistence service.
    NotFound(TaskId),
    /// Transport or service-level failure. No retry was attempted.
    StoreUnavailable(PersistenceError),
    /// The store mutation succeeded but the reminder could not be updated.
    ReminderSchedulingFailed {
        task_id: TaskId,
        /// Service-confirmed task; `None` after a delete.
        confirmed: Option<Box<Task>>,
        source: ReminderError,
    },
}

impl TaskError {
    /// Stable machine-readable code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::NotFound(_) => "not_found",
            Self::StoreUnavailable(_) => "store_unavailable",
            Self::ReminderSchedulingFailed { .. } => "reminder_scheduling_failed",
        }
    }

    /// Human-readable message suitable for direct display.
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidInput(TaskValidationError::EmptyTitle) => {
                "Title is required.".to_string()
            }
            Self::InvalidInput(TaskValidationError::EmptyDescription) => {
                "Description is required.".to_string()
            }
            Self::NotFound(_) => "This task no longer exists.".to_string(),
            Self::StoreUnavailable(_) => {
                "Could not reach the task store. Please try again.".to_string()
            }
            Self::ReminderSchedulingFailed {
                source: ReminderError::PermissionDenied,
                ..
            } => "Task saved, but notifications are not allowed, so no reminder was set."
                .to_string(),
            Self::ReminderSchedulingFailed { .. } => {
                "Task saved, but its reminder could not be updated.".to_string()
            }
        }
    }

    /// The confirmed task behind a reminder failure, if any.
    pub fn confirmed_task(&self) -> Option<&Task> {
        match self {
            Self::ReminderSchedulingFailed { confirmed, .. } => confirmed.as_deref(),
            _ => None,
        }
    }

    pub(crate) fn reminder(task_id: TaskId, confirmed: Option<Task>, source: ReminderError) -> Self {
        Self::ReminderSchedulingFailed {
            task_id,
            confirmed: confirmed.map(Box::new),
            source,
        }
    }
}

impl Display for TaskError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput(err) => write!(f, "invalid input: {err}"),
            Self::NotFound(id) => write!(f, "task not found: {id}"),
            Self::StoreUnavailable(err) => write!(f, "task store unavailable: {err}"),
            Self::ReminderSchedulingFailed {
                task_id, source, ..
            } => write!(f, "reminder scheduling failed for task {task_id}: {source}"),
        }
    }
}

impl Error for TaskError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidInput(err) => Some(err),
            Self::NotFound(_) => None,
            Self::StoreUnavailable(err) => Some(err),
            Self::ReminderSchedulingFailed { source, .. } => Some(source),
        }
    }
}

impl From<TaskValidationError> for TaskError {
    fn from(value: TaskValidationError) -> Self {
        Self::InvalidInput(value)
    }
}

impl From<PersistenceError> for TaskError {
    fn from(value: PersistenceError) -> Self {
        Self::StoreUnavailable(value)
    }
}
