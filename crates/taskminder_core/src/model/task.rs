//! Task domain model.
//!
//! # Responsibility
//! - Define the canonical `Task` record returned by the store client.
//! - Validate user-facing text fields before any store call.
//!
//! # Invariants
//! - `id` is assigned by the persistence service and never synthesized locally.
//! - `id` is immutable once a `Task` exists (no setter is exposed).
//! - `title` and `description` are non-empty after trimming.
//! - `due_at` may be in the past; it simply never produces a reminder.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Opaque task identifier assigned by the persistence service.
///
/// The hosted backend uses integer keys while other services may use text;
/// both are carried as their canonical string form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for TaskId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<i64> for TaskId {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Validation failures for task text fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    EmptyTitle,
    EmptyDescription,
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "title must not be empty"),
            Self::EmptyDescription => write!(f, "description must not be empty"),
        }
    }
}

impl Error for TaskValidationError {}

pub(crate) fn validate_title(value: &str) -> Result<(), TaskValidationError> {
    if value.trim().is_empty() {
        return Err(TaskValidationError::EmptyTitle);
    }
    Ok(())
}

pub(crate) fn validate_description(value: &str) -> Result<(), TaskValidationError> {
    if value.trim().is_empty() {
        return Err(TaskValidationError::EmptyDescription);
    }
    Ok(())
}

/// Canonical task record as confirmed by the persistence service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Task {
    id: TaskId,
    title: String,
    description: String,
    due_at: DateTime<Utc>,
    is_completed: bool,
}

impl Task {
    /// Builds a task from service-confirmed parts.
    ///
    /// # Errors
    /// - Returns `TaskValidationError` when `title` or `description` is blank.
    pub fn new(
        id: TaskId,
        title: impl Into<String>,
        description: impl Into<String>,
        due_at: DateTime<Utc>,
        is_completed: bool,
    ) -> Result<Self, TaskValidationError> {
        let title = title.into();
        let description = description.into();
        validate_title(&title)?;
        validate_description(&description)?;
        Ok(Self {
            id,
            title,
            description,
            due_at,
            is_completed,
        })
    }

    pub fn id(&self) -> &TaskId {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn due_at(&self) -> DateTime<Utc> {
        self.due_at
    }

    pub fn is_completed(&self) -> bool {
        self.is_completed
    }

    /// Returns whether the due instant lies strictly after `now`.
    pub fn is_due_after(&self, now: DateTime<Utc>) -> bool {
        self.due_at > now
    }
}

/// Input for creating a task before the service assigns an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub due_at: DateTime<Utc>,
}

impl NewTask {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        due_at: DateTime<Utc>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            due_at,
        }
    }

    /// Checks text invariants. Must run before any persistence call.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        validate_title(&self.title)?;
        validate_description(&self.description)
    }
}
