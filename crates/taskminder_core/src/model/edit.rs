//! Partial task updates and the edit-session value object.
//!
//! # Responsibility
//! - Describe which task fields a caller wants to change (`TaskEdit`).
//! - Decouple "what the user is typing" from "what is persisted"
//!   (`EditSession`).
//!
//! # Invariants
//! - A `TaskEdit` only carries fields that should be written.
//! - `EditSession::changes()` never includes fields equal to the snapshot.

use crate::model::task::{validate_description, validate_title, Task, TaskId, TaskValidationError};
use chrono::{DateTime, Utc};

/// Partial update for one task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskEdit {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_at: Option<DateTime<Utc>>,
    pub is_completed: Option<bool>,
}

impl TaskEdit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, value: impl Into<String>) -> Self {
        self.title = Some(value.into());
        self
    }

    pub fn description(mut self, value: impl Into<String>) -> Self {
        self.description = Some(value.into());
        self
    }

    pub fn due_at(mut self, value: DateTime<Utc>) -> Self {
        self.due_at = Some(value);
        self
    }

    pub fn completed(mut self, value: bool) -> Self {
        self.is_completed = Some(value);
        self
    }

    /// Returns true when no field would be written.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.due_at.is_none()
            && self.is_completed.is_none()
    }

    /// Rejects edits that would leave `title` or `description` blank.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        if let Some(description) = &self.description {
            validate_description(description)?;
        }
        Ok(())
    }
}

/// Draft state for editing one existing task.
///
/// Holds the snapshot the edit started from and the caller's draft values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    original: Task,
    pub title: String,
    pub description: String,
    pub due_at: DateTime<Utc>,
    pub is_completed: bool,
}

impl EditSession {
    /// Starts an edit session seeded from `task`.
    pub fn begin(task: &Task) -> Self {
        Self {
            original: task.clone(),
            title: task.title().to_string(),
            description: task.description().to_string(),
            due_at: task.due_at(),
            is_completed: task.is_completed(),
        }
    }

    pub fn task_id(&self) -> &TaskId {
        self.original.id()
    }

    pub fn original(&self) -> &Task {
        &self.original
    }

    /// Returns only the fields whose draft differs from the snapshot.
    pub fn changes(&self) -> TaskEdit {
        let original = &self.original;
        TaskEdit {
            title: (self.title != original.title()).then(|| self.title.clone()),
            description: (self.description != original.description())
                .then(|| self.description.clone()),
            due_at: (self.due_at != original.due_at()).then_some(self.due_at),
            is_completed: (self.is_completed != original.is_completed())
                .then_some(self.is_completed),
        }
    }

    pub fn is_dirty(&self) -> bool {
        !self.changes().is_empty()
    }
}
