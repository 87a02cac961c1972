//! Task store client.
//!
//! # Responsibility
//! - Translate task intents into persistence-service calls.
//! - Normalize raw rows into canonical `Task` values.
//! - Surface `TaskError` kinds instead of transport error shapes.
//!
//! # Invariants
//! - Validation runs before any persistence call.
//! - Returned tasks always carry the service-assigned id.
//! - Exactly one attempt per call; no retries.
//! - The client knows nothing about reminders.

use crate::error::{TaskError, TaskResult};
use crate::model::edit::TaskEdit;
use crate::model::task::{NewTask, Task, TaskId};
use crate::store::{
    NewTaskRow, PersistenceError, PersistenceService, TaskRow, TaskRowPatch, TaskSelect,
};
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use log::{error, info, warn};
use std::time::Instant;

/// Canonical wire form for `due_date`: RFC 3339, UTC, microseconds.
pub fn encode_due_date(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Offset-less shapes returned for `timestamp without time zone` columns.
const NAIVE_DUE_DATE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parses an RFC 3339 timestamp into a UTC instant.
///
/// Timestamps without an offset are read as UTC.
pub fn decode_due_date(value: &str) -> Result<DateTime<Utc>, PersistenceError> {
    let trimmed = value.trim();
    let offset_err = match DateTime::parse_from_rfc3339(trimmed) {
        Ok(parsed) => return Ok(parsed.with_timezone(&Utc)),
        Err(err) => err,
    };

    NAIVE_DUE_DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| {
            PersistenceError::MalformedRecord(format!("invalid due_date `{value}`: {offset_err}"))
        })
}

fn row_to_task(row: TaskRow) -> Result<Task, PersistenceError> {
    let due_at = decode_due_date(&row.due_date)?;
    let id = row.id;
    Task::new(id.clone(), row.title, row.description, due_at, row.is_completed)
        .map_err(|err| PersistenceError::MalformedRecord(format!("task {id}: {err}")))
}

fn edit_to_patch(edit: &TaskEdit) -> TaskRowPatch {
    TaskRowPatch {
        title: edit.title.clone(),
        description: edit.description.clone(),
        due_date: edit.due_at.map(encode_due_date),
        is_completed: edit.is_completed,
    }
}

/// Client for the `tasks` collection over any `PersistenceService`.
pub struct TaskStoreClient<P> {
    service: P,
}

impl<P: PersistenceService> TaskStoreClient<P> {
    pub fn new(service: P) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &P {
        &self.service
    }

    /// Fetches all tasks ordered by `due_at` ascending.
    ///
    /// Ties keep the order the service returned them in.
    pub fn list_tasks(&self) -> TaskResult<Vec<Task>> {
        let started_at = Instant::now();
        let result = self
            .service
            .select(&TaskSelect::all())
            .and_then(|rows| {
                rows.into_iter()
                    .map(row_to_task)
                    .collect::<Result<Vec<_>, _>>()
            })
            .map(|mut tasks| {
                tasks.sort_by_key(Task::due_at);
                tasks
            })
            .map_err(TaskError::from);

        match &result {
            Ok(tasks) => info!(
                "event=task_list module=store status=ok count={} duration_ms={}",
                tasks.len(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => log_failure("task_list", None, started_at, err),
        }
        result
    }

    /// Fetches one task by id.
    pub fn get_task(&self, id: &TaskId) -> TaskResult<Task> {
        let rows = self.service.select(&TaskSelect::by_id(id))?;
        match rows.into_iter().next() {
            Some(row) => Ok(row_to_task(row)?),
            None => Err(TaskError::NotFound(id.clone())),
        }
    }

    /// Validates and inserts a new task; returns it with its assigned id.
    pub fn create_task(
        &self,
        title: impl Into<String>,
        description: impl Into<String>,
        due_at: DateTime<Utc>,
    ) -> TaskResult<Task> {
        self.create(&NewTask::new(title, description, due_at))
    }

    pub fn create(&self, draft: &NewTask) -> TaskResult<Task> {
        if let Err(err) = draft.validate() {
            warn!(
                "event=task_create module=store status=error error_code=invalid_input error={err}"
            );
            return Err(err.into());
        }

        let started_at = Instant::now();
        let row = NewTaskRow {
            title: draft.title.clone(),
            description: draft.description.clone(),
            due_date: encode_due_date(draft.due_at),
            is_completed: false,
        };
        let result = self
            .service
            .insert(&row)
            .and_then(row_to_task)
            .map_err(TaskError::from);

        match &result {
            Ok(task) => info!(
                "event=task_create module=store status=ok task_id={} duration_ms={}",
                task.id(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => log_failure("task_create", None, started_at, err),
        }
        result
    }

    /// Applies a partial update.
    ///
    /// An empty edit writes nothing and returns the current record.
    pub fn update_task(&self, id: &TaskId, edit: &TaskEdit) -> TaskResult<Task> {
        if let Err(err) = edit.validate() {
            warn!(
                "event=task_update module=store status=error task_id={id} error_code=invalid_input error={err}"
            );
            return Err(err.into());
        }

        let started_at = Instant::now();
        let result = if edit.is_empty() {
            self.get_task(id)
        } else {
            self.service
                .update(id, &edit_to_patch(edit))
                .map_err(TaskError::from)
                .and_then(|rows| match rows.into_iter().next() {
                    Some(row) => row_to_task(row).map_err(TaskError::from),
                    None => Err(TaskError::NotFound(id.clone())),
                })
        };

        match &result {
            Ok(_) => info!(
                "event=task_update module=store status=ok task_id={id} duration_ms={}",
                started_at.elapsed().as_millis()
            ),
            Err(err) => log_failure("task_update", Some(id), started_at, err),
        }
        result
    }

    /// Flips completion based on the caller's snapshot.
    pub fn toggle_completion(&self, snapshot: &Task) -> TaskResult<Task> {
        let edit = TaskEdit::new().completed(!snapshot.is_completed());
        self.update_task(snapshot.id(), &edit)
    }

    /// Ensures the task is absent. Deleting a missing id succeeds.
    pub fn delete_task(&self, id: &TaskId) -> TaskResult<()> {
        let started_at = Instant::now();
        let result = self.service.delete(id).map_err(TaskError::from);

        match &result {
            Ok(()) => info!(
                "event=task_delete module=store status=ok task_id={id} duration_ms={}",
                started_at.elapsed().as_millis()
            ),
            Err(err) => log_failure("task_delete", Some(id), started_at, err),
        }
        result
    }
}

fn log_failure(event: &str, id: Option<&TaskId>, started_at: Instant, err: &TaskError) {
    let task_id = id.map_or_else(|| "-".to_string(), TaskId::to_string);
    let duration_ms = started_at.elapsed().as_millis();
    match err {
        TaskError::NotFound(_) => warn!(
            "event={event} module=store status=error task_id={task_id} duration_ms={duration_ms} error_code={}",
            err.code()
        ),
        _ => error!(
            "event={event} module=store status=error task_id={task_id} duration_ms={duration_ms} error_code={} error={err}",
            err.code()
        ),
    }
}
