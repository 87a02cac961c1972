//! Persistence service contract and task store client.
//!
//! # Responsibility
//! - Define the record-oriented `select`/`insert`/`update`/`delete` contract
//!   against the `tasks` collection.
//! - Provide SQLite and hosted REST implementations of that contract.
//! - Normalize raw rows into canonical `Task` values (`client`).
//!
//! # Invariants
//! - Row ids always come from the service; callers never invent them.
//! - `update` returns an empty row set when the target id does not exist.
//! - `delete` succeeds whether or not the target id exists.

use crate::db::DbError;
use crate::model::task::TaskId;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod client;
pub mod rest;
pub mod sqlite;

pub const TASKS_COLLECTION: &str = "tasks";

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Raw task record as stored by the persistence service.
///
/// `due_date` stays in wire form (RFC 3339 text); parsing happens in the
/// store client so every backend is normalized the same way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRow {
    pub id: TaskId,
    pub title: String,
    pub description: String,
    pub due_date: String,
    pub is_completed: bool,
}

/// Insert payload; the service assigns `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewTaskRow {
    pub title: String,
    pub description: String,
    pub due_date: String,
    pub is_completed: bool,
}

/// Column-level patch for `update`. `None` columns are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskRowPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_completed: Option<bool>,
}

impl TaskRowPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.due_date.is_none()
            && self.is_completed.is_none()
    }
}

/// Row filter for `select`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskSelect {
    /// Restrict to one id.
    pub id: Option<TaskId>,
}

impl TaskSelect {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_id(id: &TaskId) -> Self {
        Self {
            id: Some(id.clone()),
        }
    }
}

/// Transport/service-level failure from a persistence backend.
#[derive(Debug)]
pub enum PersistenceError {
    Db(DbError),
    /// Request never produced an HTTP response (DNS, TLS, timeout...).
    Transport(reqwest::Error),
    /// Service answered with a non-success status.
    Service { status: u16, message: String },
    /// Service answered but a record could not be decoded.
    MalformedRecord(String),
}

impl Display for PersistenceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Transport(err) => write!(f, "transport error: {err}"),
            Self::Service { status, message } => {
                write!(f, "service returned status {status}: {message}")
            }
            Self::MalformedRecord(message) => write!(f, "malformed task record: {message}"),
        }
    }
}

impl Error for PersistenceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Transport(err) => Some(err),
            Self::Service { .. } | Self::MalformedRecord(_) => None,
        }
    }
}

impl From<DbError> for PersistenceError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for PersistenceError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<reqwest::Error> for PersistenceError {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport(value)
    }
}

/// Record-oriented persistence contract for the `tasks` collection.
///
/// Each call is a single request/response; no cross-call transactions.
pub trait PersistenceService {
    /// Returns matching rows ordered by `due_date` ascending, then arrival.
    fn select(&self, query: &TaskSelect) -> PersistenceResult<Vec<TaskRow>>;
    /// Inserts one row and returns it as stored, including the assigned id.
    fn insert(&self, row: &NewTaskRow) -> PersistenceResult<TaskRow>;
    /// Applies `patch` to `id`; returns updated rows (empty when absent).
    fn update(&self, id: &TaskId, patch: &TaskRowPatch) -> PersistenceResult<Vec<TaskRow>>;
    /// Ensures `id` is absent.
    fn delete(&self, id: &TaskId) -> PersistenceResult<()>;
}

impl<P: PersistenceService + ?Sized> PersistenceService for &P {
    fn select(&self, query: &TaskSelect) -> PersistenceResult<Vec<TaskRow>> {
        (**self).select(query)
    }

    fn insert(&self, row: &NewTaskRow) -> PersistenceResult<TaskRow> {
        (**self).insert(row)
    }

    fn update(&self, id: &TaskId, patch: &TaskRowPatch) -> PersistenceResult<Vec<TaskRow>> {
        (**self).update(id, patch)
    }

    fn delete(&self, id: &TaskId) -> PersistenceResult<()> {
        (**self).delete(id)
    }
}
