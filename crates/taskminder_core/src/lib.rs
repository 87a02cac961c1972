//! Core domain logic for TaskMinder.
//! This crate owns task lifecycle invariants and reminder coordination;
//! UI layers call into it and render what it returns.

pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod model;
pub mod reminder;
pub mod service;
pub mod store;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ConfigError, StoreConfig};
pub use error::{TaskError, TaskResult};
pub use logging::{init_logging, logging_status, LogLevel, LoggingError};
pub use model::edit::{EditSession, TaskEdit};
pub use model::task::{NewTask, Task, TaskId, TaskValidationError};
pub use model::views::{active_tasks, completed_tasks, TaskViews};
pub use reminder::coordinator::{
    ReconcileReport, ReminderCoordinator, ReminderError, ReminderResult, ReminderState,
};
pub use reminder::local::{DeliveredReminder, DeliverySubscription, LocalScheduler};
pub use reminder::scheduler::{
    PermissionStatus, ReminderContent, ReminderHandle, ReminderScheduler, SchedulerError,
    SchedulerResult,
};
pub use service::task_service::TaskService;
pub use store::client::TaskStoreClient;
pub use store::rest::RestPersistence;
pub use store::sqlite::SqlitePersistence;
pub use store::{
    NewTaskRow, PersistenceError, PersistenceResult, PersistenceService, TaskRow, TaskRowPatch,
    TaskSelect,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
