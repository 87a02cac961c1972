//! Task domain model.
//!
//! # Responsibility
//! - Define canonical data structures used by the store client and the
//!   reminder coordinator.
//! - Keep user input (`NewTask`, `TaskEdit`, `EditSession`) separate from
//!   service-confirmed records (`Task`).
//!
//! # Invariants
//! - Every `Task` carries a service-assigned `TaskId`.
//! - Task text fields are validated before any persistence call.

pub mod edit;
pub mod task;
pub mod views;
