//! Local reminder scheduling.
//!
//! # Responsibility
//! - Define the external scheduler contract (`scheduler`).
//! - Coordinate at most one reminder per task from lifecycle events
//!   (`coordinator`).
//! - Provide an in-process scheduler with explicit delivery subscriptions
//!   (`local`).

pub mod coordinator;
pub mod local;
pub mod scheduler;
