//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate store mutations and reminder coordination into use-case
//!   level APIs.
//! - Keep UI callers decoupled from persistence and scheduler details.

pub mod task_service;
