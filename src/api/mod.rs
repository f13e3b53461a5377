//! API Module
//!
//! Surface consumed by the presentation layer:
//! - commands.rs: start/stop/toggle and read-only state
//! - engine_status.rs: model and inference diagnostics

pub mod commands;
pub mod engine_status;
