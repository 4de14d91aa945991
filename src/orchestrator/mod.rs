//! Resumable deployment orchestration.
//!
//! - `runner`: the `Orchestrator` state machine and its terminal results
//! - `guard`: single-flight `RunGuard` keyed by campaign id
//! - `events`: `RunEvent` broadcast stream for step-level progress

pub mod events;
pub mod guard;
pub mod runner;

pub use events::{RunEvent, RunWarning};
pub use guard::{RunGuard, RunPermit};
pub use runner::{Orchestrator, RunFailure, RunSummary};
