//! Ordered pipeline stages.
//!
//! Each stage returns a [`StageOutcome`](crate::diagnostic::StageOutcome)
//! and never aborts the run for tool-reported problems; only a stage
//! binary that cannot be spawned escapes as an error.

pub mod analyze;
pub mod build;
pub mod fmt;
