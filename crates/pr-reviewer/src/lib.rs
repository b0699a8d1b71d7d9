//! Reviewer assignment for team-based pull request review.
//!
//! The [`assignment`] module holds the engine that picks reviewers when a pull
//! request opens, swaps them on demand, and guards the OPEN → MERGED lifecycle.
//! Configuration, telemetry, and the process-level error type live alongside it
//! so the API service can stay a thin wiring layer.

pub mod assignment;
pub mod config;
pub mod error;
pub mod telemetry;
