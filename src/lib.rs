//! Core services for tender management: bid evaluation (combined scoring,
//! comparable sheets, sensitivity analysis, award packs) and the sequential
//! multi-level award approval workflow.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
