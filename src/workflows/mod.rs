//! Workflow modules powering the tender evaluation and award approval core.

pub mod approval;
pub mod evaluation;
