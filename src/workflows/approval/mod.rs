//! Sequential multi-level award approval workflow: initiation, decisions,
//! deadline tracking, and terminal outcome notification.

pub mod domain;
pub mod engine;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    ActorId, ApprovalDecision, ApprovalError, ApprovalLevel, ApprovalStatus, ApprovalWorkflow,
    DecisionRecord,
};
pub use engine::{ApprovalLevelView, ApprovalWorkflowView};
pub use repository::{
    ApprovalWorkflowRepository, DecisionNotifier, InMemoryDecisionNotifier,
    InMemoryWorkflowRepository, NotificationError, WorkflowNotice, WorkflowStoreError,
};
pub use router::approval_router;
pub use service::{ApprovalService, ApprovalServiceError};
