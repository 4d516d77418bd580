use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::evaluation::domain::TenderId;

/// Identifier wrapper for the people acting on approval levels.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorId(pub String);

/// Verdict an approver can record on their level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalDecision {
    Approve,
    Reject,
    ReturnForRevision,
}

impl ApprovalDecision {
    pub const fn label(self) -> &'static str {
        match self {
            ApprovalDecision::Approve => "approve",
            ApprovalDecision::Reject => "reject",
            ApprovalDecision::ReturnForRevision => "return_for_revision",
        }
    }
}

/// Lifecycle of one approval workflow instance. The pending level is carried
/// by `current_level_index`, so `InProgress` plus that index is the full
/// pending state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    InProgress,
    Completed,
    Rejected,
    ReturnedForRevision,
}

impl ApprovalStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApprovalStatus::InProgress => "in_progress",
            ApprovalStatus::Completed => "completed",
            ApprovalStatus::Rejected => "rejected",
            ApprovalStatus::ReturnedForRevision => "returned_for_revision",
        }
    }

    pub const fn is_terminal(self) -> bool {
        !matches!(self, ApprovalStatus::InProgress)
    }
}

/// The recorded outcome of a decided level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub decision: ApprovalDecision,
    pub actor: ActorId,
    pub decided_at: DateTime<Utc>,
    pub comment: Option<String>,
}

/// One stage in the sequential approval chain. `order` values are contiguous
/// starting at zero and are the authority for sequencing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalLevel {
    pub order: usize,
    pub approver: ActorId,
    pub deadline: DateTime<Utc>,
    pub decision: Option<DecisionRecord>,
}

/// Single source of truth for a tender's approval state. Mutated only through
/// the transition operations; `revision` backs the optimistic-concurrency
/// check on every store update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalWorkflow {
    pub tender_id: TenderId,
    pub levels: Vec<ApprovalLevel>,
    pub current_level_index: usize,
    pub status: ApprovalStatus,
    pub revision: u64,
}

/// Transition and validation failures raised by the approval workflow.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApprovalError {
    #[error("approver sequence is empty")]
    EmptyApproverSequence,
    #[error("{approvers} approvers were given {deadlines} deadlines")]
    DeadlineCountMismatch { approvers: usize, deadlines: usize },
    #[error("deadline for level {level} precedes the deadline of the level before it")]
    NonMonotonicDeadline { level: usize },
    #[error("workflow for tender {} is already initiated", .tender.0)]
    AlreadyInitiated { tender: TenderId },
    #[error(
        "tender {} has no approval level {}; the chain has {} levels",
        .tender.0,
        .level,
        .levels
    )]
    UnknownLevel {
        tender: TenderId,
        level: usize,
        levels: usize,
    },
    #[error("level {} of tender {} already has a recorded decision", .level, .tender.0)]
    LevelAlreadyDecided { tender: TenderId, level: usize },
    #[error("workflow for tender {} is closed with status {}", .tender.0, .status.label())]
    WorkflowClosed {
        tender: TenderId,
        status: ApprovalStatus,
    },
    #[error(
        "level {} of tender {} is not the active level; level {} is pending",
        .level,
        .tender.0,
        .current
    )]
    LevelNotActive {
        tender: TenderId,
        level: usize,
        current: usize,
    },
    #[error(
        "actor {} is not the approver for level {level} of tender {}; expected {}",
        .actor.0,
        .tender.0,
        .expected.0
    )]
    ActorMismatch {
        tender: TenderId,
        level: usize,
        actor: ActorId,
        expected: ActorId,
    },
}
