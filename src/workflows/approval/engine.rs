use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{
    ActorId, ApprovalDecision, ApprovalError, ApprovalLevel, ApprovalStatus, ApprovalWorkflow,
    DecisionRecord,
};
use crate::workflows::evaluation::domain::TenderId;

/// Per-level slice of the workflow exposed to API consumers. The overdue
/// flag is derived at read time, never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApprovalLevelView {
    pub order: usize,
    pub approver: ActorId,
    pub deadline: DateTime<Utc>,
    pub overdue: bool,
    pub decision: Option<DecisionRecord>,
}

/// Full workflow snapshot for API responses.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApprovalWorkflowView {
    pub tender_id: TenderId,
    pub status: ApprovalStatus,
    pub status_label: &'static str,
    pub current_level_index: usize,
    pub revision: u64,
    pub levels: Vec<ApprovalLevelView>,
}

impl ApprovalWorkflow {
    /// Build a fresh workflow in `InProgress` with level zero pending.
    ///
    /// Deadlines must not decrease from level to level, since each level's
    /// wait compounds the waits before it.
    pub fn initiate(
        tender_id: TenderId,
        approvers: Vec<ActorId>,
        deadlines: Vec<DateTime<Utc>>,
    ) -> Result<Self, ApprovalError> {
        if approvers.is_empty() {
            return Err(ApprovalError::EmptyApproverSequence);
        }
        if approvers.len() != deadlines.len() {
            return Err(ApprovalError::DeadlineCountMismatch {
                approvers: approvers.len(),
                deadlines: deadlines.len(),
            });
        }
        for (level, pair) in deadlines.windows(2).enumerate() {
            if pair[1] < pair[0] {
                return Err(ApprovalError::NonMonotonicDeadline { level: level + 1 });
            }
        }

        let levels = approvers
            .into_iter()
            .zip(deadlines)
            .enumerate()
            .map(|(order, (approver, deadline))| ApprovalLevel {
                order,
                approver,
                deadline,
                decision: None,
            })
            .collect();

        Ok(Self {
            tender_id,
            levels,
            current_level_index: 0,
            status: ApprovalStatus::InProgress,
            revision: 1,
        })
    }

    /// Apply one approver's decision to the active level.
    ///
    /// A level that already carries a decision is reported as a conflict
    /// before any state check, so duplicate submissions surface as duplicates
    /// rather than as stale-state errors.
    pub fn decide(
        &mut self,
        level_index: usize,
        actor: &ActorId,
        decision: ApprovalDecision,
        comment: Option<String>,
        decided_at: DateTime<Utc>,
    ) -> Result<(), ApprovalError> {
        if level_index >= self.levels.len() {
            return Err(ApprovalError::UnknownLevel {
                tender: self.tender_id.clone(),
                level: level_index,
                levels: self.levels.len(),
            });
        }
        if self.levels[level_index].decision.is_some() {
            return Err(ApprovalError::LevelAlreadyDecided {
                tender: self.tender_id.clone(),
                level: level_index,
            });
        }
        if self.status.is_terminal() {
            return Err(ApprovalError::WorkflowClosed {
                tender: self.tender_id.clone(),
                status: self.status,
            });
        }
        if level_index != self.current_level_index {
            return Err(ApprovalError::LevelNotActive {
                tender: self.tender_id.clone(),
                level: level_index,
                current: self.current_level_index,
            });
        }

        let level = &mut self.levels[level_index];
        if &level.approver != actor {
            return Err(ApprovalError::ActorMismatch {
                tender: self.tender_id.clone(),
                level: level_index,
                actor: actor.clone(),
                expected: level.approver.clone(),
            });
        }

        level.decision = Some(DecisionRecord {
            decision,
            actor: actor.clone(),
            decided_at,
            comment,
        });

        match decision {
            ApprovalDecision::Approve => {
                if level_index + 1 == self.levels.len() {
                    self.status = ApprovalStatus::Completed;
                } else {
                    self.current_level_index += 1;
                }
            }
            ApprovalDecision::Reject => self.status = ApprovalStatus::Rejected,
            ApprovalDecision::ReturnForRevision => {
                self.status = ApprovalStatus::ReturnedForRevision;
            }
        }

        self.revision += 1;
        Ok(())
    }

    /// A level is overdue only while it is the pending level and `now` is
    /// strictly past its deadline. Deciding a level late clears the flag.
    pub fn is_overdue(&self, level_index: usize, now: DateTime<Utc>) -> bool {
        if self.status.is_terminal() || level_index != self.current_level_index {
            return false;
        }

        self.levels
            .get(level_index)
            .map(|level| now > level.deadline)
            .unwrap_or(false)
    }

    pub fn view(&self, now: DateTime<Utc>) -> ApprovalWorkflowView {
        let levels = self
            .levels
            .iter()
            .map(|level| ApprovalLevelView {
                order: level.order,
                approver: level.approver.clone(),
                deadline: level.deadline,
                overdue: self.is_overdue(level.order, now),
                decision: level.decision.clone(),
            })
            .collect();

        ApprovalWorkflowView {
            tender_id: self.tender_id.clone(),
            status: self.status,
            status_label: self.status.label(),
            current_level_index: self.current_level_index,
            revision: self.revision,
            levels,
        }
    }
}
