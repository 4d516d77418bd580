use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use super::domain::{ActorId, ApprovalDecision, ApprovalError, ApprovalStatus, ApprovalWorkflow};
use super::engine::ApprovalWorkflowView;
use super::repository::{
    ApprovalWorkflowRepository, DecisionNotifier, NotificationError, WorkflowNotice,
    WorkflowStoreError,
};
use crate::workflows::evaluation::domain::TenderId;

/// Service composing the workflow store and the decision notifier around the
/// approval state machine.
pub struct ApprovalService<R, N> {
    repository: Arc<R>,
    notifier: Arc<N>,
}

impl<R, N> ApprovalService<R, N>
where
    R: ApprovalWorkflowRepository + 'static,
    N: DecisionNotifier + 'static,
{
    pub fn new(repository: Arc<R>, notifier: Arc<N>) -> Self {
        Self {
            repository,
            notifier,
        }
    }

    /// Create the approval chain for a tender. A tender can only carry one
    /// workflow instance at a time; after a return-for-revision a fresh
    /// instance is initiated, never resumed.
    pub fn initiate(
        &self,
        tender_id: &TenderId,
        approvers: Vec<ActorId>,
        deadlines: Vec<DateTime<Utc>>,
    ) -> Result<ApprovalWorkflow, ApprovalServiceError> {
        let workflow = ApprovalWorkflow::initiate(tender_id.clone(), approvers, deadlines)?;

        self.repository
            .create(workflow.clone())
            .map_err(|error| match error {
                WorkflowStoreError::AlreadyExists(_) => {
                    ApprovalServiceError::Approval(ApprovalError::AlreadyInitiated {
                        tender: tender_id.clone(),
                    })
                }
                other => ApprovalServiceError::Store(other),
            })?;

        info!(
            tender = %tender_id.0,
            levels = workflow.levels.len(),
            "approval workflow initiated"
        );
        Ok(workflow)
    }

    /// Apply a decision to the active level and persist the transition under
    /// the revision read at fetch time.
    pub fn decide(
        &self,
        tender_id: &TenderId,
        level_index: usize,
        actor: &ActorId,
        decision: ApprovalDecision,
        comment: Option<String>,
        decided_at: DateTime<Utc>,
    ) -> Result<ApprovalWorkflow, ApprovalServiceError> {
        let mut workflow = self.fetch(tender_id)?;
        let expected_revision = workflow.revision;

        workflow.decide(level_index, actor, decision, comment, decided_at)?;
        self.repository.update(workflow.clone(), expected_revision)?;

        info!(
            tender = %tender_id.0,
            level = level_index,
            actor = %actor.0,
            decision = decision.label(),
            status = workflow.status.label(),
            "approval decision recorded"
        );

        if workflow.status.is_terminal() {
            self.publish_outcome(&workflow, level_index, actor)?;
        }

        Ok(workflow)
    }

    /// Read the workflow with per-level overdue flags derived at `now`.
    pub fn status(
        &self,
        tender_id: &TenderId,
        now: DateTime<Utc>,
    ) -> Result<ApprovalWorkflowView, ApprovalServiceError> {
        let workflow = self.fetch(tender_id)?;
        Ok(workflow.view(now))
    }

    fn fetch(&self, tender_id: &TenderId) -> Result<ApprovalWorkflow, ApprovalServiceError> {
        let workflow = self
            .repository
            .fetch(tender_id)?
            .ok_or_else(|| WorkflowStoreError::NotFound(tender_id.0.clone()))?;
        Ok(workflow)
    }

    fn publish_outcome(
        &self,
        workflow: &ApprovalWorkflow,
        level_index: usize,
        actor: &ActorId,
    ) -> Result<(), ApprovalServiceError> {
        let template = match workflow.status {
            ApprovalStatus::Completed => "award_approved",
            ApprovalStatus::Rejected => "award_rejected",
            ApprovalStatus::ReturnedForRevision => "award_returned_for_revision",
            ApprovalStatus::InProgress => return Ok(()),
        };

        let mut details = BTreeMap::new();
        details.insert("level".to_string(), level_index.to_string());
        details.insert("actor".to_string(), actor.0.clone());

        self.notifier.publish(WorkflowNotice {
            template: template.to_string(),
            tender_id: workflow.tender_id.clone(),
            details,
        })?;

        Ok(())
    }
}

/// Error raised by the approval service.
#[derive(Debug, thiserror::Error)]
pub enum ApprovalServiceError {
    #[error(transparent)]
    Approval(#[from] ApprovalError),
    #[error(transparent)]
    Store(#[from] WorkflowStoreError),
    #[error(transparent)]
    Notification(#[from] NotificationError),
}
