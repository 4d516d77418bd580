use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use super::domain::ApprovalWorkflow;
use crate::workflows::evaluation::domain::TenderId;

/// Storage abstraction for approval workflow records. The engine's
/// transitions must be reproducible from a freshly-loaded record, so the
/// trait deals in whole workflows plus the revision the caller read.
pub trait ApprovalWorkflowRepository: Send + Sync {
    fn create(&self, workflow: ApprovalWorkflow) -> Result<(), WorkflowStoreError>;
    fn fetch(&self, tender_id: &TenderId) -> Result<Option<ApprovalWorkflow>, WorkflowStoreError>;
    /// Persist a transitioned workflow. Fails when the stored revision no
    /// longer matches `expected_revision`, which makes the loser of two
    /// near-simultaneous decisions observe a conflict instead of a
    /// double-advance.
    fn update(
        &self,
        workflow: ApprovalWorkflow,
        expected_revision: u64,
    ) -> Result<(), WorkflowStoreError>;
}

/// Error enumeration for workflow store failures.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowStoreError {
    #[error("an approval workflow already exists for tender {0}")]
    AlreadyExists(String),
    #[error("no approval workflow found for tender {0}")]
    NotFound(String),
    #[error("approval workflow for tender {0} was updated concurrently")]
    RevisionConflict(String),
    #[error("workflow store unavailable: {0}")]
    Unavailable(String),
}

/// Trait describing outbound notification hooks for terminal workflow
/// outcomes; delivery itself is an external collaborator.
pub trait DecisionNotifier: Send + Sync {
    fn publish(&self, notice: WorkflowNotice) -> Result<(), NotificationError>;
}

/// Simple notice payload so routes/tests can assert integration boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowNotice {
    pub template: String,
    pub tender_id: TenderId,
    pub details: BTreeMap<String, String>,
}

/// Notice dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}

/// In-memory workflow store backing the binary and the test suites.
#[derive(Default, Clone)]
pub struct InMemoryWorkflowRepository {
    records: Arc<Mutex<HashMap<TenderId, ApprovalWorkflow>>>,
}

impl ApprovalWorkflowRepository for InMemoryWorkflowRepository {
    fn create(&self, workflow: ApprovalWorkflow) -> Result<(), WorkflowStoreError> {
        let mut guard = self.records.lock().expect("workflow store mutex poisoned");
        if guard.contains_key(&workflow.tender_id) {
            return Err(WorkflowStoreError::AlreadyExists(workflow.tender_id.0.clone()));
        }
        guard.insert(workflow.tender_id.clone(), workflow);
        Ok(())
    }

    fn fetch(&self, tender_id: &TenderId) -> Result<Option<ApprovalWorkflow>, WorkflowStoreError> {
        let guard = self.records.lock().expect("workflow store mutex poisoned");
        Ok(guard.get(tender_id).cloned())
    }

    fn update(
        &self,
        workflow: ApprovalWorkflow,
        expected_revision: u64,
    ) -> Result<(), WorkflowStoreError> {
        let mut guard = self.records.lock().expect("workflow store mutex poisoned");
        let stored = guard
            .get(&workflow.tender_id)
            .ok_or_else(|| WorkflowStoreError::NotFound(workflow.tender_id.0.clone()))?;

        if stored.revision != expected_revision {
            return Err(WorkflowStoreError::RevisionConflict(
                workflow.tender_id.0.clone(),
            ));
        }

        guard.insert(workflow.tender_id.clone(), workflow);
        Ok(())
    }
}

/// In-memory notifier capturing published notices for assertions.
#[derive(Default, Clone)]
pub struct InMemoryDecisionNotifier {
    events: Arc<Mutex<Vec<WorkflowNotice>>>,
}

impl InMemoryDecisionNotifier {
    pub fn events(&self) -> Vec<WorkflowNotice> {
        self.events.lock().expect("notifier mutex poisoned").clone()
    }
}

impl DecisionNotifier for InMemoryDecisionNotifier {
    fn publish(&self, notice: WorkflowNotice) -> Result<(), NotificationError> {
        self.events
            .lock()
            .expect("notifier mutex poisoned")
            .push(notice);
        Ok(())
    }
}
