use std::sync::Arc;

use axum::response::Response;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;

use crate::workflows::approval::domain::{ActorId, ApprovalWorkflow};
use crate::workflows::approval::repository::{
    ApprovalWorkflowRepository, InMemoryDecisionNotifier, InMemoryWorkflowRepository,
    NotificationError, WorkflowNotice, WorkflowStoreError,
};
use crate::workflows::approval::router::approval_router;
use crate::workflows::approval::service::ApprovalService;
use crate::workflows::evaluation::domain::TenderId;

pub(super) fn tender_id() -> TenderId {
    TenderId("tender-riverside-depot".to_string())
}

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn approvers() -> Vec<ActorId> {
    vec![
        ActorId("eng-manager".to_string()),
        ActorId("procurement-head".to_string()),
        ActorId("managing-director".to_string()),
    ]
}

/// Deadlines one, two, and three days out from the fixed clock.
pub(super) fn deadlines() -> Vec<DateTime<Utc>> {
    (1..=3).map(|days| now() + Duration::days(days)).collect()
}

pub(super) fn workflow() -> ApprovalWorkflow {
    ApprovalWorkflow::initiate(tender_id(), approvers(), deadlines())
        .expect("workflow initiates")
}

pub(super) fn build_service() -> (
    Arc<ApprovalService<InMemoryWorkflowRepository, InMemoryDecisionNotifier>>,
    Arc<InMemoryWorkflowRepository>,
    Arc<InMemoryDecisionNotifier>,
) {
    let repository = Arc::new(InMemoryWorkflowRepository::default());
    let notifier = Arc::new(InMemoryDecisionNotifier::default());
    let service = Arc::new(ApprovalService::new(repository.clone(), notifier.clone()));
    (service, repository, notifier)
}

pub(super) fn build_router() -> (
    axum::Router,
    Arc<InMemoryDecisionNotifier>,
) {
    let (service, _, notifier) = build_service();
    (approval_router(service), notifier)
}

pub(super) struct UnavailableStore;

impl ApprovalWorkflowRepository for UnavailableStore {
    fn create(&self, _workflow: ApprovalWorkflow) -> Result<(), WorkflowStoreError> {
        Err(WorkflowStoreError::Unavailable("database offline".to_string()))
    }

    fn fetch(
        &self,
        _tender_id: &TenderId,
    ) -> Result<Option<ApprovalWorkflow>, WorkflowStoreError> {
        Err(WorkflowStoreError::Unavailable("database offline".to_string()))
    }

    fn update(
        &self,
        _workflow: ApprovalWorkflow,
        _expected_revision: u64,
    ) -> Result<(), WorkflowStoreError> {
        Err(WorkflowStoreError::Unavailable("database offline".to_string()))
    }
}

pub(super) struct DeafNotifier;

impl crate::workflows::approval::repository::DecisionNotifier for DeafNotifier {
    fn publish(&self, _notice: WorkflowNotice) -> Result<(), NotificationError> {
        Err(NotificationError::Transport("smtp relay down".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
