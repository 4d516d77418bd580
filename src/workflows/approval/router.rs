use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;

use super::domain::{ActorId, ApprovalDecision, ApprovalError};
use super::repository::{ApprovalWorkflowRepository, DecisionNotifier, WorkflowStoreError};
use super::service::{ApprovalService, ApprovalServiceError};
use crate::workflows::evaluation::domain::TenderId;

/// Router builder exposing workflow initiation, decisions, and status reads.
pub fn approval_router<R, N>(service: Arc<ApprovalService<R, N>>) -> Router
where
    R: ApprovalWorkflowRepository + 'static,
    N: DecisionNotifier + 'static,
{
    Router::new()
        .route(
            "/api/v1/tenders/:tender_id/approval",
            post(initiate_handler::<R, N>).get(status_handler::<R, N>),
        )
        .route(
            "/api/v1/tenders/:tender_id/approval/levels/:level_index/decision",
            post(decide_handler::<R, N>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct InitiateRequest {
    pub(crate) approvers: Vec<String>,
    pub(crate) deadlines: Vec<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DecisionRequest {
    pub(crate) actor: String,
    pub(crate) decision: ApprovalDecision,
    #[serde(default)]
    pub(crate) comment: Option<String>,
}

pub(crate) async fn initiate_handler<R, N>(
    State(service): State<Arc<ApprovalService<R, N>>>,
    Path(tender_id): Path<String>,
    axum::Json(request): axum::Json<InitiateRequest>,
) -> Response
where
    R: ApprovalWorkflowRepository + 'static,
    N: DecisionNotifier + 'static,
{
    let tender_id = TenderId(tender_id);
    let approvers = request.approvers.into_iter().map(ActorId).collect();

    match service.initiate(&tender_id, approvers, request.deadlines) {
        Ok(workflow) => {
            let view = workflow.view(Utc::now());
            (StatusCode::CREATED, axum::Json(view)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn status_handler<R, N>(
    State(service): State<Arc<ApprovalService<R, N>>>,
    Path(tender_id): Path<String>,
) -> Response
where
    R: ApprovalWorkflowRepository + 'static,
    N: DecisionNotifier + 'static,
{
    match service.status(&TenderId(tender_id), Utc::now()) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn decide_handler<R, N>(
    State(service): State<Arc<ApprovalService<R, N>>>,
    Path((tender_id, level_index)): Path<(String, usize)>,
    axum::Json(request): axum::Json<DecisionRequest>,
) -> Response
where
    R: ApprovalWorkflowRepository + 'static,
    N: DecisionNotifier + 'static,
{
    let tender_id = TenderId(tender_id);
    let actor = ActorId(request.actor);

    match service.decide(
        &tender_id,
        level_index,
        &actor,
        request.decision,
        request.comment,
        Utc::now(),
    ) {
        Ok(workflow) => {
            let view = workflow.view(Utc::now());
            (StatusCode::OK, axum::Json(view)).into_response()
        }
        Err(error) => error_response(error),
    }
}

fn error_response(error: ApprovalServiceError) -> Response {
    let status = match &error {
        ApprovalServiceError::Approval(approval) => match approval {
            ApprovalError::EmptyApproverSequence
            | ApprovalError::DeadlineCountMismatch { .. }
            | ApprovalError::NonMonotonicDeadline { .. }
            | ApprovalError::UnknownLevel { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApprovalError::ActorMismatch { .. } => StatusCode::FORBIDDEN,
            ApprovalError::AlreadyInitiated { .. }
            | ApprovalError::LevelAlreadyDecided { .. }
            | ApprovalError::WorkflowClosed { .. }
            | ApprovalError::LevelNotActive { .. } => StatusCode::CONFLICT,
        },
        ApprovalServiceError::Store(store) => match store {
            WorkflowStoreError::NotFound(_) => StatusCode::NOT_FOUND,
            WorkflowStoreError::AlreadyExists(_) | WorkflowStoreError::RevisionConflict(_) => {
                StatusCode::CONFLICT
            }
            WorkflowStoreError::Unavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
        },
        ApprovalServiceError::Notification(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let payload = axum::Json(json!({ "error": error.to_string() }));
    (status, payload).into_response()
}
