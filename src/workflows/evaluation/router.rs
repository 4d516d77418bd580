use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{EvaluationError, TenderId};
use super::repository::{RepositoryError, TenderEvaluationRepository};
use super::service::{EvaluationService, EvaluationServiceError};

/// Router builder exposing the scoring, comparable sheet, sensitivity, and
/// award pack endpoints.
pub fn evaluation_router<R>(service: Arc<EvaluationService<R>>) -> Router
where
    R: TenderEvaluationRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/tenders/:tender_id/evaluation/scores",
            post(scores_handler::<R>),
        )
        .route(
            "/api/v1/tenders/:tender_id/evaluation/comparable-sheet",
            get(comparable_sheet_handler::<R>),
        )
        .route(
            "/api/v1/tenders/:tender_id/evaluation/comparable-sheet/csv",
            get(comparable_sheet_csv_handler::<R>),
        )
        .route(
            "/api/v1/tenders/:tender_id/evaluation/sensitivity",
            post(sensitivity_handler::<R>),
        )
        .route(
            "/api/v1/tenders/:tender_id/evaluation/award-pack",
            post(award_pack_handler::<R>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct SensitivityRequest {
    pub(crate) shifts: Vec<i16>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AwardPackRequest {
    pub(crate) rationale: String,
}

pub(crate) async fn scores_handler<R>(
    State(service): State<Arc<EvaluationService<R>>>,
    Path(tender_id): Path<String>,
) -> Response
where
    R: TenderEvaluationRepository + 'static,
{
    match service.compute_scores(&TenderId(tender_id)) {
        Ok(scores) => (StatusCode::OK, axum::Json(scores)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn comparable_sheet_handler<R>(
    State(service): State<Arc<EvaluationService<R>>>,
    Path(tender_id): Path<String>,
) -> Response
where
    R: TenderEvaluationRepository + 'static,
{
    match service.comparable_sheet(&TenderId(tender_id)) {
        Ok(rows) => (StatusCode::OK, axum::Json(rows)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn comparable_sheet_csv_handler<R>(
    State(service): State<Arc<EvaluationService<R>>>,
    Path(tender_id): Path<String>,
) -> Response
where
    R: TenderEvaluationRepository + 'static,
{
    match service.comparable_sheet_csv(&TenderId(tender_id)) {
        Ok(csv) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/csv")],
            csv,
        )
            .into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn sensitivity_handler<R>(
    State(service): State<Arc<EvaluationService<R>>>,
    Path(tender_id): Path<String>,
    axum::Json(request): axum::Json<SensitivityRequest>,
) -> Response
where
    R: TenderEvaluationRepository + 'static,
{
    match service.sensitivity(&TenderId(tender_id), &request.shifts) {
        Ok(scenarios) => (StatusCode::OK, axum::Json(scenarios)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn award_pack_handler<R>(
    State(service): State<Arc<EvaluationService<R>>>,
    Path(tender_id): Path<String>,
    axum::Json(request): axum::Json<AwardPackRequest>,
) -> Response
where
    R: TenderEvaluationRepository + 'static,
{
    match service.award_pack(&TenderId(tender_id), request.rationale) {
        Ok(pack) => (StatusCode::OK, axum::Json(pack)).into_response(),
        Err(error) => error_response(error),
    }
}

fn error_response(error: EvaluationServiceError) -> Response {
    let status = match &error {
        EvaluationServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        EvaluationServiceError::Evaluation(EvaluationError::AmbiguousTopRank { .. }) => {
            StatusCode::CONFLICT
        }
        EvaluationServiceError::Evaluation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        EvaluationServiceError::Repository(_) | EvaluationServiceError::Export(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    let payload = axum::Json(json!({ "error": error.to_string() }));
    (status, payload).into_response()
}
