use std::sync::Arc;

use axum::response::Response;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;

use crate::workflows::evaluation::domain::{
    BidLineItem, BidSubmission, BidderId, BoqItemId, CriterionId, EvaluationCriterion,
    EvaluationPlan, EvaluationWeights, ScorerId, TechnicalScoreEntry, TenderEvaluationSnapshot,
    TenderId,
};
use crate::workflows::evaluation::repository::{
    InMemoryTenderRepository, RepositoryError, TenderEvaluationRepository,
};
use crate::workflows::evaluation::router::evaluation_router;
use crate::workflows::evaluation::scoring::ScoringPolicy;
use crate::workflows::evaluation::service::EvaluationService;
use crate::workflows::evaluation::OutlierPolicy;

pub(super) fn opened_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 4, 9, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn tender_id() -> TenderId {
    TenderId("tender-riverside-depot".to_string())
}

/// Single-criterion 50/50 plan so commercial arithmetic stays easy to read.
pub(super) fn plan() -> EvaluationPlan {
    EvaluationPlan {
        weights: EvaluationWeights {
            technical_percent: 50,
            commercial_percent: 50,
        },
        criteria: vec![EvaluationCriterion {
            id: CriterionId("crit-quality".to_string()),
            name: "Overall technical quality".to_string(),
            weight_percent: 100,
            max_raw_score: 100,
            description: "Committee quality assessment".to_string(),
        }],
    }
}

/// Bid quoting one unit of the single works item at `price_cents`.
pub(super) fn bid(bidder: &str, price_cents: u64, submitted_days_ago: i64) -> BidSubmission {
    BidSubmission {
        bidder_id: BidderId(bidder.to_string()),
        submitted_at: opened_at() - Duration::days(submitted_days_ago),
        disqualified: false,
        line_items: vec![BidLineItem {
            boq_item_id: BoqItemId("boq-works".to_string()),
            unit_price_cents: price_cents,
            quantity: 1,
        }],
    }
}

pub(super) fn score_entry(
    bidder: &str,
    criterion: &str,
    scorer: &str,
    raw: u16,
) -> TechnicalScoreEntry {
    TechnicalScoreEntry {
        bidder_id: BidderId(bidder.to_string()),
        criterion_id: CriterionId(criterion.to_string()),
        scorer_id: ScorerId(scorer.to_string()),
        raw_score: raw,
    }
}

/// The two-bidder field from the evaluation manual's worked example: alpha
/// offers the lower price, beta the stronger technical proposal.
pub(super) fn snapshot() -> TenderEvaluationSnapshot {
    TenderEvaluationSnapshot {
        tender_id: tender_id(),
        plan: plan(),
        bids: vec![bid("alpha-corp", 100_00, 3), bid("beta-group", 120_00, 2)],
        technical_scores: vec![
            score_entry("alpha-corp", "crit-quality", "scorer-1", 80),
            score_entry("beta-group", "crit-quality", "scorer-1", 90),
        ],
    }
}

pub(super) fn build_service(
    snapshot: TenderEvaluationSnapshot,
) -> Arc<EvaluationService<InMemoryTenderRepository>> {
    let repository = Arc::new(InMemoryTenderRepository::default());
    repository.seed(snapshot).expect("seed snapshot");
    Arc::new(EvaluationService::new(
        repository,
        ScoringPolicy::default(),
        OutlierPolicy::default(),
    ))
}

pub(super) fn build_router(snapshot: TenderEvaluationSnapshot) -> axum::Router {
    evaluation_router(build_service(snapshot))
}

pub(super) struct UnavailableRepository;

impl TenderEvaluationRepository for UnavailableRepository {
    fn fetch(
        &self,
        _id: &TenderId,
    ) -> Result<Option<TenderEvaluationSnapshot>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) async fn read_text_body(response: Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    String::from_utf8(body.to_vec()).expect("utf8 body")
}
