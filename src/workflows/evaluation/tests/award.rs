use super::common::*;
use crate::workflows::evaluation::award::AwardPackAssembler;
use crate::workflows::evaluation::domain::{BidderId, EvaluationError};
use crate::workflows::evaluation::scoring::{ScoringEngine, ScoringPolicy};

#[test]
fn unique_top_rank_becomes_the_recommendation() {
    let snapshot = snapshot();
    let scores = ScoringEngine::new(ScoringPolicy::default())
        .compute_scores(&snapshot.plan, &snapshot.technical_scores, &snapshot.bids)
        .expect("scores compute");

    let pack = AwardPackAssembler::assemble(
        &snapshot.tender_id,
        &scores,
        "Lowest evaluated price at comparable technical quality",
    )
    .expect("pack assembles");

    assert_eq!(pack.tender_id, tender_id());
    assert_eq!(
        pack.recommended_bidder,
        BidderId("alpha-corp".to_string())
    );
    assert_eq!(pack.ranking, scores);
    assert!(pack.rationale.contains("Lowest evaluated price"));
}

#[test]
fn shared_top_rank_requires_a_human_tie_break() {
    let mut snapshot = snapshot();
    snapshot.bids = vec![bid("alpha-corp", 100_00, 3), bid("beta-group", 100_00, 3)];
    snapshot.technical_scores = vec![
        score_entry("alpha-corp", "crit-quality", "scorer-1", 80),
        score_entry("beta-group", "crit-quality", "scorer-1", 80),
    ];

    let scores = ScoringEngine::new(ScoringPolicy::default())
        .compute_scores(&snapshot.plan, &snapshot.technical_scores, &snapshot.bids)
        .expect("scores compute");

    let result = AwardPackAssembler::assemble(&snapshot.tender_id, &scores, "tie");

    assert!(matches!(
        result,
        Err(EvaluationError::AmbiguousTopRank { count: 2 })
    ));
}

#[test]
fn empty_ranking_cannot_be_packaged() {
    let result = AwardPackAssembler::assemble(&tender_id(), &[], "nothing to award");

    assert!(matches!(result, Err(EvaluationError::NoQualifyingBids)));
}
