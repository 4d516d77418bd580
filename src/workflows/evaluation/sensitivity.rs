use serde::{Deserialize, Serialize};

use super::domain::{
    BidSubmission, BidderId, EvaluationError, EvaluationPlan, EvaluationWeights,
    TechnicalScoreEntry,
};
use super::scoring::ScoringEngine;

/// Outcome of re-scoring the field under one shifted split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResult {
    /// Percentage points moved from the technical side to the commercial
    /// side; negative values move weight back toward technical.
    pub shift_percent: i16,
    pub weights: EvaluationWeights,
    pub top_bidder: BidderId,
    pub top_changed: bool,
}

/// Read-side stability report over the scoring engine. Never commits an
/// alternate scoring.
#[derive(Debug, Clone, Default)]
pub struct SensitivityAnalyzer {
    engine: ScoringEngine,
}

impl SensitivityAnalyzer {
    pub fn new(engine: ScoringEngine) -> Self {
        Self { engine }
    }

    /// Re-run scoring once per requested shift and report whether the
    /// top-ranked bidder moves.
    pub fn analyze(
        &self,
        plan: &EvaluationPlan,
        technical_scores: &[TechnicalScoreEntry],
        bids: &[BidSubmission],
        shifts: &[i16],
    ) -> Result<Vec<ScenarioResult>, EvaluationError> {
        let baseline = self.engine.compute_scores(plan, technical_scores, bids)?;
        let baseline_top = baseline
            .first()
            .map(|score| score.bidder_id.clone())
            .ok_or(EvaluationError::NoQualifyingBids)?;

        shifts
            .iter()
            .map(|&shift| {
                let weights = shifted_weights(plan.weights, shift)?;
                let mut scenario_plan = plan.clone();
                scenario_plan.weights = weights;

                let scores =
                    self.engine
                        .compute_scores(&scenario_plan, technical_scores, bids)?;
                let top_bidder = scores
                    .first()
                    .map(|score| score.bidder_id.clone())
                    .ok_or(EvaluationError::NoQualifyingBids)?;

                Ok(ScenarioResult {
                    shift_percent: shift,
                    weights,
                    top_changed: top_bidder != baseline_top,
                    top_bidder,
                })
            })
            .collect()
    }
}

fn shifted_weights(
    weights: EvaluationWeights,
    shift: i16,
) -> Result<EvaluationWeights, EvaluationError> {
    let technical = i32::from(weights.technical_percent) - i32::from(shift);
    let commercial = i32::from(weights.commercial_percent) + i32::from(shift);

    if !(0..=100).contains(&technical)
        || !(0..=100).contains(&commercial)
        || technical + commercial != 100
    {
        return Err(EvaluationError::ScenarioOutOfRange {
            shift,
            technical,
            commercial,
        });
    }

    Ok(EvaluationWeights {
        technical_percent: technical as u16,
        commercial_percent: commercial as u16,
    })
}
