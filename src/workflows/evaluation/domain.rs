use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for tenders under evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TenderId(pub String);

/// Identifier wrapper for bidders participating in a tender.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BidderId(pub String);

/// Identifier wrapper for priced bill-of-quantities items.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BoqItemId(pub String);

/// Identifier wrapper for evaluation criteria.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CriterionId(pub String);

/// Identifier wrapper for the committee members submitting technical scores.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScorerId(pub String);

/// One technical criterion in the tender's evaluation rubric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationCriterion {
    pub id: CriterionId,
    pub name: String,
    pub weight_percent: u16,
    /// Raw committee scores for this criterion run 0..=max_raw_score and are
    /// normalized to a 0-100 scale before weighting.
    pub max_raw_score: u16,
    pub description: String,
}

/// Technical/commercial split applied when blending the two totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationWeights {
    pub technical_percent: u16,
    pub commercial_percent: u16,
}

/// Full scoring rubric for a tender: the split plus the criteria set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationPlan {
    pub weights: EvaluationWeights,
    pub criteria: Vec<EvaluationCriterion>,
}

impl EvaluationPlan {
    /// Reject plans whose weights do not describe a complete rubric.
    pub fn validate(&self) -> Result<(), EvaluationError> {
        let split = u32::from(self.weights.technical_percent)
            + u32::from(self.weights.commercial_percent);
        if split != 100 {
            return Err(EvaluationError::WeightSplitSum { found: split });
        }

        if self.criteria.is_empty() {
            return Err(EvaluationError::NoCriteria);
        }

        let mut seen: Vec<&CriterionId> = Vec::with_capacity(self.criteria.len());
        for criterion in &self.criteria {
            if seen.contains(&&criterion.id) {
                return Err(EvaluationError::DuplicateCriterion {
                    criterion: criterion.id.clone(),
                });
            }
            seen.push(&criterion.id);

            if criterion.max_raw_score == 0 {
                return Err(EvaluationError::UnusableCriterionScale {
                    criterion: criterion.id.clone(),
                });
            }
        }

        let weight_sum: u32 = self
            .criteria
            .iter()
            .map(|criterion| u32::from(criterion.weight_percent))
            .sum();
        if weight_sum != 100 {
            return Err(EvaluationError::CriterionWeightSum { found: weight_sum });
        }

        Ok(())
    }
}

/// One priced line of a bid, owned by the submitting bid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BidLineItem {
    pub boq_item_id: BoqItemId,
    pub unit_price_cents: u64,
    pub quantity: u32,
}

impl BidLineItem {
    pub fn extended_price_cents(&self) -> u64 {
        self.unit_price_cents * u64::from(self.quantity)
    }
}

/// A bidder's opened bid as handed over by the bid storage collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BidSubmission {
    pub bidder_id: BidderId,
    pub submitted_at: DateTime<Utc>,
    /// Qualification is decided upstream; disqualified bids are carried for
    /// the audit trail but never priced against the field.
    pub disqualified: bool,
    pub line_items: Vec<BidLineItem>,
}

impl BidSubmission {
    pub fn evaluated_price_cents(&self) -> u64 {
        self.line_items
            .iter()
            .map(BidLineItem::extended_price_cents)
            .sum()
    }
}

/// One committee member's raw score for one bidder against one criterion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechnicalScoreEntry {
    pub bidder_id: BidderId,
    pub criterion_id: CriterionId,
    pub scorer_id: ScorerId,
    pub raw_score: u16,
}

/// Derived per-bidder result of a scoring run. Recomputed on demand, never
/// mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedScore {
    pub bidder_id: BidderId,
    pub technical_total: f64,
    pub commercial_total: f64,
    pub weighted_total: f64,
    pub evaluated_price_cents: u64,
    pub rank: u32,
}

/// Everything the evaluation workflow needs for one tender, as returned by
/// the tender storage collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenderEvaluationSnapshot {
    pub tender_id: TenderId,
    pub plan: EvaluationPlan,
    pub bids: Vec<BidSubmission>,
    pub technical_scores: Vec<TechnicalScoreEntry>,
}

/// Validation and assembly failures raised by the evaluation workflow.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvaluationError {
    #[error("criterion weights sum to {found}, expected 100")]
    CriterionWeightSum { found: u32 },
    #[error("technical/commercial split sums to {found}, expected 100")]
    WeightSplitSum { found: u32 },
    #[error("evaluation plan declares no criteria")]
    NoCriteria,
    #[error("criterion {} appears more than once in the plan", .criterion.0)]
    DuplicateCriterion { criterion: CriterionId },
    #[error("criterion {} declares a zero maximum raw score", .criterion.0)]
    UnusableCriterionScale { criterion: CriterionId },
    #[error("technical score references unknown criterion {}", .criterion.0)]
    UnknownCriterion { criterion: CriterionId },
    #[error(
        "scorer {} rated bidder {} at {} on criterion {}, above the declared max {}",
        .scorer.0,
        .bidder.0,
        .raw_score,
        .criterion.0,
        .max
    )]
    RawScoreAboveMax {
        bidder: BidderId,
        criterion: CriterionId,
        scorer: ScorerId,
        raw_score: u16,
        max: u16,
    },
    #[error("bidder {} has no line item for priced BOQ item {}", .bidder.0, .boq_item.0)]
    MissingLineItem { bidder: BidderId, boq_item: BoqItemId },
    #[error("bidder {} submitted a zero-priced bid", .bidder.0)]
    ZeroPricedBid { bidder: BidderId },
    #[error("no qualifying bids available for evaluation")]
    NoQualifyingBids,
    #[error(
        "weight shift of {shift} points produces an invalid split {technical}/{commercial}"
    )]
    ScenarioOutOfRange {
        shift: i16,
        technical: i32,
        commercial: i32,
    },
    #[error("top rank is shared by {count} bidders; a manual tie-break is required")]
    AmbiguousTopRank { count: usize },
}

/// Render integer minor units as a decimal amount for sheets and logs.
pub fn format_cents(amount_cents: u64) -> String {
    format!("{}.{:02}", amount_cents / 100, amount_cents % 100)
}

/// Round a 0-100 total to the two decimal places carried by score views.
pub(crate) fn round_score(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
