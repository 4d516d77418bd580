use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{
    round_score, BidSubmission, BidderId, CombinedScore, EvaluationError, EvaluationPlan,
    TechnicalScoreEntry,
};

/// Comparison applied, in order, when two bidders land on the same weighted
/// total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreakRule {
    LowestEvaluatedPrice,
    EarliestSubmission,
}

/// Ranking dials kept out of the scoring math so procurement can reorder the
/// tie-break chain without touching the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringPolicy {
    pub tie_breaks: Vec<TieBreakRule>,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            tie_breaks: vec![
                TieBreakRule::LowestEvaluatedPrice,
                TieBreakRule::EarliestSubmission,
            ],
        }
    }
}

/// Stateless engine turning raw technical scores and bid prices into ranked
/// combined scores.
#[derive(Debug, Clone, Default)]
pub struct ScoringEngine {
    policy: ScoringPolicy,
}

struct RankingRow {
    bidder_id: BidderId,
    technical_total: f64,
    commercial_total: f64,
    weighted_total: f64,
    /// Weighted total at the stored two-decimal precision; rank ties are
    /// decided on this key, never on unrounded floats.
    weighted_key: u64,
    evaluated_price_cents: u64,
    submitted_at: DateTime<Utc>,
}

impl ScoringEngine {
    pub fn new(policy: ScoringPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &ScoringPolicy {
        &self.policy
    }

    /// Compute per-bidder technical, commercial, and weighted totals and rank
    /// the qualifying field. Pure with respect to its inputs.
    pub fn compute_scores(
        &self,
        plan: &EvaluationPlan,
        technical_scores: &[TechnicalScoreEntry],
        bids: &[BidSubmission],
    ) -> Result<Vec<CombinedScore>, EvaluationError> {
        plan.validate()?;
        validate_technical_entries(plan, technical_scores)?;

        let qualifying: Vec<&BidSubmission> =
            bids.iter().filter(|bid| !bid.disqualified).collect();
        if qualifying.is_empty() {
            return Err(EvaluationError::NoQualifyingBids);
        }

        let priced_items: BTreeSet<_> = qualifying
            .iter()
            .flat_map(|bid| bid.line_items.iter().map(|item| &item.boq_item_id))
            .collect();
        for bid in &qualifying {
            for item in &priced_items {
                let covered = bid
                    .line_items
                    .iter()
                    .any(|line| line.boq_item_id == **item);
                if !covered {
                    return Err(EvaluationError::MissingLineItem {
                        bidder: bid.bidder_id.clone(),
                        boq_item: (*item).clone(),
                    });
                }
            }
        }

        let mut prices: BTreeMap<&BidderId, u64> = BTreeMap::new();
        for bid in &qualifying {
            let price = bid.evaluated_price_cents();
            if price == 0 {
                return Err(EvaluationError::ZeroPricedBid {
                    bidder: bid.bidder_id.clone(),
                });
            }
            prices.insert(&bid.bidder_id, price);
        }

        // Qualifying bids are non-empty and non-zero at this point.
        let lowest_price = prices.values().copied().min().unwrap_or(1);

        let mut rows: Vec<RankingRow> = qualifying
            .iter()
            .map(|bid| {
                let price = prices[&bid.bidder_id];
                let technical_total =
                    technical_total_for(plan, technical_scores, &bid.bidder_id);
                let commercial_total = 100.0 * lowest_price as f64 / price as f64;
                let weighted_total = technical_total
                    * f64::from(plan.weights.technical_percent)
                    / 100.0
                    + commercial_total * f64::from(plan.weights.commercial_percent) / 100.0;
                let weighted_total = round_score(weighted_total);

                RankingRow {
                    bidder_id: bid.bidder_id.clone(),
                    technical_total: round_score(technical_total),
                    commercial_total: round_score(commercial_total),
                    weighted_total,
                    weighted_key: (weighted_total * 100.0).round() as u64,
                    evaluated_price_cents: price,
                    submitted_at: bid.submitted_at,
                }
            })
            .collect();

        rows.sort_by(|a, b| {
            b.weighted_key
                .cmp(&a.weighted_key)
                .then_with(|| self.compare_ties(a, b))
                .then_with(|| a.bidder_id.cmp(&b.bidder_id))
        });

        let mut ranked = Vec::with_capacity(rows.len());
        let mut current_rank = 0u32;
        for (index, row) in rows.iter().enumerate() {
            let tied_with_previous = index > 0 && {
                let previous = &rows[index - 1];
                previous.weighted_key == row.weighted_key
                    && self.compare_ties(previous, row) == Ordering::Equal
            };
            if !tied_with_previous {
                current_rank = index as u32 + 1;
            }

            ranked.push(CombinedScore {
                bidder_id: row.bidder_id.clone(),
                technical_total: row.technical_total,
                commercial_total: row.commercial_total,
                weighted_total: row.weighted_total,
                evaluated_price_cents: row.evaluated_price_cents,
                rank: current_rank,
            });
        }

        Ok(ranked)
    }

    fn compare_ties(&self, a: &RankingRow, b: &RankingRow) -> Ordering {
        for rule in &self.policy.tie_breaks {
            let ordering = match rule {
                TieBreakRule::LowestEvaluatedPrice => {
                    a.evaluated_price_cents.cmp(&b.evaluated_price_cents)
                }
                TieBreakRule::EarliestSubmission => a.submitted_at.cmp(&b.submitted_at),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

fn validate_technical_entries(
    plan: &EvaluationPlan,
    technical_scores: &[TechnicalScoreEntry],
) -> Result<(), EvaluationError> {
    for entry in technical_scores {
        let criterion = plan
            .criteria
            .iter()
            .find(|criterion| criterion.id == entry.criterion_id)
            .ok_or_else(|| EvaluationError::UnknownCriterion {
                criterion: entry.criterion_id.clone(),
            })?;

        if entry.raw_score > criterion.max_raw_score {
            return Err(EvaluationError::RawScoreAboveMax {
                bidder: entry.bidder_id.clone(),
                criterion: entry.criterion_id.clone(),
                scorer: entry.scorer_id.clone(),
                raw_score: entry.raw_score,
                max: criterion.max_raw_score,
            });
        }
    }

    Ok(())
}

/// Weight-average the committee's criterion scores for one bidder. Each
/// distinct scorer contributes the mean of their own entries; a criterion
/// nobody scored contributes zero.
fn technical_total_for(
    plan: &EvaluationPlan,
    technical_scores: &[TechnicalScoreEntry],
    bidder_id: &BidderId,
) -> f64 {
    let mut total = 0.0;

    for criterion in &plan.criteria {
        let mut per_scorer: BTreeMap<_, (u32, u32)> = BTreeMap::new();
        for entry in technical_scores {
            if &entry.bidder_id == bidder_id && entry.criterion_id == criterion.id {
                let slot = per_scorer.entry(&entry.scorer_id).or_insert((0, 0));
                slot.0 += u32::from(entry.raw_score);
                slot.1 += 1;
            }
        }

        if per_scorer.is_empty() {
            continue;
        }

        let scorer_mean_sum: f64 = per_scorer
            .values()
            .map(|(sum, count)| f64::from(*sum) / f64::from(*count))
            .sum();
        let criterion_mean = scorer_mean_sum / per_scorer.len() as f64;
        let normalized = criterion_mean * 100.0 / f64::from(criterion.max_raw_score);

        total += normalized * f64::from(criterion.weight_percent) / 100.0;
    }

    total
}
