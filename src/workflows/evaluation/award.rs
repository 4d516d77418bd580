use serde::{Deserialize, Serialize};

use super::domain::{BidderId, CombinedScore, EvaluationError, TenderId};

/// Packaged recommendation submitted into the approval workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AwardPack {
    pub tender_id: TenderId,
    pub recommended_bidder: BidderId,
    pub ranking: Vec<CombinedScore>,
    pub rationale: String,
}

/// Packages the final ranking behind a single recommended awardee.
#[derive(Debug, Clone, Copy, Default)]
pub struct AwardPackAssembler;

impl AwardPackAssembler {
    /// A shared top rank is refused so a human tie-break happens before any
    /// award pack reaches the approval chain.
    pub fn assemble(
        tender_id: &TenderId,
        scores: &[CombinedScore],
        rationale: impl Into<String>,
    ) -> Result<AwardPack, EvaluationError> {
        let top: Vec<&CombinedScore> = scores.iter().filter(|score| score.rank == 1).collect();

        if top.is_empty() {
            return Err(EvaluationError::NoQualifyingBids);
        }
        if top.len() > 1 {
            return Err(EvaluationError::AmbiguousTopRank { count: top.len() });
        }

        Ok(AwardPack {
            tender_id: tender_id.clone(),
            recommended_bidder: top[0].bidder_id.clone(),
            ranking: scores.to_vec(),
            rationale: rationale.into(),
        })
    }
}
