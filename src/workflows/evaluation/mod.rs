//! Bid evaluation workflow: combined scoring, comparable sheet, sensitivity
//! analysis, and award pack assembly over opened tender bids.

pub mod award;
pub mod comparable;
pub mod domain;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod sensitivity;
pub mod service;

#[cfg(test)]
mod tests;

pub use award::{AwardPack, AwardPackAssembler};
pub use comparable::{
    sheet_to_csv, ComparableEntry, ComparableRow, ComparableSheetBuilder, OutlierPolicy,
    SheetExportError,
};
pub use domain::{
    format_cents, BidLineItem, BidSubmission, BidderId, BoqItemId, CombinedScore, CriterionId,
    EvaluationCriterion, EvaluationError, EvaluationPlan, EvaluationWeights, ScorerId,
    TechnicalScoreEntry, TenderEvaluationSnapshot, TenderId,
};
pub use repository::{InMemoryTenderRepository, RepositoryError, TenderEvaluationRepository};
pub use router::evaluation_router;
pub use scoring::{ScoringEngine, ScoringPolicy, TieBreakRule};
pub use sensitivity::{ScenarioResult, SensitivityAnalyzer};
pub use service::{EvaluationService, EvaluationServiceError};
