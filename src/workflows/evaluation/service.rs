use std::sync::Arc;

use tracing::debug;

use super::award::{AwardPack, AwardPackAssembler};
use super::comparable::{
    sheet_to_csv, ComparableRow, ComparableSheetBuilder, OutlierPolicy, SheetExportError,
};
use super::domain::{CombinedScore, EvaluationError, TenderEvaluationSnapshot, TenderId};
use super::repository::{RepositoryError, TenderEvaluationRepository};
use super::scoring::{ScoringEngine, ScoringPolicy};
use super::sensitivity::{ScenarioResult, SensitivityAnalyzer};

/// Service composing the snapshot repository, scoring engine, comparable
/// sheet builder, and sensitivity analyzer behind one facade.
pub struct EvaluationService<R> {
    repository: Arc<R>,
    engine: ScoringEngine,
    sheets: ComparableSheetBuilder,
    analyzer: SensitivityAnalyzer,
}

impl<R> EvaluationService<R>
where
    R: TenderEvaluationRepository + 'static,
{
    pub fn new(repository: Arc<R>, scoring: ScoringPolicy, outliers: OutlierPolicy) -> Self {
        let engine = ScoringEngine::new(scoring);

        Self {
            repository,
            analyzer: SensitivityAnalyzer::new(engine.clone()),
            sheets: ComparableSheetBuilder::new(outliers),
            engine,
        }
    }

    /// Rank the tender's qualifying bids.
    pub fn compute_scores(
        &self,
        tender_id: &TenderId,
    ) -> Result<Vec<CombinedScore>, EvaluationServiceError> {
        let snapshot = self.snapshot(tender_id)?;
        let scores = self.engine.compute_scores(
            &snapshot.plan,
            &snapshot.technical_scores,
            &snapshot.bids,
        )?;

        debug!(tender = %tender_id.0, bidders = scores.len(), "combined scores computed");
        Ok(scores)
    }

    /// Cross-bidder price comparison for every priced BOQ item.
    pub fn comparable_sheet(
        &self,
        tender_id: &TenderId,
    ) -> Result<Vec<ComparableRow>, EvaluationServiceError> {
        let snapshot = self.snapshot(tender_id)?;
        Ok(self.sheets.build(&snapshot.bids))
    }

    /// CSV rendering of the comparable sheet for spreadsheet-bound reviewers.
    pub fn comparable_sheet_csv(
        &self,
        tender_id: &TenderId,
    ) -> Result<String, EvaluationServiceError> {
        let rows = self.comparable_sheet(tender_id)?;
        Ok(sheet_to_csv(&rows)?)
    }

    /// Ranking stability report under the requested weight shifts.
    pub fn sensitivity(
        &self,
        tender_id: &TenderId,
        shifts: &[i16],
    ) -> Result<Vec<ScenarioResult>, EvaluationServiceError> {
        let snapshot = self.snapshot(tender_id)?;
        let scenarios = self.analyzer.analyze(
            &snapshot.plan,
            &snapshot.technical_scores,
            &snapshot.bids,
            shifts,
        )?;
        Ok(scenarios)
    }

    /// Package the ranking behind a unique recommended awardee.
    pub fn award_pack(
        &self,
        tender_id: &TenderId,
        rationale: String,
    ) -> Result<AwardPack, EvaluationServiceError> {
        let scores = self.compute_scores(tender_id)?;
        let pack = AwardPackAssembler::assemble(tender_id, &scores, rationale)?;

        debug!(
            tender = %tender_id.0,
            recommended = %pack.recommended_bidder.0,
            "award pack assembled"
        );
        Ok(pack)
    }

    fn snapshot(
        &self,
        tender_id: &TenderId,
    ) -> Result<TenderEvaluationSnapshot, EvaluationServiceError> {
        let snapshot = self
            .repository
            .fetch(tender_id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(snapshot)
    }
}

/// Error raised by the evaluation service.
#[derive(Debug, thiserror::Error)]
pub enum EvaluationServiceError {
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Export(#[from] SheetExportError),
}
