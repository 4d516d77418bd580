use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::domain::{TenderEvaluationSnapshot, TenderId};

/// Read-side storage abstraction. Persisting tenders, bids, and technical
/// scores belongs to the storage collaborator; the evaluation workflow only
/// ever reads a snapshot.
pub trait TenderEvaluationRepository: Send + Sync {
    fn fetch(&self, id: &TenderId)
        -> Result<Option<TenderEvaluationSnapshot>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// In-memory snapshot store backing the binary and the test suites.
#[derive(Default, Clone)]
pub struct InMemoryTenderRepository {
    records: Arc<Mutex<HashMap<TenderId, TenderEvaluationSnapshot>>>,
}

impl InMemoryTenderRepository {
    pub fn seed(&self, snapshot: TenderEvaluationSnapshot) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&snapshot.tender_id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(snapshot.tender_id.clone(), snapshot);
        Ok(())
    }
}

impl TenderEvaluationRepository for InMemoryTenderRepository {
    fn fetch(
        &self,
        id: &TenderId,
    ) -> Result<Option<TenderEvaluationSnapshot>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }
}
