//! Prediction service: ranks diseases for a set of observed symptoms.
//!
//! This service coordinates:
//! - Query validation
//! - Loading a consistent snapshot of the candidate diseases
//! - Scoring and ranking

use std::sync::Arc;

use crate::domain::{scoring, PredictionQuery, PredictionResponse, ScoringConfig, SymptomId};
use crate::ports::AssociationStore;
use crate::{Result, SymptomRankError};

/// Service for ranking diseases against symptom queries.
///
/// Scoring is read-only: any number of threads may call [`predict`](Self::predict)
/// on a shared service concurrently.
pub struct PredictionService<S>
where
    S: AssociationStore,
{
    store: Arc<S>,
    config: ScoringConfig,
}

impl<S> PredictionService<S>
where
    S: AssociationStore,
    S::Error: Into<SymptomRankError>,
{
    /// Create a prediction service with the default scoring configuration.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            config: ScoringConfig::default(),
        }
    }

    /// Create a prediction service with a custom scoring configuration.
    ///
    /// # Errors
    /// Returns `Config` if the configuration is invalid.
    pub fn with_config(store: Arc<S>, config: ScoringConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|errors| SymptomRankError::Config(errors.join("; ")))?;
        Ok(Self { store, config })
    }

    #[must_use]
    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Rank diseases for the given symptom ids.
    ///
    /// Ids associated with no disease, including ids unknown to the catalog,
    /// contribute nothing; unknown ids are echoed in `ignored_symptom_ids`.
    ///
    /// # Errors
    /// `EmptyQuery` if `symptom_ids` is empty, `Storage` if the snapshot cannot be read.
    pub fn predict(&self, symptom_ids: &[SymptomId]) -> Result<PredictionResponse> {
        let query = PredictionQuery::new(symptom_ids)?;

        let snapshot = self
            .store
            .scoring_snapshot(query.symptom_ids())
            .map_err(Into::into)?;

        let response = scoring::rank(&snapshot, &query, &self.config);

        if !response.ignored_symptom_ids.is_empty() {
            tracing::debug!(
                "Ignored unknown symptom ids: {:?}",
                response.ignored_symptom_ids
            );
        }
        tracing::info!(
            "Prediction complete: {} symptom(s), {} candidate(s) checked, top={}",
            query.symptom_ids().len(),
            response.total_diseases_checked,
            response
                .top()
                .map_or_else(|| "none".to_string(), |p| format!("{} ({:.4})", p.name, p.probability))
        );

        Ok(response)
    }
}
