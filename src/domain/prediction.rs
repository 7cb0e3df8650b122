//! Prediction query and response types.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::catalog::{DiseaseId, SymptomId};
use crate::SymptomRankError;

/// An ordered set of distinct symptom ids submitted for ranking.
#[derive(Debug, Clone)]
pub struct PredictionQuery {
    symptom_ids: Vec<SymptomId>,
    lookup: HashSet<SymptomId>,
}

impl PredictionQuery {
    /// Build a query, collapsing repeated ids (first occurrence keeps its position).
    ///
    /// # Errors
    /// Returns `EmptyQuery` if no ids were given.
    pub fn new(symptom_ids: &[SymptomId]) -> Result<Self, SymptomRankError> {
        if symptom_ids.is_empty() {
            return Err(SymptomRankError::EmptyQuery);
        }

        let mut lookup = HashSet::with_capacity(symptom_ids.len());
        let symptom_ids: Vec<SymptomId> = symptom_ids
            .iter()
            .copied()
            .filter(|id| lookup.insert(*id))
            .collect();

        Ok(Self {
            symptom_ids,
            lookup,
        })
    }

    #[must_use]
    pub fn symptom_ids(&self) -> &[SymptomId] {
        &self.symptom_ids
    }

    #[must_use]
    pub fn contains(&self, symptom_id: SymptomId) -> bool {
        self.lookup.contains(&symptom_id)
    }
}

/// A query symptom that is associated with a ranked disease.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedSymptom {
    pub symptom_id: SymptomId,
    pub name: String,

    /// Association probability for this disease
    pub probability: f64,

    pub is_primary: bool,
}

/// One ranked candidate disease.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedDisease {
    pub disease_id: DiseaseId,
    pub name: String,
    pub description: String,
    pub category: Option<String>,

    /// Engine score in (0, 1]: share of the disease's symptom weight explained by the query
    pub probability: f64,

    /// 1-based position in the returned list
    pub rank: usize,

    /// Query symptoms associated with the disease, by descending probability
    pub matched_symptoms: Vec<MatchedSymptom>,
}

/// Result of a prediction request. Computed per request, never stored.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub predictions: Vec<RankedDisease>,

    /// Candidate diseases considered before truncation to the top-N
    pub total_diseases_checked: usize,

    /// Query ids unknown to the catalog; they contribute nothing to scores
    pub ignored_symptom_ids: Vec<SymptomId>,
}

impl PredictionResponse {
    /// The highest-ranked disease, if any.
    #[must_use]
    pub fn top(&self) -> Option<&RankedDisease> {
        self.predictions.first()
    }
}
