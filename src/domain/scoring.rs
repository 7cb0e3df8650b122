//! Scoring engine: ranks diseases against a symptom query.
//!
//! The score of a candidate disease is the fraction of its total expected
//! symptom weight that the query explains:
//!
//! ```text
//! weight(a) = a.probability * (primary_boost if a.is_primary else 1)
//! score(d)  = sum(weight(a) for a matched by the query) / sum(weight(a) for all a of d)
//! ```
//!
//! Scores are comparable across diseases with differently sized symptom sets,
//! grow with every additional matched symptom, and reach exactly 1.0 when the
//! query covers every associated symptom.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use super::association::Association;
use super::catalog::{Disease, DiseaseId, SymptomId};
use super::prediction::{MatchedSymptom, PredictionQuery, PredictionResponse, RankedDisease};

/// Default number of ranked diseases returned per prediction.
pub const DEFAULT_TOP_N: usize = 3;

/// Default multiplier applied to the weight of primary symptoms.
pub const DEFAULT_PRIMARY_BOOST: f64 = 1.5;

/// Tunables of the scoring engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Maximum number of ranked diseases returned
    pub top_n: usize,

    /// Weight multiplier for primary associations (>= 1.0)
    pub primary_boost: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            primary_boost: DEFAULT_PRIMARY_BOOST,
        }
    }
}

impl ScoringConfig {
    /// # Errors
    /// Returns every problem found.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        if self.top_n == 0 {
            errors.push("top_n must be at least 1".to_string());
        }
        if !self.primary_boost.is_finite() || self.primary_boost < 1.0 {
            errors.push(format!(
                "primary_boost {} must be a finite number >= 1.0",
                self.primary_boost
            ));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Point-in-time view of the knowledge base needed to score one query.
///
/// Holds the candidate diseases with their complete association sets, indexed
/// both by disease and by symptom, plus the names of the query symptoms that
/// exist in the catalog.
#[derive(Debug, Clone, Default)]
pub struct ScoringSnapshot {
    diseases: BTreeMap<DiseaseId, Disease>,
    by_disease: BTreeMap<DiseaseId, Vec<Association>>,
    by_symptom: HashMap<SymptomId, Vec<DiseaseId>>,
    symptom_names: HashMap<SymptomId, String>,
}

impl ScoringSnapshot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a catalog symptom by name.
    pub fn insert_symptom(&mut self, symptom_id: SymptomId, name: impl Into<String>) {
        self.symptom_names.insert(symptom_id, name.into());
    }

    /// Register a disease with its complete association set.
    ///
    /// Replaces anything previously registered for the same disease.
    pub fn insert_disease(&mut self, disease: Disease, associations: Vec<Association>) {
        let disease_id = disease.id;
        if let Some(previous) = self.by_disease.remove(&disease_id) {
            for association in previous {
                if let Some(ids) = self.by_symptom.get_mut(&association.symptom_id) {
                    ids.retain(|id| *id != disease_id);
                }
            }
        }

        for association in &associations {
            self.by_symptom
                .entry(association.symptom_id)
                .or_default()
                .push(disease_id);
        }
        self.by_disease.insert(disease_id, associations);
        self.diseases.insert(disease_id, disease);
    }

    #[must_use]
    pub fn is_known_symptom(&self, symptom_id: SymptomId) -> bool {
        self.symptom_names.contains_key(&symptom_id)
    }

    #[must_use]
    pub fn associations(&self, disease_id: DiseaseId) -> &[Association] {
        self.by_disease
            .get(&disease_id)
            .map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn disease_count(&self) -> usize {
        self.diseases.len()
    }

    /// Diseases with at least one association to a query symptom, in id order.
    fn candidate_ids(&self, query: &PredictionQuery) -> BTreeSet<DiseaseId> {
        query
            .symptom_ids()
            .iter()
            .filter_map(|symptom_id| self.by_symptom.get(symptom_id))
            .flatten()
            .copied()
            .collect()
    }
}

struct ScoredCandidate<'a> {
    disease: &'a Disease,
    score: f64,
    matched: Vec<&'a Association>,
}

/// Rank the snapshot's diseases against `query`.
///
/// Candidates are sorted by score descending with ties broken by ascending
/// disease id, truncated to `config.top_n`, and ranked from 1. Diseases whose
/// total association weight is zero are never candidates. A candidate whose
/// matched weight is zero counts as checked but is not ranked.
#[must_use]
pub fn rank(
    snapshot: &ScoringSnapshot,
    query: &PredictionQuery,
    config: &ScoringConfig,
) -> PredictionResponse {
    let boost = config.primary_boost;
    let mut total_diseases_checked = 0;
    let mut scored = Vec::new();

    for disease_id in snapshot.candidate_ids(query) {
        let Some(disease) = snapshot.diseases.get(&disease_id) else {
            continue;
        };
        let associations = snapshot.associations(disease_id);

        let normalizer: f64 = associations.iter().map(|a| a.weight(boost)).sum();
        if normalizer <= 0.0 {
            tracing::debug!("Skipping disease {} with zero total weight", disease_id);
            continue;
        }
        total_diseases_checked += 1;

        let matched: Vec<&Association> = associations
            .iter()
            .filter(|a| query.contains(a.symptom_id))
            .collect();
        let matched_weight: f64 = matched.iter().map(|a| a.weight(boost)).sum();
        if matched_weight <= 0.0 {
            continue;
        }

        let score = if matched.len() == associations.len() {
            1.0
        } else {
            (matched_weight / normalizer).min(1.0)
        };

        tracing::debug!(
            "Disease {}: matched {}/{} associations, score={:.4}",
            disease_id,
            matched.len(),
            associations.len(),
            score
        );

        scored.push(ScoredCandidate {
            disease,
            score,
            matched,
        });
    }

    scored.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.disease.id.cmp(&b.disease.id))
    });

    let predictions = scored
        .into_iter()
        .take(config.top_n)
        .enumerate()
        .map(|(index, candidate)| RankedDisease {
            disease_id: candidate.disease.id,
            name: candidate.disease.name.clone(),
            description: candidate.disease.description.clone(),
            category: candidate.disease.category.clone(),
            probability: candidate.score,
            rank: index + 1,
            matched_symptoms: explain(snapshot, candidate.matched),
        })
        .collect();

    let ignored_symptom_ids = query
        .symptom_ids()
        .iter()
        .copied()
        .filter(|id| !snapshot.is_known_symptom(*id))
        .collect();

    PredictionResponse {
        predictions,
        total_diseases_checked,
        ignored_symptom_ids,
    }
}

/// Matched symptoms by descending probability, ties by ascending symptom id.
fn explain(snapshot: &ScoringSnapshot, mut matched: Vec<&Association>) -> Vec<MatchedSymptom> {
    matched.sort_by(|a, b| {
        b.probability
            .partial_cmp(&a.probability)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.symptom_id.cmp(&b.symptom_id))
    });

    matched
        .into_iter()
        .map(|a| MatchedSymptom {
            symptom_id: a.symptom_id,
            name: snapshot
                .symptom_names
                .get(&a.symptom_id)
                .cloned()
                .unwrap_or_default(),
            probability: a.probability,
            is_primary: a.is_primary,
        })
        .collect()
}
