//! Weighted disease-symptom associations.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::catalog::{DiseaseId, SymptomId};

/// One edge of the disease-symptom association graph.
///
/// At most one association exists per `(disease_id, symptom_id)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Association {
    pub disease_id: DiseaseId,
    pub symptom_id: SymptomId,

    /// Likelihood (0.0 to 1.0) that a patient with the disease shows the symptom
    pub probability: f64,

    /// Whether the symptom is a defining indicator for the disease
    pub is_primary: bool,
}

impl Association {
    /// Scoring weight of this association: its probability, scaled by
    /// `primary_boost` when the symptom is primary.
    #[must_use]
    pub fn weight(&self, primary_boost: f64) -> f64 {
        if self.is_primary {
            self.probability * primary_boost
        } else {
            self.probability
        }
    }
}

/// One item of a bulk association replacement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AssociationInput {
    pub symptom_id: SymptomId,
    pub probability: f64,
    #[serde(default)]
    pub is_primary: bool,
}

impl AssociationInput {
    #[must_use]
    pub fn new(symptom_id: SymptomId, probability: f64) -> Self {
        Self {
            symptom_id,
            probability,
            is_primary: false,
        }
    }

    #[must_use]
    pub fn primary(symptom_id: SymptomId, probability: f64) -> Self {
        Self {
            symptom_id,
            probability,
            is_primary: true,
        }
    }

    /// Bind this item to a disease.
    #[must_use]
    pub fn into_association(self, disease_id: DiseaseId) -> Association {
        Association {
            disease_id,
            symptom_id: self.symptom_id,
            probability: self.probability,
            is_primary: self.is_primary,
        }
    }
}

/// Whether `probability` lies in the closed range [0, 1].
///
/// NaN and infinities are rejected.
#[must_use]
pub fn is_valid_probability(probability: f64) -> bool {
    (0.0..=1.0).contains(&probability)
}

/// Validate a full replacement set: probabilities in range and no symptom listed twice.
///
/// Referential checks (does each symptom exist?) belong to the store, which
/// performs them inside the replacement transaction.
///
/// # Errors
/// Returns every problem found.
pub fn validate_replacement(items: &[AssociationInput]) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();
    let mut seen = HashSet::with_capacity(items.len());
    let mut duplicates = Vec::new();

    for item in items {
        if !is_valid_probability(item.probability) {
            errors.push(format!(
                "Probability {} for symptom {} out of range [0, 1]",
                item.probability, item.symptom_id
            ));
        }
        if !seen.insert(item.symptom_id) && !duplicates.contains(&item.symptom_id) {
            duplicates.push(item.symptom_id);
        }
    }

    for symptom_id in duplicates {
        errors.push(format!("Symptom {symptom_id} listed more than once"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// An association joined with its symptom's name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssociatedSymptom {
    pub symptom_id: SymptomId,
    pub symptom_name: String,
    pub probability: f64,
    pub is_primary: bool,
}

/// Every association of one disease, ordered by descending probability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiseaseAssociations {
    pub disease_id: DiseaseId,
    pub disease_name: String,
    pub symptoms: Vec<AssociatedSymptom>,
}

/// Number of symptoms associated with a disease.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssociationCount {
    pub disease_id: DiseaseId,
    pub disease_name: String,
    pub symptom_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weight_applies_primary_boost() {
        let primary = AssociationInput::primary(1, 0.8).into_association(10);
        let secondary = AssociationInput::new(2, 0.8).into_association(10);

        assert!((primary.weight(1.5) - 1.2).abs() < 1e-12);
        assert!((secondary.weight(1.5) - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_probability_range() {
        assert!(is_valid_probability(0.0));
        assert!(is_valid_probability(1.0));
        assert!(!is_valid_probability(-0.01));
        assert!(!is_valid_probability(1.01));
        assert!(!is_valid_probability(f64::NAN));
        assert!(!is_valid_probability(f64::INFINITY));
    }

    #[test]
    fn test_validate_replacement_reports_range_and_duplicates() {
        let items = vec![
            AssociationInput::new(1, 0.5),
            AssociationInput::new(2, 1.5),
            AssociationInput::new(1, 0.3),
            AssociationInput::new(1, 0.2),
        ];

        let errors = validate_replacement(&items).expect_err("Should reject");
        assert_eq!(errors.len(), 2);
        assert!(errors[0].contains("symptom 2"));
        assert!(errors[1].contains("Symptom 1 listed more than once"));
    }

    #[test]
    fn test_validate_replacement_accepts_empty_set() {
        assert!(validate_replacement(&[]).is_ok());
    }

    #[test]
    fn test_input_deserializes_without_primary_flag() {
        let item: AssociationInput =
            serde_json::from_str(r#"{"symptom_id": 4, "probability": 0.25}"#)
                .expect("Should parse");
        assert_eq!(item, AssociationInput::new(4, 0.25));
    }
}
