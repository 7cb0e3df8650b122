//! Sample knowledge base for demos and tests.
//!
//! Ten common symptoms, five diseases and the weighted associations between them.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use super::{AssociationService, CatalogService};
use crate::domain::{AssociationInput, NewDisease, NewSymptom};
use crate::ports::{AssociationStore, CatalogStore};
use crate::{Result, SymptomRankError};

/// (name, description)
const SAMPLE_SYMPTOMS: &[(&str, &str)] = &[
    ("Fever", "Body temperature of 38\u{b0}C or higher"),
    ("Cough", "Persistent coughing"),
    ("Runny nose", "Nasal discharge"),
    ("Phlegm", "Sticky mucus brought up with coughing"),
    ("Headache", "Pain in the head"),
    ("Muscle ache", "Tight or painful muscles"),
    ("Sore throat", "Painful, scratchy throat"),
    ("Diarrhea", "Frequent loose stools"),
    ("Vomiting", "Throwing up food"),
    ("Fatigue", "Severe tiredness and lethargy"),
];

/// (name, description, category)
const SAMPLE_DISEASES: &[(&str, &str, &str)] = &[
    ("Influenza", "Acute respiratory illness caused by influenza viruses", "Respiratory"),
    ("COVID-19", "Infectious disease caused by SARS-CoV-2", "Respiratory"),
    ("Common cold", "Upper respiratory infection caused by various viruses", "Respiratory"),
    ("Food poisoning", "Acute gastrointestinal illness from contaminated food", "Digestive"),
    ("Tonsillitis", "Inflammation of the tonsils", "ENT"),
];

/// (disease, symptom, probability, primary)
const SAMPLE_ASSOCIATIONS: &[(&str, &str, f64, bool)] = &[
    ("Influenza", "Fever", 0.9, true),
    ("Influenza", "Cough", 0.8, true),
    ("Influenza", "Muscle ache", 0.7, false),
    ("Influenza", "Fatigue", 0.85, false),
    ("Influenza", "Headache", 0.6, false),
    ("COVID-19", "Fever", 0.85, true),
    ("COVID-19", "Cough", 0.75, true),
    ("COVID-19", "Fatigue", 0.8, false),
    ("COVID-19", "Sore throat", 0.6, false),
    ("COVID-19", "Headache", 0.55, false),
    ("Common cold", "Runny nose", 0.9, true),
    ("Common cold", "Cough", 0.7, true),
    ("Common cold", "Sore throat", 0.65, false),
    ("Common cold", "Fever", 0.4, false),
    ("Common cold", "Headache", 0.5, false),
    ("Food poisoning", "Diarrhea", 0.95, true),
    ("Food poisoning", "Vomiting", 0.85, true),
    ("Food poisoning", "Fever", 0.5, false),
    ("Food poisoning", "Headache", 0.4, false),
    ("Tonsillitis", "Sore throat", 0.95, true),
    ("Tonsillitis", "Fever", 0.8, true),
    ("Tonsillitis", "Headache", 0.6, false),
    ("Tonsillitis", "Fatigue", 0.7, false),
];

/// Counts of records written by [`seed_sample_knowledge`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeedSummary {
    pub symptoms: usize,
    pub diseases: usize,
    pub associations: usize,
}

/// Load the sample knowledge base into `store`.
///
/// # Errors
/// `DuplicateName` if any sample record already exists, or any storage error.
pub fn seed_sample_knowledge<S>(store: Arc<S>) -> Result<SeedSummary>
where
    S: CatalogStore + AssociationStore,
    <S as CatalogStore>::Error: Into<SymptomRankError>,
    <S as AssociationStore>::Error: Into<SymptomRankError>,
{
    let catalog = CatalogService::new(Arc::clone(&store));
    let associations = AssociationService::new(store);

    let mut symptom_ids = HashMap::with_capacity(SAMPLE_SYMPTOMS.len());
    for (name, description) in SAMPLE_SYMPTOMS {
        let symptom = catalog.add_symptom(NewSymptom::new(*name).with_description(*description))?;
        symptom_ids.insert(*name, symptom.id);
    }

    let mut summary = SeedSummary {
        symptoms: symptom_ids.len(),
        diseases: 0,
        associations: 0,
    };

    for (name, description, category) in SAMPLE_DISEASES {
        let disease =
            catalog.add_disease(NewDisease::new(*name, *description).with_category(*category))?;

        let items = SAMPLE_ASSOCIATIONS
            .iter()
            .filter(|(disease_name, ..)| disease_name == name)
            .map(|(_, symptom, probability, primary)| {
                let symptom_id = symptom_ids.get(symptom).copied().ok_or_else(|| {
                    SymptomRankError::Validation(vec![format!("Unknown sample symptom {symptom}")])
                })?;
                Ok(AssociationInput {
                    symptom_id,
                    probability: *probability,
                    is_primary: *primary,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        summary.associations += items.len();
        associations.replace_disease_associations(disease.id, items)?;
        summary.diseases += 1;
    }

    tracing::info!(
        "Seeded sample knowledge: {} symptoms, {} diseases, {} associations",
        summary.symptoms,
        summary.diseases,
        summary.associations
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::SqliteStorage;

    #[test]
    fn test_seed_populates_store() {
        let storage = Arc::new(SqliteStorage::in_memory().expect("Should create db"));

        let summary = seed_sample_knowledge(Arc::clone(&storage)).expect("Should seed");

        assert_eq!(
            summary,
            SeedSummary {
                symptoms: 10,
                diseases: 5,
                associations: SAMPLE_ASSOCIATIONS.len(),
            }
        );
        let counts = AssociationService::new(Arc::clone(&storage))
            .association_counts()
            .expect("Should count");
        assert_eq!(counts.iter().map(|c| c.symptom_count).sum::<usize>(), summary.associations);
    }

    #[test]
    fn test_seed_twice_is_rejected() {
        let storage = Arc::new(SqliteStorage::in_memory().expect("Should create db"));
        seed_sample_knowledge(Arc::clone(&storage)).expect("Should seed");

        let err = seed_sample_knowledge(storage).expect_err("Should reject");
        assert!(matches!(err, SymptomRankError::DuplicateName { .. }));
    }
}
