//! Domain layer: Core business types and logic.
//!
//! This module contains pure Rust types with no storage concerns.
//! All types are serializable and implement strict validation.

mod association;
mod catalog;
mod prediction;
pub mod scoring;

pub use association::{
    is_valid_probability, validate_replacement, AssociatedSymptom, Association, AssociationCount,
    AssociationInput, DiseaseAssociations,
};
pub use catalog::{
    Disease, DiseaseId, DiseaseUpdate, EntityKind, NewDisease, NewSymptom, Symptom, SymptomId,
    SymptomUpdate, MAX_CATEGORY_LEN, MAX_NAME_LEN,
};
pub use prediction::{MatchedSymptom, PredictionQuery, PredictionResponse, RankedDisease};
pub use scoring::{rank, ScoringConfig, ScoringSnapshot};
