//! # symptomrank
//!
//! Symptom-based differential diagnosis suggestion.
//!
//! Given a set of observed symptoms, the crate ranks candidate diseases by
//! how much of each disease's expected symptom weight the observation explains,
//! and reports which symptoms matched every candidate.
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Catalog records, associations, prediction types and the scoring engine
//! - `ports`: Storage traits for the catalog and the association store
//! - `adapters`: Concrete implementations (SQLite)
//! - `application`: Services orchestrating validation, storage and scoring
//! - `config`: Environment-driven runtime configuration

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

pub use adapters::StorageError;
pub use domain::{
    Association, AssociationInput, Disease, DiseaseId, EntityKind, PredictionResponse,
    RankedDisease, ScoringConfig, Symptom, SymptomId,
};

/// Result type for symptomrank operations
pub type Result<T> = std::result::Result<T, SymptomRankError>;

/// Main error type for symptomrank
#[derive(Debug, thiserror::Error)]
pub enum SymptomRankError {
    #[error("Invalid input: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("{entity} {id} not found")]
    NotFound { entity: EntityKind, id: i64 },

    #[error("Prediction query contains no symptoms")]
    EmptyQuery,

    #[error("{entity} {id} is still referenced by {references} association(s)")]
    ReferencedEntity {
        entity: EntityKind,
        id: i64,
        references: usize,
    },

    #[error("A {entity} named {name:?} already exists")]
    DuplicateName { entity: EntityKind, name: String },

    #[error("Storage operation failed: {0}")]
    Storage(#[source] StorageError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<StorageError> for SymptomRankError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Invalid(problems) => Self::Validation(problems),
            StorageError::UnknownSymptoms(ids) => Self::Validation(vec![format!(
                "Unknown symptom ids: {}",
                ids.iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            )]),
            StorageError::NotFound { entity, id } => Self::NotFound { entity, id },
            StorageError::DuplicateName { entity, name } => Self::DuplicateName { entity, name },
            StorageError::Referenced {
                entity,
                id,
                references,
            } => Self::ReferencedEntity {
                entity,
                id,
                references,
            },
            other => Self::Storage(other),
        }
    }
}
