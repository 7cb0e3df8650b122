//! Association service: bulk replacement and inspection of disease-symptom links.

use std::sync::Arc;

use crate::domain::{
    Association, AssociationCount, AssociationInput, DiseaseAssociations, DiseaseId, SymptomId,
};
use crate::ports::AssociationStore;
use crate::{Result, SymptomRankError};

/// Service for maintaining disease-symptom associations.
///
/// The only write path is full replacement of one disease's association set:
/// symptoms omitted from a replacement are removed.
pub struct AssociationService<S>
where
    S: AssociationStore,
{
    store: Arc<S>,
}

impl<S> AssociationService<S>
where
    S: AssociationStore,
    S::Error: Into<SymptomRankError>,
{
    /// Create a new association service.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Atomically replace every association of `disease_id` with `items`.
    ///
    /// An empty `items` clears the disease. Returns the stored result, read in
    /// the same transaction as the write.
    ///
    /// # Errors
    /// - `NotFound` if the disease does not exist, checked first
    /// - `Validation` for out-of-range probabilities, repeated symptoms or unknown symptom ids
    /// - `Storage` if the transaction fails; stored state is then unchanged
    pub fn replace_disease_associations(
        &self,
        disease_id: DiseaseId,
        items: Vec<AssociationInput>,
    ) -> Result<DiseaseAssociations> {
        self.store
            .replace_associations_for_disease(disease_id, &items)
            .map_err(Into::into)
    }

    /// Associations of one disease joined with symptom names.
    ///
    /// # Errors
    /// `NotFound` if the disease does not exist.
    pub fn disease_associations(&self, disease_id: DiseaseId) -> Result<DiseaseAssociations> {
        self.store
            .disease_associations(disease_id)
            .map_err(Into::into)
    }

    /// # Errors
    /// Returns error if storage operation fails.
    pub fn associations_for_disease(&self, disease_id: DiseaseId) -> Result<Vec<Association>> {
        self.store
            .associations_for_disease(disease_id)
            .map_err(Into::into)
    }

    /// # Errors
    /// Returns error if storage operation fails.
    pub fn associations_for_symptom(&self, symptom_id: SymptomId) -> Result<Vec<Association>> {
        self.store
            .associations_for_symptom(symptom_id)
            .map_err(Into::into)
    }

    /// Symptom count of every disease, in one query.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    pub fn association_counts(&self) -> Result<Vec<AssociationCount>> {
        self.store.association_counts().map_err(Into::into)
    }
}
