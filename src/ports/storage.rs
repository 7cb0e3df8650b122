//! Storage ports: Traits for the catalog and the association store.
//!
//! These traits abstract the storage backend (SQLite) from the application logic.

use crate::domain::{
    Association, AssociationCount, AssociationInput, Disease, DiseaseAssociations, DiseaseId,
    DiseaseUpdate, NewDisease, NewSymptom, ScoringSnapshot, Symptom, SymptomId, SymptomUpdate,
};

/// A page of records with pagination metadata.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Page<T> {
    /// Records in this page
    pub items: Vec<T>,
    /// Total count of all matching records
    pub total_count: usize,
    /// Current page offset
    pub offset: usize,
    /// Page size limit
    pub limit: usize,
    /// Whether there are more pages
    pub has_more: bool,
}

impl<T> Page<T> {
    /// Create a new page.
    #[must_use]
    pub fn new(items: Vec<T>, total_count: usize, offset: usize, limit: usize) -> Self {
        let has_more = offset.saturating_add(items.len()) < total_count;
        Self {
            items,
            total_count,
            offset,
            limit,
            has_more,
        }
    }

    /// Get the next page offset.
    #[must_use]
    pub fn next_offset(&self) -> Option<usize> {
        if self.has_more {
            self.offset.checked_add(self.limit)
        } else {
            None
        }
    }
}

/// Persistent catalog of symptoms and diseases.
pub trait CatalogStore: Send + Sync {
    /// Error type for storage operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Insert a symptom and return the stored record.
    ///
    /// # Errors
    /// Returns error if the name is taken or the storage operation fails.
    fn insert_symptom(&self, symptom: &NewSymptom) -> Result<Symptom, Self::Error>;

    /// Load a symptom by id.
    ///
    /// # Returns
    /// `None` if no such symptom exists.
    fn get_symptom(&self, id: SymptomId) -> Result<Option<Symptom>, Self::Error>;

    /// List symptoms by ascending id.
    fn list_symptoms(&self, offset: usize, limit: usize) -> Result<Page<Symptom>, Self::Error>;

    /// Apply a partial update and return the updated record.
    ///
    /// # Errors
    /// Returns error if the symptom is missing or the new name is taken.
    fn update_symptom(&self, id: SymptomId, update: &SymptomUpdate) -> Result<Symptom, Self::Error>;

    /// Delete a symptom.
    ///
    /// # Errors
    /// Returns error if the symptom is missing or still referenced by associations.
    fn delete_symptom(&self, id: SymptomId) -> Result<(), Self::Error>;

    /// Insert a disease and return the stored record.
    ///
    /// # Errors
    /// Returns error if the name is taken or the storage operation fails.
    fn insert_disease(&self, disease: &NewDisease) -> Result<Disease, Self::Error>;

    /// Load a disease by id.
    fn get_disease(&self, id: DiseaseId) -> Result<Option<Disease>, Self::Error>;

    /// List diseases by ascending id, optionally restricted to one category.
    fn list_diseases(
        &self,
        category: Option<&str>,
        offset: usize,
        limit: usize,
    ) -> Result<Page<Disease>, Self::Error>;

    /// Apply a partial update and return the updated record.
    ///
    /// # Errors
    /// Returns error if the disease is missing or the new name is taken.
    fn update_disease(&self, id: DiseaseId, update: &DiseaseUpdate) -> Result<Disease, Self::Error>;

    /// Delete a disease together with its associations.
    ///
    /// # Errors
    /// Returns error if the disease is missing or the storage operation fails.
    fn delete_disease(&self, id: DiseaseId) -> Result<(), Self::Error>;

    /// Distinct disease categories in ascending order.
    fn list_categories(&self) -> Result<Vec<String>, Self::Error>;
}

/// Persistent disease-symptom association store.
///
/// Writes happen only through full per-disease replacement.
pub trait AssociationStore: Send + Sync {
    /// Error type for storage operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Associations of one disease, by descending probability then symptom id.
    fn associations_for_disease(&self, disease_id: DiseaseId) -> Result<Vec<Association>, Self::Error>;

    /// Associations referencing one symptom, by ascending disease id.
    fn associations_for_symptom(&self, symptom_id: SymptomId) -> Result<Vec<Association>, Self::Error>;

    /// Associations of one disease joined with symptom names.
    ///
    /// # Errors
    /// Returns error if the disease does not exist.
    fn disease_associations(&self, disease_id: DiseaseId) -> Result<DiseaseAssociations, Self::Error>;

    /// Atomically replace every association of `disease_id` with `items` and
    /// return the stored set as read inside the same transaction.
    ///
    /// Either the whole replacement becomes visible or none of it does.
    ///
    /// # Errors
    /// Checked in order: the disease is missing, an item is invalid, a symptom
    /// is unknown, or the transaction fails. Stored state is unchanged on error.
    fn replace_associations_for_disease(
        &self,
        disease_id: DiseaseId,
        items: &[AssociationInput],
    ) -> Result<DiseaseAssociations, Self::Error>;

    /// Symptom count of every disease, by ascending disease id.
    fn association_counts(&self) -> Result<Vec<AssociationCount>, Self::Error>;

    /// Load a consistent view of every disease associated with any of
    /// `symptom_ids`, including each such disease's complete association set
    /// and the names of the given symptoms that exist.
    fn scoring_snapshot(&self, symptom_ids: &[SymptomId]) -> Result<ScoringSnapshot, Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_navigation() {
        let page = Page::new(vec![1, 2], 5, 0, 2);
        assert!(page.has_more);
        assert_eq!(page.next_offset(), Some(2));

        let last = Page::new(vec![5], 5, 4, 2);
        assert!(!last.has_more);
        assert_eq!(last.next_offset(), None);
    }

    #[test]
    fn test_page_at_extreme_offset_does_not_overflow() {
        let page: Page<u8> = Page::new(Vec::new(), 3, usize::MAX, 10);
        assert!(!page.has_more);
        assert_eq!(page.next_offset(), None);
    }
}
