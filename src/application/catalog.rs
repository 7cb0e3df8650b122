//! Catalog service: CRUD for symptoms and diseases.

use std::sync::Arc;

use crate::domain::{
    Disease, DiseaseId, DiseaseUpdate, EntityKind, NewDisease, NewSymptom, Symptom, SymptomId,
    SymptomUpdate,
};
use crate::ports::{CatalogStore, Page};
use crate::{Result, SymptomRankError};

/// Page size used when the caller does not specify one.
pub const DEFAULT_PAGE_LIMIT: usize = 100;

/// Largest page a caller may request.
pub const MAX_PAGE_LIMIT: usize = 1000;

/// Service for maintaining the symptom and disease catalog.
pub struct CatalogService<S>
where
    S: CatalogStore,
{
    store: Arc<S>,
}

impl<S> CatalogService<S>
where
    S: CatalogStore,
    S::Error: Into<SymptomRankError>,
{
    /// Create a new catalog service.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Add a symptom.
    ///
    /// # Errors
    /// `Validation` for a blank or over-long name, `DuplicateName` if the name is taken.
    pub fn add_symptom(&self, symptom: NewSymptom) -> Result<Symptom> {
        symptom.validate().map_err(SymptomRankError::Validation)?;
        let saved = self.store.insert_symptom(&symptom).map_err(Into::into)?;
        tracing::info!("Added symptom {} ({:?})", saved.id, saved.name);
        Ok(saved)
    }

    /// # Errors
    /// `NotFound` if no such symptom exists.
    pub fn get_symptom(&self, id: SymptomId) -> Result<Symptom> {
        self.store
            .get_symptom(id)
            .map_err(Into::into)?
            .ok_or(SymptomRankError::NotFound {
                entity: EntityKind::Symptom,
                id,
            })
    }

    /// # Errors
    /// `Validation` if `limit` is zero or above [`MAX_PAGE_LIMIT`], or `offset`
    /// does not fit a SQL integer.
    pub fn list_symptoms(&self, offset: usize, limit: usize) -> Result<Page<Symptom>> {
        check_paging(offset, limit)?;
        self.store.list_symptoms(offset, limit).map_err(Into::into)
    }

    /// Edit a symptom's name and/or description.
    ///
    /// # Errors
    /// `Validation`, `NotFound` or `DuplicateName`.
    pub fn update_symptom(&self, id: SymptomId, update: SymptomUpdate) -> Result<Symptom> {
        update.validate().map_err(SymptomRankError::Validation)?;
        let updated = self.store.update_symptom(id, &update).map_err(Into::into)?;
        tracing::info!("Updated symptom {}", id);
        Ok(updated)
    }

    /// Delete a symptom that no disease references.
    ///
    /// # Errors
    /// `ReferencedEntity` while any association uses the symptom, `NotFound` if absent.
    pub fn delete_symptom(&self, id: SymptomId) -> Result<()> {
        self.store.delete_symptom(id).map_err(|e| {
            let err: SymptomRankError = e.into();
            if let SymptomRankError::ReferencedEntity { references, .. } = &err {
                tracing::warn!(
                    "Refused to delete symptom {} still used by {} association(s)",
                    id,
                    references
                );
            }
            err
        })
    }

    /// Add a disease.
    ///
    /// # Errors
    /// `Validation` for blank or over-long fields, `DuplicateName` if the name is taken.
    pub fn add_disease(&self, disease: NewDisease) -> Result<Disease> {
        disease.validate().map_err(SymptomRankError::Validation)?;
        let saved = self.store.insert_disease(&disease).map_err(Into::into)?;
        tracing::info!("Added disease {} ({:?})", saved.id, saved.name);
        Ok(saved)
    }

    /// # Errors
    /// `NotFound` if no such disease exists.
    pub fn get_disease(&self, id: DiseaseId) -> Result<Disease> {
        self.store
            .get_disease(id)
            .map_err(Into::into)?
            .ok_or(SymptomRankError::NotFound {
                entity: EntityKind::Disease,
                id,
            })
    }

    /// List diseases, optionally only those in `category`.
    ///
    /// # Errors
    /// `Validation` if `limit` is zero or above [`MAX_PAGE_LIMIT`], or `offset`
    /// does not fit a SQL integer.
    pub fn list_diseases(
        &self,
        category: Option<&str>,
        offset: usize,
        limit: usize,
    ) -> Result<Page<Disease>> {
        check_paging(offset, limit)?;
        self.store
            .list_diseases(category, offset, limit)
            .map_err(Into::into)
    }

    /// # Errors
    /// `Validation`, `NotFound` or `DuplicateName`.
    pub fn update_disease(&self, id: DiseaseId, update: DiseaseUpdate) -> Result<Disease> {
        update.validate().map_err(SymptomRankError::Validation)?;
        let updated = self.store.update_disease(id, &update).map_err(Into::into)?;
        tracing::info!("Updated disease {}", id);
        Ok(updated)
    }

    /// Delete a disease and every association it owns.
    ///
    /// # Errors
    /// `NotFound` if absent.
    pub fn delete_disease(&self, id: DiseaseId) -> Result<()> {
        self.store.delete_disease(id).map_err(Into::into)
    }

    /// Distinct disease categories.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    pub fn list_categories(&self) -> Result<Vec<String>> {
        self.store.list_categories().map_err(Into::into)
    }
}

fn check_paging(offset: usize, limit: usize) -> Result<()> {
    let mut errors = Vec::new();
    if limit == 0 || limit > MAX_PAGE_LIMIT {
        errors.push(format!(
            "Page limit {limit} out of range [1, {MAX_PAGE_LIMIT}]"
        ));
    }
    if i64::try_from(offset).is_err() {
        errors.push(format!("Page offset {offset} exceeds {}", i64::MAX));
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(SymptomRankError::Validation(errors))
    }
}
