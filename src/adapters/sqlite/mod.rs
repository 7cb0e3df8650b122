//! SQLite adapter: Implementation of CatalogStore and AssociationStore.
//!
//! Provides local persistence for the symptom/disease catalog and the
//! weighted associations between them.
//!
//! # Consistency
//!
//! Association replacement runs inside a single transaction: existing rows
//! for the disease are deleted and the new set inserted, or nothing changes.
//! Scoring snapshots are read while holding the connection lock, so a reader
//! observes either the state before a replacement or the state after it.
//!
//! # Mutex Behavior
//!
//! Database connection is protected by `Mutex`. A poisoned mutex (from panic
//! in another thread) will cause panic. This fail-fast behavior is intentional:
//! the knowledge base must not be read or written in an unknown state.
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::domain::{
    validate_replacement, AssociatedSymptom, Association, AssociationCount, AssociationInput,
    Disease, DiseaseAssociations, DiseaseId, DiseaseUpdate, EntityKind, NewDisease, NewSymptom,
    ScoringSnapshot, Symptom, SymptomId, SymptomUpdate,
};
use crate::ports::{AssociationStore, CatalogStore, Page};

/// Error type for storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("{entity} {id} not found")]
    NotFound { entity: EntityKind, id: i64 },

    #[error("A {entity} named {name:?} already exists")]
    DuplicateName { entity: EntityKind, name: String },

    #[error("{entity} {id} is referenced by {references} association(s)")]
    Referenced {
        entity: EntityKind,
        id: i64,
        references: usize,
    },

    #[error("Unknown symptom ids: {0:?}")]
    UnknownSymptoms(Vec<SymptomId>),

    #[error("Invalid data: {}", .0.join("; "))]
    Invalid(Vec<String>),

    #[error("Encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// SQLite storage adapter.
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Create a new SQLite storage with the given database path.
    ///
    /// # Errors
    /// Returns error if database cannot be opened or initialized.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        let storage = Self {
            conn: Mutex::new(conn),
        };
        storage.init_schema()?;
        Ok(storage)
    }

    /// Create an in-memory SQLite database (for testing).
    ///
    /// # Errors
    /// Returns error if database cannot be created.
    pub fn in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let storage = Self {
            conn: Mutex::new(conn),
        };
        storage.init_schema()?;
        Ok(storage)
    }

    /// Initialize the database schema.
    fn init_schema(&self) -> Result<(), StorageError> {
        let conn = self.lock();

        conn.execute_batch(
            r"
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS symptoms (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                description TEXT,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS diseases (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                description TEXT NOT NULL,
                category TEXT,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_diseases_category
                ON diseases(category);

            CREATE TABLE IF NOT EXISTS disease_symptoms (
                disease_id INTEGER NOT NULL REFERENCES diseases(id) ON DELETE CASCADE,
                symptom_id INTEGER NOT NULL REFERENCES symptoms(id) ON DELETE RESTRICT,
                probability REAL NOT NULL CHECK (probability >= 0.0 AND probability <= 1.0),
                is_primary INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (disease_id, symptom_id)
            );

            CREATE INDEX IF NOT EXISTS idx_disease_symptoms_symptom
                ON disease_symptoms(symptom_id);
            ",
        )?;

        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("Lock failed")
    }

    fn fetch_symptom(conn: &Connection, id: SymptomId) -> Result<Option<Symptom>, StorageError> {
        let symptom = conn
            .query_row(
                "SELECT id, name, description, created_at FROM symptoms WHERE id = ?1",
                params![id],
                symptom_from_row,
            )
            .optional()?;
        Ok(symptom)
    }

    fn fetch_disease(conn: &Connection, id: DiseaseId) -> Result<Option<Disease>, StorageError> {
        let disease = conn
            .query_row(
                "SELECT id, name, description, category, created_at FROM diseases WHERE id = ?1",
                params![id],
                disease_from_row,
            )
            .optional()?;
        Ok(disease)
    }

    /// Whether `name` is used by a row of `table` (`symptoms` or `diseases`).
    fn name_taken(conn: &Connection, table: &'static str, name: &str) -> Result<bool, StorageError> {
        let taken: bool = conn.query_row(
            &format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE name = ?1)"),
            params![name],
            |row| row.get(0),
        )?;
        Ok(taken)
    }

    fn count(conn: &Connection, sql: &str, id: i64) -> Result<usize, StorageError> {
        let count: i64 = conn.query_row(sql, params![id], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn fetch_disease_associations(
        conn: &Connection,
        disease_id: DiseaseId,
    ) -> Result<DiseaseAssociations, StorageError> {
        let disease = Self::fetch_disease(conn, disease_id)?.ok_or(StorageError::NotFound {
            entity: EntityKind::Disease,
            id: disease_id,
        })?;

        let mut stmt = conn.prepare(
            r"
            SELECT s.id, s.name, ds.probability, ds.is_primary
            FROM disease_symptoms ds
            JOIN symptoms s ON s.id = ds.symptom_id
            WHERE ds.disease_id = ?1
            ORDER BY ds.probability DESC, s.id
            ",
        )?;
        let symptoms = stmt
            .query_map(params![disease_id], |row| {
                Ok(AssociatedSymptom {
                    symptom_id: row.get(0)?,
                    symptom_name: row.get(1)?,
                    probability: row.get(2)?,
                    is_primary: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(DiseaseAssociations {
            disease_id: disease.id,
            disease_name: disease.name,
            symptoms,
        })
    }

    fn query_associations(
        conn: &Connection,
        sql: &str,
        id: i64,
    ) -> Result<Vec<Association>, StorageError> {
        let mut stmt = conn.prepare(sql)?;
        let associations = stmt
            .query_map(params![id], association_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(associations)
    }
}

fn symptom_from_row(row: &Row<'_>) -> rusqlite::Result<Symptom> {
    Ok(Symptom {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        created_at: row.get(3)?,
    })
}

fn disease_from_row(row: &Row<'_>) -> rusqlite::Result<Disease> {
    Ok(Disease {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        category: row.get(3)?,
        created_at: row.get(4)?,
    })
}

/// Expects columns `disease_id, symptom_id, probability, is_primary`.
fn association_from_row(row: &Row<'_>) -> rusqlite::Result<Association> {
    Ok(Association {
        disease_id: row.get(0)?,
        symptom_id: row.get(1)?,
        probability: row.get(2)?,
        is_primary: row.get(3)?,
    })
}

/// JSON array of ids, bound as a single parameter and expanded with `json_each`
/// so id sets are not limited by SQLite's bound-variable cap.
fn id_array<'a>(ids: impl Iterator<Item = &'a i64>) -> Result<String, StorageError> {
    Ok(serde_json::to_string(&ids.collect::<Vec<_>>())?)
}

/// Paging values beyond `i64::MAX` would wrap to a negative OFFSET/LIMIT.
fn sql_int(value: usize) -> Result<i64, StorageError> {
    i64::try_from(value)
        .map_err(|_| StorageError::Invalid(vec![format!("Paging value {value} exceeds {}", i64::MAX)]))
}

impl CatalogStore for SqliteStorage {
    type Error = StorageError;

    fn insert_symptom(&self, symptom: &NewSymptom) -> Result<Symptom, Self::Error> {
        let conn = self.lock();

        if Self::name_taken(&conn, "symptoms", &symptom.name)? {
            return Err(StorageError::DuplicateName {
                entity: EntityKind::Symptom,
                name: symptom.name.clone(),
            });
        }

        let created_at = Utc::now();
        conn.execute(
            "INSERT INTO symptoms (name, description, created_at) VALUES (?1, ?2, ?3)",
            params![symptom.name, symptom.description, created_at],
        )?;

        let stored = Symptom {
            id: conn.last_insert_rowid(),
            name: symptom.name.clone(),
            description: symptom.description.clone(),
            created_at,
        };
        tracing::debug!("Saved symptom {} to storage", stored.id);
        Ok(stored)
    }

    fn get_symptom(&self, id: SymptomId) -> Result<Option<Symptom>, Self::Error> {
        let conn = self.lock();
        Self::fetch_symptom(&conn, id)
    }

    fn list_symptoms(&self, offset: usize, limit: usize) -> Result<Page<Symptom>, Self::Error> {
        let conn = self.lock();

        let total_count: i64 = conn.query_row("SELECT COUNT(*) FROM symptoms", [], |row| row.get(0))?;

        let mut stmt = conn.prepare(
            r"
            SELECT id, name, description, created_at
            FROM symptoms
            ORDER BY id
            LIMIT ?1 OFFSET ?2
            ",
        )?;
        let symptoms = stmt
            .query_map(params![sql_int(limit)?, sql_int(offset)?], symptom_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(symptoms, total_count as usize, offset, limit))
    }

    fn update_symptom(&self, id: SymptomId, update: &SymptomUpdate) -> Result<Symptom, Self::Error> {
        let conn = self.lock();

        let mut symptom = Self::fetch_symptom(&conn, id)?.ok_or(StorageError::NotFound {
            entity: EntityKind::Symptom,
            id,
        })?;

        if let Some(name) = &update.name {
            if *name != symptom.name && Self::name_taken(&conn, "symptoms", name)? {
                return Err(StorageError::DuplicateName {
                    entity: EntityKind::Symptom,
                    name: name.clone(),
                });
            }
        }

        symptom.apply(update);
        conn.execute(
            "UPDATE symptoms SET name = ?1, description = ?2 WHERE id = ?3",
            params![symptom.name, symptom.description, id],
        )?;

        Ok(symptom)
    }

    fn delete_symptom(&self, id: SymptomId) -> Result<(), Self::Error> {
        let conn = self.lock();

        let references = Self::count(
            &conn,
            "SELECT COUNT(*) FROM disease_symptoms WHERE symptom_id = ?1",
            id,
        )?;
        if references > 0 {
            return Err(StorageError::Referenced {
                entity: EntityKind::Symptom,
                id,
                references,
            });
        }

        let deleted = conn.execute("DELETE FROM symptoms WHERE id = ?1", params![id])?;
        if deleted == 0 {
            return Err(StorageError::NotFound {
                entity: EntityKind::Symptom,
                id,
            });
        }

        tracing::info!("Deleted symptom {} from storage", id);
        Ok(())
    }

    fn insert_disease(&self, disease: &NewDisease) -> Result<Disease, Self::Error> {
        let conn = self.lock();

        if Self::name_taken(&conn, "diseases", &disease.name)? {
            return Err(StorageError::DuplicateName {
                entity: EntityKind::Disease,
                name: disease.name.clone(),
            });
        }

        let created_at = Utc::now();
        conn.execute(
            "INSERT INTO diseases (name, description, category, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![disease.name, disease.description, disease.category, created_at],
        )?;

        let stored = Disease {
            id: conn.last_insert_rowid(),
            name: disease.name.clone(),
            description: disease.description.clone(),
            category: disease.category.clone(),
            created_at,
        };
        tracing::debug!("Saved disease {} to storage", stored.id);
        Ok(stored)
    }

    fn get_disease(&self, id: DiseaseId) -> Result<Option<Disease>, Self::Error> {
        let conn = self.lock();
        Self::fetch_disease(&conn, id)
    }

    fn list_diseases(
        &self,
        category: Option<&str>,
        offset: usize,
        limit: usize,
    ) -> Result<Page<Disease>, Self::Error> {
        let conn = self.lock();

        let total_count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM diseases WHERE (?1 IS NULL OR category = ?1)",
            params![category],
            |row| row.get(0),
        )?;

        let mut stmt = conn.prepare(
            r"
            SELECT id, name, description, category, created_at
            FROM diseases
            WHERE (?1 IS NULL OR category = ?1)
            ORDER BY id
            LIMIT ?2 OFFSET ?3
            ",
        )?;
        let diseases = stmt
            .query_map(
                params![category, sql_int(limit)?, sql_int(offset)?],
                disease_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(diseases, total_count as usize, offset, limit))
    }

    fn update_disease(&self, id: DiseaseId, update: &DiseaseUpdate) -> Result<Disease, Self::Error> {
        let conn = self.lock();

        let mut disease = Self::fetch_disease(&conn, id)?.ok_or(StorageError::NotFound {
            entity: EntityKind::Disease,
            id,
        })?;

        if let Some(name) = &update.name {
            if *name != disease.name && Self::name_taken(&conn, "diseases", name)? {
                return Err(StorageError::DuplicateName {
                    entity: EntityKind::Disease,
                    name: name.clone(),
                });
            }
        }

        disease.apply(update);
        conn.execute(
            "UPDATE diseases SET name = ?1, description = ?2, category = ?3 WHERE id = ?4",
            params![disease.name, disease.description, disease.category, id],
        )?;

        Ok(disease)
    }

    fn delete_disease(&self, id: DiseaseId) -> Result<(), Self::Error> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;

        let removed = tx.execute(
            "DELETE FROM disease_symptoms WHERE disease_id = ?1",
            params![id],
        )?;
        let deleted = tx.execute("DELETE FROM diseases WHERE id = ?1", params![id])?;
        if deleted == 0 {
            return Err(StorageError::NotFound {
                entity: EntityKind::Disease,
                id,
            });
        }

        tx.commit()?;
        tracing::info!(
            "Deleted disease {} and {} association(s) from storage",
            id,
            removed
        );
        Ok(())
    }

    fn list_categories(&self) -> Result<Vec<String>, Self::Error> {
        let conn = self.lock();

        let mut stmt = conn.prepare(
            "SELECT DISTINCT category FROM diseases WHERE category IS NOT NULL ORDER BY category",
        )?;
        let categories = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;

        Ok(categories)
    }
}

impl AssociationStore for SqliteStorage {
    type Error = StorageError;

    fn associations_for_disease(&self, disease_id: DiseaseId) -> Result<Vec<Association>, Self::Error> {
        let conn = self.lock();
        Self::query_associations(
            &conn,
            r"
            SELECT disease_id, symptom_id, probability, is_primary
            FROM disease_symptoms
            WHERE disease_id = ?1
            ORDER BY probability DESC, symptom_id
            ",
            disease_id,
        )
    }

    fn associations_for_symptom(&self, symptom_id: SymptomId) -> Result<Vec<Association>, Self::Error> {
        let conn = self.lock();
        Self::query_associations(
            &conn,
            r"
            SELECT disease_id, symptom_id, probability, is_primary
            FROM disease_symptoms
            WHERE symptom_id = ?1
            ORDER BY disease_id
            ",
            symptom_id,
        )
    }

    fn disease_associations(&self, disease_id: DiseaseId) -> Result<DiseaseAssociations, Self::Error> {
        let conn = self.lock();
        Self::fetch_disease_associations(&conn, disease_id)
    }

    fn replace_associations_for_disease(
        &self,
        disease_id: DiseaseId,
        items: &[AssociationInput],
    ) -> Result<DiseaseAssociations, Self::Error> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;

        if Self::fetch_disease(&tx, disease_id)?.is_none() {
            return Err(StorageError::NotFound {
                entity: EntityKind::Disease,
                id: disease_id,
            });
        }

        validate_replacement(items).map_err(StorageError::Invalid)?;

        if !items.is_empty() {
            let requested: BTreeSet<SymptomId> = items.iter().map(|i| i.symptom_id).collect();
            let mut stmt =
                tx.prepare("SELECT id FROM symptoms WHERE id IN (SELECT value FROM json_each(?1))")?;
            let existing = stmt
                .query_map(params![id_array(requested.iter())?], |row| row.get(0))?
                .collect::<Result<BTreeSet<SymptomId>, _>>()?;

            let unknown: Vec<SymptomId> = requested.difference(&existing).copied().collect();
            if !unknown.is_empty() {
                return Err(StorageError::UnknownSymptoms(unknown));
            }
        }

        let removed = tx.execute(
            "DELETE FROM disease_symptoms WHERE disease_id = ?1",
            params![disease_id],
        )?;

        {
            let mut insert = tx.prepare(
                r"
                INSERT INTO disease_symptoms (disease_id, symptom_id, probability, is_primary)
                VALUES (?1, ?2, ?3, ?4)
                ",
            )?;
            for item in items {
                insert.execute(params![
                    disease_id,
                    item.symptom_id,
                    item.probability,
                    item.is_primary,
                ])?;
            }
        }

        let stored = Self::fetch_disease_associations(&tx, disease_id)?;
        tx.commit()?;
        tracing::info!(
            "Replaced associations of disease {}: removed {}, inserted {}",
            disease_id,
            removed,
            items.len()
        );
        Ok(stored)
    }

    fn association_counts(&self) -> Result<Vec<AssociationCount>, Self::Error> {
        let conn = self.lock();

        let mut stmt = conn.prepare(
            r"
            SELECT d.id, d.name, COUNT(ds.symptom_id)
            FROM diseases d
            LEFT JOIN disease_symptoms ds ON ds.disease_id = d.id
            GROUP BY d.id, d.name
            ORDER BY d.id
            ",
        )?;
        let counts = stmt
            .query_map([], |row| {
                let count: i64 = row.get(2)?;
                Ok(AssociationCount {
                    disease_id: row.get(0)?,
                    disease_name: row.get(1)?,
                    symptom_count: count as usize,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(counts)
    }

    fn scoring_snapshot(&self, symptom_ids: &[SymptomId]) -> Result<ScoringSnapshot, Self::Error> {
        let mut snapshot = ScoringSnapshot::new();
        if symptom_ids.is_empty() {
            return Ok(snapshot);
        }

        // Held across both queries so no replacement can land in between.
        let conn = self.lock();
        let ids = id_array(symptom_ids.iter())?;

        let mut stmt = conn
            .prepare("SELECT id, name FROM symptoms WHERE id IN (SELECT value FROM json_each(?1))")?;
        let symptoms = stmt
            .query_map(params![ids], |row| {
                Ok((row.get::<_, SymptomId>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        for (id, name) in symptoms {
            snapshot.insert_symptom(id, name);
        }

        let mut stmt = conn.prepare(
            r"
            SELECT d.id, d.name, d.description, d.category, d.created_at,
                   ds.symptom_id, ds.probability, ds.is_primary
            FROM diseases d
            JOIN disease_symptoms ds ON ds.disease_id = d.id
            WHERE d.id IN (
                SELECT disease_id FROM disease_symptoms
                WHERE symptom_id IN (SELECT value FROM json_each(?1))
            )
            ORDER BY d.id, ds.symptom_id
            ",
        )?;
        let rows = stmt.query_map(params![ids], |row| {
            let disease = disease_from_row(row)?;
            let association = Association {
                disease_id: disease.id,
                symptom_id: row.get(5)?,
                probability: row.get(6)?,
                is_primary: row.get(7)?,
            };
            Ok((disease, association))
        })?;

        let mut grouped: BTreeMap<DiseaseId, (Disease, Vec<Association>)> = BTreeMap::new();
        for row in rows {
            let (disease, association) = row?;
            grouped
                .entry(disease.id)
                .or_insert_with(|| (disease, Vec::new()))
                .1
                .push(association);
        }
        for (_, (disease, associations)) in grouped {
            snapshot.insert_disease(disease, associations);
        }

        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage() -> SqliteStorage {
        SqliteStorage::in_memory().expect("Should create db")
    }

    fn add_symptom(storage: &SqliteStorage, name: &str) -> SymptomId {
        storage
            .insert_symptom(&NewSymptom::new(name))
            .expect("Should save symptom")
            .id
    }

    fn add_disease(storage: &SqliteStorage, name: &str, category: Option<&str>) -> DiseaseId {
        let mut disease = NewDisease::new(name, format!("{name} description"));
        disease.category = category.map(str::to_string);
        storage.insert_disease(&disease).expect("Should save disease").id
    }

    #[test]
    fn test_symptom_crud() {
        let storage = storage();

        let saved = storage
            .insert_symptom(&NewSymptom::new("Fever").with_description("Above 38C"))
            .expect("Should save");
        let loaded = storage
            .get_symptom(saved.id)
            .expect("Should load")
            .expect("Should exist");
        assert_eq!(loaded.name, "Fever");
        assert_eq!(loaded.description.as_deref(), Some("Above 38C"));

        let updated = storage
            .update_symptom(
                saved.id,
                &SymptomUpdate {
                    name: Some("High fever".to_string()),
                    description: Some(None),
                },
            )
            .expect("Should update");
        assert_eq!(updated.name, "High fever");
        assert!(updated.description.is_none());

        storage.delete_symptom(saved.id).expect("Should delete");
        assert!(storage.get_symptom(saved.id).expect("Should load").is_none());
    }

    #[test]
    fn test_duplicate_names_are_case_sensitive() {
        let storage = storage();
        add_symptom(&storage, "Cough");

        let err = storage
            .insert_symptom(&NewSymptom::new("Cough"))
            .expect_err("Should reject duplicate");
        assert!(matches!(err, StorageError::DuplicateName { .. }));

        assert!(storage.insert_symptom(&NewSymptom::new("cough")).is_ok());
    }

    #[test]
    fn test_rename_to_taken_name_rejected() {
        let storage = storage();
        add_disease(&storage, "Influenza", None);
        let cold = add_disease(&storage, "Common cold", None);

        let err = storage
            .update_disease(
                cold,
                &DiseaseUpdate {
                    name: Some("Influenza".to_string()),
                    ..Default::default()
                },
            )
            .expect_err("Should reject");
        assert!(matches!(err, StorageError::DuplicateName { .. }));

        // Keeping its own name is not a conflict.
        assert!(storage
            .update_disease(
                cold,
                &DiseaseUpdate {
                    name: Some("Common cold".to_string()),
                    ..Default::default()
                },
            )
            .is_ok());
    }

    #[test]
    fn test_replace_roundtrip_and_idempotence() {
        let storage = storage();
        let fever = add_symptom(&storage, "Fever");
        let cough = add_symptom(&storage, "Cough");
        let flu = add_disease(&storage, "Influenza", Some("Respiratory"));

        storage
            .replace_associations_for_disease(flu, &[AssociationInput::new(fever, 0.2)])
            .expect("Should replace");

        let items = vec![
            AssociationInput::new(cough, 0.6),
            AssociationInput::primary(fever, 0.9),
        ];
        storage
            .replace_associations_for_disease(flu, &items)
            .expect("Should replace");
        let once = storage.associations_for_disease(flu).expect("Should load");

        storage
            .replace_associations_for_disease(flu, &items)
            .expect("Should replace");
        let twice = storage.associations_for_disease(flu).expect("Should load");

        assert_eq!(once, twice);
        assert_eq!(
            once,
            vec![
                AssociationInput::primary(fever, 0.9).into_association(flu),
                AssociationInput::new(cough, 0.6).into_association(flu),
            ]
        );
    }

    #[test]
    fn test_replace_with_unknown_symptom_keeps_prior_state() {
        let storage = storage();
        let fever = add_symptom(&storage, "Fever");
        let flu = add_disease(&storage, "Influenza", None);
        storage
            .replace_associations_for_disease(flu, &[AssociationInput::new(fever, 0.9)])
            .expect("Should replace");

        let err = storage
            .replace_associations_for_disease(
                flu,
                &[AssociationInput::new(fever, 0.5), AssociationInput::new(404, 0.5)],
            )
            .expect_err("Should reject");
        assert!(matches!(err, StorageError::UnknownSymptoms(ref ids) if ids == &vec![404]));

        let stored = storage.associations_for_disease(flu).expect("Should load");
        assert_eq!(stored, vec![AssociationInput::new(fever, 0.9).into_association(flu)]);
    }

    #[test]
    fn test_replace_rejects_out_of_range_and_missing_disease() {
        let storage = storage();
        let fever = add_symptom(&storage, "Fever");
        let flu = add_disease(&storage, "Influenza", None);

        let err = storage
            .replace_associations_for_disease(flu, &[AssociationInput::new(fever, 1.2)])
            .expect_err("Should reject");
        assert!(matches!(err, StorageError::Invalid(_)));

        let err = storage
            .replace_associations_for_disease(999, &[AssociationInput::new(fever, 0.5)])
            .expect_err("Should reject");
        assert!(matches!(err, StorageError::NotFound { entity: EntityKind::Disease, id: 999 }));
    }

    #[test]
    fn test_missing_disease_checked_before_item_validation() {
        let storage = storage();
        let fever = add_symptom(&storage, "Fever");

        let err = storage
            .replace_associations_for_disease(
                999,
                &[AssociationInput::new(fever, 1.5), AssociationInput::new(fever, 0.2)],
            )
            .expect_err("Should reject");
        assert!(matches!(err, StorageError::NotFound { entity: EntityKind::Disease, id: 999 }));
    }

    #[test]
    fn test_replace_returns_view_from_same_transaction() {
        let storage = storage();
        let fever = add_symptom(&storage, "Fever");
        let cough = add_symptom(&storage, "Cough");
        let flu = add_disease(&storage, "Influenza", None);

        let view = storage
            .replace_associations_for_disease(
                flu,
                &[AssociationInput::new(cough, 0.6), AssociationInput::primary(fever, 0.9)],
            )
            .expect("Should replace");

        assert_eq!(view, storage.disease_associations(flu).expect("Should load"));
        assert_eq!(view.symptoms[0].symptom_id, fever);
    }

    #[test]
    fn test_large_id_sets_bind_as_one_parameter() {
        let storage = storage();
        let fever = add_symptom(&storage, "Fever");
        let flu = add_disease(&storage, "Influenza", None);
        storage
            .replace_associations_for_disease(flu, &[AssociationInput::new(fever, 0.9)])
            .expect("Should replace");

        let mut query: Vec<SymptomId> = (100_000..140_000).collect();
        query.push(fever);
        let snapshot = storage.scoring_snapshot(&query).expect("Should load");
        assert_eq!(snapshot.disease_count(), 1);
        assert!(snapshot.is_known_symptom(fever));

        let items: Vec<AssociationInput> = (100_000..140_000)
            .map(|id| AssociationInput::new(id, 0.5))
            .collect();
        let err = storage
            .replace_associations_for_disease(flu, &items)
            .expect_err("Should reject");
        assert!(matches!(err, StorageError::UnknownSymptoms(ref ids) if ids.len() == 40_000));
        assert_eq!(storage.associations_for_disease(flu).expect("Should load").len(), 1);
    }

    #[test]
    fn test_empty_replacement_clears() {
        let storage = storage();
        let fever = add_symptom(&storage, "Fever");
        let flu = add_disease(&storage, "Influenza", None);
        storage
            .replace_associations_for_disease(flu, &[AssociationInput::new(fever, 0.9)])
            .expect("Should replace");

        storage
            .replace_associations_for_disease(flu, &[])
            .expect("Should clear");

        assert!(storage.associations_for_disease(flu).expect("Should load").is_empty());
        assert!(storage.associations_for_symptom(fever).expect("Should load").is_empty());
    }

    #[test]
    fn test_referenced_symptom_cannot_be_deleted() {
        let storage = storage();
        let fever = add_symptom(&storage, "Fever");
        let flu = add_disease(&storage, "Influenza", None);
        let cold = add_disease(&storage, "Common cold", None);
        for disease in [flu, cold] {
            storage
                .replace_associations_for_disease(disease, &[AssociationInput::new(fever, 0.5)])
                .expect("Should replace");
        }

        let err = storage.delete_symptom(fever).expect_err("Should reject");
        assert!(matches!(err, StorageError::Referenced { references: 2, .. }));
        assert!(storage.get_symptom(fever).expect("Should load").is_some());
    }

    #[test]
    fn test_disease_delete_removes_its_associations() {
        let storage = storage();
        let fever = add_symptom(&storage, "Fever");
        let flu = add_disease(&storage, "Influenza", None);
        storage
            .replace_associations_for_disease(flu, &[AssociationInput::new(fever, 0.9)])
            .expect("Should replace");

        storage.delete_disease(flu).expect("Should delete");

        assert!(storage.get_disease(flu).expect("Should load").is_none());
        assert!(storage.associations_for_symptom(fever).expect("Should load").is_empty());
        storage.delete_symptom(fever).expect("Should delete unreferenced symptom");

        let err = storage.delete_disease(flu).expect_err("Should be gone");
        assert!(matches!(err, StorageError::NotFound { .. }));
    }

    #[test]
    fn test_disease_listing_categories_and_counts() {
        let storage = storage();
        let fever = add_symptom(&storage, "Fever");
        let flu = add_disease(&storage, "Influenza", Some("Respiratory"));
        add_disease(&storage, "Common cold", Some("Respiratory"));
        add_disease(&storage, "Food poisoning", Some("Digestive"));
        add_disease(&storage, "Unsorted", None);
        storage
            .replace_associations_for_disease(flu, &[AssociationInput::new(fever, 0.9)])
            .expect("Should replace");

        let respiratory = storage
            .list_diseases(Some("Respiratory"), 0, 1)
            .expect("Should list");
        assert_eq!(respiratory.total_count, 2);
        assert_eq!(respiratory.items.len(), 1);
        assert_eq!(respiratory.items[0].name, "Influenza");
        assert!(respiratory.has_more);

        let all = storage.list_diseases(None, 0, 100).expect("Should list");
        assert_eq!(all.total_count, 4);

        assert_eq!(
            storage.list_categories().expect("Should list"),
            vec!["Digestive".to_string(), "Respiratory".to_string()]
        );

        let counts = storage.association_counts().expect("Should count");
        assert_eq!(counts.len(), 4);
        assert_eq!(counts[0].symptom_count, 1);
        assert!(counts[1..].iter().all(|c| c.symptom_count == 0));
    }

    #[test]
    fn test_disease_associations_include_names() {
        let storage = storage();
        let fever = add_symptom(&storage, "Fever");
        let cough = add_symptom(&storage, "Cough");
        let flu = add_disease(&storage, "Influenza", None);
        storage
            .replace_associations_for_disease(
                flu,
                &[AssociationInput::new(cough, 0.6), AssociationInput::primary(fever, 0.9)],
            )
            .expect("Should replace");

        let view = storage.disease_associations(flu).expect("Should load");
        assert_eq!(view.disease_name, "Influenza");
        let names: Vec<&str> = view.symptoms.iter().map(|s| s.symptom_name.as_str()).collect();
        assert_eq!(names, vec!["Fever", "Cough"]);
        assert!(view.symptoms[0].is_primary);

        assert!(matches!(
            storage.disease_associations(999),
            Err(StorageError::NotFound { .. })
        ));
    }

    #[test]
    fn test_scoring_snapshot_loads_full_candidate_sets() {
        let storage = storage();
        let fever = add_symptom(&storage, "Fever");
        let cough = add_symptom(&storage, "Cough");
        let rash = add_symptom(&storage, "Rash");
        let flu = add_disease(&storage, "Influenza", None);
        let measles = add_disease(&storage, "Measles", None);
        storage
            .replace_associations_for_disease(
                flu,
                &[AssociationInput::new(fever, 0.9), AssociationInput::new(cough, 0.6)],
            )
            .expect("Should replace");
        storage
            .replace_associations_for_disease(measles, &[AssociationInput::new(rash, 0.9)])
            .expect("Should replace");

        let snapshot = storage.scoring_snapshot(&[fever, 777]).expect("Should load");

        assert_eq!(snapshot.disease_count(), 1);
        assert_eq!(snapshot.associations(flu).len(), 2);
        assert!(snapshot.associations(measles).is_empty());
        assert!(snapshot.is_known_symptom(fever));
        assert!(!snapshot.is_known_symptom(777));
    }

    #[test]
    fn test_data_persists_across_reopen() {
        let dir = tempfile::tempdir().expect("Should create temp dir");
        let path = dir.path().join("knowledge.db");

        let (fever, flu) = {
            let storage = SqliteStorage::new(&path).expect("Should open");
            let fever = add_symptom(&storage, "Fever");
            let flu = add_disease(&storage, "Influenza", Some("Respiratory"));
            storage
                .replace_associations_for_disease(flu, &[AssociationInput::primary(fever, 0.9)])
                .expect("Should replace");
            (fever, flu)
        };

        let reopened = SqliteStorage::new(&path).expect("Should reopen");
        let stored = reopened.associations_for_disease(flu).expect("Should load");
        assert_eq!(stored, vec![AssociationInput::primary(fever, 0.9).into_association(flu)]);
    }
}
