//! Catalog records: the canonical symptoms and diseases that associations reference.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stable identifier of a symptom.
pub type SymptomId = i64;

/// Stable identifier of a disease.
pub type DiseaseId = i64;

/// Maximum length (in characters) of symptom and disease names.
pub const MAX_NAME_LEN: usize = 100;

/// Maximum length (in characters) of a disease category tag.
pub const MAX_CATEGORY_LEN: usize = 50;

/// Kind of catalog entity, used to label errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Symptom,
    Disease,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Symptom => write!(f, "symptom"),
            Self::Disease => write!(f, "disease"),
        }
    }
}

/// An observable symptom.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symptom {
    pub id: SymptomId,

    /// Unique (case-sensitive) display name
    pub name: String,

    pub description: Option<String>,

    pub created_at: DateTime<Utc>,
}

impl Symptom {
    /// Apply a partial update in place.
    pub fn apply(&mut self, update: &SymptomUpdate) {
        if let Some(name) = &update.name {
            self.name = name.clone();
        }
        if let Some(description) = &update.description {
            self.description = description.clone();
        }
    }
}

/// A disease that can be ranked against a symptom query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Disease {
    pub id: DiseaseId,

    /// Unique (case-sensitive) display name
    pub name: String,

    /// Non-empty clinical description
    pub description: String,

    /// Grouping tag for display; never used for scoring
    pub category: Option<String>,

    pub created_at: DateTime<Utc>,
}

impl Disease {
    /// Apply a partial update in place.
    pub fn apply(&mut self, update: &DiseaseUpdate) {
        if let Some(name) = &update.name {
            self.name = name.clone();
        }
        if let Some(description) = &update.description {
            self.description = description.clone();
        }
        if let Some(category) = &update.category {
            self.category = category.clone();
        }
    }
}

/// Input for creating a symptom.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewSymptom {
    pub name: String,
    pub description: Option<String>,
}

impl NewSymptom {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Validate the record before it reaches storage.
    ///
    /// # Errors
    /// Returns every problem found, one message per field.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        check_name("Symptom name", &self.name, &mut errors);
        into_result(errors)
    }
}

/// Input for creating a disease.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewDisease {
    pub name: String,
    pub description: String,
    pub category: Option<String>,
}

impl NewDisease {
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            category: None,
        }
    }

    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Validate the record before it reaches storage.
    ///
    /// # Errors
    /// Returns every problem found, one message per field.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        check_name("Disease name", &self.name, &mut errors);
        check_description(&self.description, &mut errors);
        if let Some(category) = &self.category {
            check_category(category, &mut errors);
        }
        into_result(errors)
    }
}

/// Partial update of a symptom. `None` leaves a field untouched;
/// `description: Some(None)` clears the description.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SymptomUpdate {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
}

impl SymptomUpdate {
    /// Validate the fields being changed.
    ///
    /// # Errors
    /// Returns every problem found, one message per field.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        if let Some(name) = &self.name {
            check_name("Symptom name", name, &mut errors);
        }
        into_result(errors)
    }
}

/// Partial update of a disease. `category: Some(None)` clears the category.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiseaseUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<Option<String>>,
}

impl DiseaseUpdate {
    /// Validate the fields being changed.
    ///
    /// # Errors
    /// Returns every problem found, one message per field.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        if let Some(name) = &self.name {
            check_name("Disease name", name, &mut errors);
        }
        if let Some(description) = &self.description {
            check_description(description, &mut errors);
        }
        if let Some(Some(category)) = &self.category {
            check_category(category, &mut errors);
        }
        into_result(errors)
    }
}

fn check_name(label: &str, name: &str, errors: &mut Vec<String>) {
    if name.trim().is_empty() {
        errors.push(format!("{label} must not be empty"));
    } else if name.chars().count() > MAX_NAME_LEN {
        errors.push(format!("{label} exceeds {MAX_NAME_LEN} characters"));
    }
}

fn check_description(description: &str, errors: &mut Vec<String>) {
    if description.trim().is_empty() {
        errors.push("Disease description must not be empty".to_string());
    }
}

fn check_category(category: &str, errors: &mut Vec<String>) {
    if category.trim().is_empty() {
        errors.push("Disease category must not be blank".to_string());
    } else if category.chars().count() > MAX_CATEGORY_LEN {
        errors.push(format!(
            "Disease category exceeds {MAX_CATEGORY_LEN} characters"
        ));
    }
}

fn into_result(errors: Vec<String>) -> Result<(), Vec<String>> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
