use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::FieldKey;
use crate::slug::derive_name;

/// Maximum number of custom fields a deck may define.
pub const MAX_CUSTOM_FIELDS: usize = 5;

/// Fixed card attributes; a custom field may not shadow any of them.
pub const RESERVED_FIELD_NAMES: [&str; 10] = [
    "front",
    "back",
    "id",
    "deck_id",
    "accuracy",
    "total_attempts",
    "correct_answers",
    "last_reviewed_at",
    "created_at",
    "audio_url",
];

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum FieldError {
    #[error("field label cannot be empty")]
    EmptyLabel { index: usize },

    #[error("field label must contain letters or digits")]
    EmptyName { index: usize },

    #[error("field name '{name}' is reserved")]
    ReservedName { index: usize, name: String },

    #[error("duplicate field name: {name}")]
    DuplicateName { index: usize, name: String },

    #[error("maximum {max} custom fields allowed")]
    TooMany { count: usize, max: usize },
}

impl FieldError {
    /// Index of the offending entry, or `None` for registry-level errors.
    #[must_use]
    pub fn index(&self) -> Option<usize> {
        match self {
            FieldError::EmptyLabel { index }
            | FieldError::EmptyName { index }
            | FieldError::ReservedName { index, .. }
            | FieldError::DuplicateName { index, .. } => Some(*index),
            FieldError::TooMany { .. } => None,
        }
    }
}

//
// ─── DEFINITION ────────────────────────────────────────────────────────────────
//

/// One custom field: a user-facing label and the derived storage name.
///
/// Equality compares `name` and `label` only; the client-side key is an
/// identity handle, not part of the deck's schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomFieldDef {
    name: String,
    label: String,
    #[serde(skip)]
    key: FieldKey,
}

impl CustomFieldDef {
    /// Builds a definition whose name is derived from `label`.
    #[must_use]
    pub fn from_label(label: impl Into<String>) -> Self {
        let label = label.into();
        Self {
            name: derive_name(&label),
            label,
            key: FieldKey::new(),
        }
    }

    /// Builds a definition with an explicit name, as stored server-side.
    #[must_use]
    pub fn new(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            key: FieldKey::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn key(&self) -> FieldKey {
        self.key
    }
}

impl PartialEq for CustomFieldDef {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.label == other.label
    }
}

impl Eq for CustomFieldDef {}

//
// ─── REGISTRY ──────────────────────────────────────────────────────────────────
//

/// Ordered custom-field schema of a deck.
///
/// The registry never touches cards. Removing or renaming a field is
/// cascaded into card data by [`crate::model::DeckDraft`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomFieldRegistry {
    fields: Vec<CustomFieldDef>,
}

impl CustomFieldRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps definitions loaded from the server without validating them.
    #[must_use]
    pub fn from_defs(fields: Vec<CustomFieldDef>) -> Self {
        Self { fields }
    }

    /// Appends an empty definition.
    ///
    /// Returns `false` and leaves the registry unchanged when it already holds
    /// [`MAX_CUSTOM_FIELDS`] entries.
    pub fn add(&mut self) -> bool {
        if self.fields.len() >= MAX_CUSTOM_FIELDS {
            return false;
        }
        self.fields.push(CustomFieldDef::from_label(""));
        true
    }

    /// Removes and returns the definition at `index`.
    pub fn remove(&mut self, index: usize) -> Option<CustomFieldDef> {
        (index < self.fields.len()).then(|| self.fields.remove(index))
    }

    /// Replaces the label at `index` and recomputes the derived name.
    ///
    /// Returns `false` if `index` is out of bounds.
    pub fn set_label(&mut self, index: usize, label: impl Into<String>) -> bool {
        let Some(field) = self.fields.get_mut(index) else {
            return false;
        };
        let label = label.into();
        field.name = derive_name(&label);
        field.label = label;
        true
    }

    /// Checks labels, names and cardinality.
    ///
    /// Entry-level problems are reported before the registry-level count.
    ///
    /// # Errors
    ///
    /// Returns the first `FieldError` found.
    pub fn validate(&self) -> Result<(), FieldError> {
        for (index, field) in self.fields.iter().enumerate() {
            if field.label.trim().is_empty() {
                return Err(FieldError::EmptyLabel { index });
            }
            if field.name.is_empty() {
                return Err(FieldError::EmptyName { index });
            }
            if RESERVED_FIELD_NAMES.contains(&field.name.as_str()) {
                return Err(FieldError::ReservedName {
                    index,
                    name: field.name.clone(),
                });
            }
            if self.fields[..index].iter().any(|f| f.name == field.name) {
                return Err(FieldError::DuplicateName {
                    index,
                    name: field.name.clone(),
                });
            }
        }

        if self.fields.len() > MAX_CUSTOM_FIELDS {
            return Err(FieldError::TooMany {
                count: self.fields.len(),
                max: MAX_CUSTOM_FIELDS,
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&CustomFieldDef> {
        self.fields.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CustomFieldDef> {
        self.fields.iter()
    }

    /// Position of the first field named `name`.
    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Field names in registry order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// Definitions worth sending when a deck is created: rows the user left
    /// blank are dropped.
    #[must_use]
    pub fn for_creation(&self) -> Vec<CustomFieldDef> {
        self.fields
            .iter()
            .filter(|f| !f.label.trim().is_empty())
            .cloned()
            .collect()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
