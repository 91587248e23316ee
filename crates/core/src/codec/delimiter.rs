use serde::{Deserialize, Serialize};

use crate::codec::CodecError;

const DEFAULT_FIELD_DELIMITER: &str = "\t";
const DEFAULT_RECORD_DELIMITER: &str = "\n";

/// Separator between the columns of one record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "kebab-case")]
pub enum FieldDelimiter {
    #[default]
    Tab,
    Comma,
    Pipe,
    Semicolon,
    Custom(String),
}

impl FieldDelimiter {
    /// The literal separator. An empty custom string falls back to a tab so
    /// a half-typed delimiter never breaks the live preview.
    #[must_use]
    pub fn resolve(&self) -> &str {
        match self {
            FieldDelimiter::Tab => "\t",
            FieldDelimiter::Comma => ",",
            FieldDelimiter::Pipe => "|",
            FieldDelimiter::Semicolon => ";",
            FieldDelimiter::Custom(custom) if custom.is_empty() => DEFAULT_FIELD_DELIMITER,
            FieldDelimiter::Custom(custom) => custom,
        }
    }
}

/// Separator between records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "kebab-case")]
pub enum RecordDelimiter {
    #[default]
    Newline,
    DoubleNewline,
    Custom(String),
}

impl RecordDelimiter {
    /// The literal separator; an empty custom string falls back to `\n`.
    #[must_use]
    pub fn resolve(&self) -> &str {
        match self {
            RecordDelimiter::Newline => "\n",
            RecordDelimiter::DoubleNewline => "\n\n",
            RecordDelimiter::Custom(custom) if custom.is_empty() => DEFAULT_RECORD_DELIMITER,
            RecordDelimiter::Custom(custom) => custom,
        }
    }
}

/// The user's delimiter choice for bulk import and export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelimiterConfig {
    #[serde(default)]
    pub field: FieldDelimiter,
    #[serde(default)]
    pub record: RecordDelimiter,
}

impl DelimiterConfig {
    #[must_use]
    pub fn new(field: FieldDelimiter, record: RecordDelimiter) -> Self {
        Self { field, record }
    }

    /// Stricter check applied when the import is submitted: a custom
    /// delimiter must be spelled out. Parsing itself never requires this.
    ///
    /// # Errors
    ///
    /// Returns `CodecError::EmptyCustomFieldDelimiter` or
    /// `CodecError::EmptyCustomRecordDelimiter`.
    pub fn validate_for_submit(&self) -> Result<(), CodecError> {
        if matches!(&self.field, FieldDelimiter::Custom(custom) if custom.trim().is_empty()) {
            return Err(CodecError::EmptyCustomFieldDelimiter);
        }
        if matches!(&self.record, RecordDelimiter::Custom(custom) if custom.trim().is_empty()) {
            return Err(CodecError::EmptyCustomRecordDelimiter);
        }
        Ok(())
    }
}
