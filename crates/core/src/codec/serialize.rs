use crate::codec::{DelimiterConfig, ParsedRecord};
use crate::model::CustomFieldRegistry;

/// Which logical columns an export emits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMask {
    pub front: bool,
    pub back: bool,
    /// One flag per registry field; missing flags count as excluded.
    pub custom: Vec<bool>,
}

impl ColumnMask {
    /// Every column, for `registry_size` custom fields.
    #[must_use]
    pub fn all(registry_size: usize) -> Self {
        Self {
            front: true,
            back: true,
            custom: vec![true; registry_size],
        }
    }

    /// Front and back only.
    #[must_use]
    pub fn sides_only() -> Self {
        Self {
            front: true,
            back: true,
            custom: Vec::new(),
        }
    }

    #[must_use]
    pub fn includes_custom(&self, index: usize) -> bool {
        self.custom.get(index).copied().unwrap_or(false)
    }
}

/// Renders records as delimited text for export.
///
/// A missing custom value becomes an empty column so later columns keep
/// their position. Values are written verbatim.
#[must_use]
pub fn serialize(
    records: &[ParsedRecord],
    config: &DelimiterConfig,
    registry: &CustomFieldRegistry,
    mask: &ColumnMask,
) -> String {
    let field_delimiter = config.field.resolve();
    records
        .iter()
        .map(|record| {
            let mut columns: Vec<&str> = Vec::with_capacity(2 + registry.len());
            if mask.front {
                columns.push(&record.front);
            }
            if mask.back {
                columns.push(&record.back);
            }
            for index in (0..registry.len()).filter(|i| mask.includes_custom(*i)) {
                let value = record
                    .custom_values
                    .get(index)
                    .and_then(Option::as_deref)
                    .unwrap_or_default();
                columns.push(value);
            }
            columns.join(field_delimiter)
        })
        .collect::<Vec<_>>()
        .join(config.record.resolve())
}
