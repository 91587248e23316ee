use serde::Serialize;

use crate::codec::{DelimiterConfig, ParsedRecord, parse};
use crate::model::CustomFieldRegistry;

/// Number of records shown in a live import preview.
pub const PREVIEW_LIMIT: usize = 5;

/// What the import box shows while the user types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportPreview {
    /// Records detected in the whole text.
    pub total: usize,
    /// The first [`PREVIEW_LIMIT`] records.
    pub sample: Vec<ParsedRecord>,
    /// Text is non-blank and at least one record was detected.
    pub has_valid_format: bool,
}

/// Parses `text` for display. Cheap enough to run on every keystroke.
#[must_use]
pub fn preview(text: &str, config: &DelimiterConfig, registry_size: usize) -> ImportPreview {
    let mut records = parse(text, config, registry_size);
    let total = records.len();
    records.truncate(PREVIEW_LIMIT);
    ImportPreview {
        total,
        sample: records,
        has_valid_format: total > 0,
    }
}

/// Example-format hint for an empty import box, spelled with the resolved
/// delimiters and the registry's labels.
#[must_use]
pub fn placeholder(config: &DelimiterConfig, registry: &CustomFieldRegistry) -> String {
    let field = config.field.resolve();
    let record = config.record.resolve();
    let basic = ["<front>", "<back>"].join(field);

    let mut hint = format!("Example formats:\n\nBasic: {basic}");
    if !registry.is_empty() {
        let custom: Vec<String> = registry
            .iter()
            .enumerate()
            .map(|(index, def)| match def.label().trim() {
                "" => format!("<field {}>", index + 1),
                label => format!("<{label}>"),
            })
            .collect();
        hint.push_str(record);
        hint.push_str("With custom fields: ");
        hint.push_str(&basic);
        hint.push_str(field);
        hint.push_str(&custom.join(field));
    }
    hint
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{FieldDelimiter, RecordDelimiter};
    use crate::model::CustomFieldDef;

    #[test]
    fn preview_caps_sample_but_counts_everything() {
        let text = (1..=8)
            .map(|i| format!("q{i}\ta{i}"))
            .collect::<Vec<_>>()
            .join("\n");
        let preview = preview(&text, &DelimiterConfig::default(), 0);
        assert_eq!(preview.total, 8);
        assert_eq!(preview.sample.len(), PREVIEW_LIMIT);
        assert_eq!(preview.sample[0], ParsedRecord::new("q1", "a1"));
        assert!(preview.has_valid_format);
    }

    #[test]
    fn preview_of_unmatched_delimiter_is_empty_not_error() {
        let preview = preview("cat,chat", &DelimiterConfig::default(), 0);
        assert_eq!(preview.total, 0);
        assert!(preview.sample.is_empty());
        assert!(!preview.has_valid_format);
    }

    #[test]
    fn placeholder_without_fields() {
        let config = DelimiterConfig::new(FieldDelimiter::Comma, RecordDelimiter::Newline);
        assert_eq!(
            placeholder(&config, &CustomFieldRegistry::new()),
            "Example formats:\n\nBasic: <front>,<back>"
        );
    }

    #[test]
    fn placeholder_lists_custom_labels() {
        let registry = CustomFieldRegistry::from_defs(vec![
            CustomFieldDef::from_label("Example"),
            CustomFieldDef::from_label("  "),
        ]);
        let config =
            DelimiterConfig::new(FieldDelimiter::Pipe, RecordDelimiter::Custom("---".into()));
        assert_eq!(
            placeholder(&config, &registry),
            "Example formats:\n\nBasic: <front>|<back>---\
             With custom fields: <front>|<back>|<Example>|<field 2>"
        );
    }
}
