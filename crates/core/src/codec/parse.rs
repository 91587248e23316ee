use serde::{Deserialize, Serialize};

use crate::codec::DelimiterConfig;

/// One record of bulk text.
///
/// `custom_values[i]` belongs to the i-th registry field; `None` means the
/// column was missing or blank, which is distinct from an empty value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedRecord {
    pub front: String,
    pub back: String,
    #[serde(default)]
    pub custom_values: Vec<Option<String>>,
}

impl ParsedRecord {
    #[must_use]
    pub fn new(front: impl Into<String>, back: impl Into<String>) -> Self {
        Self {
            front: front.into(),
            back: back.into(),
            custom_values: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_custom_values(mut self, values: Vec<Option<String>>) -> Self {
        self.custom_values = values;
        self
    }
}

/// Splits `text` into records.
///
/// Blank records, and records missing a front or back, are dropped. Columns
/// past `registry_size` custom fields are ignored. Input order is kept.
#[must_use]
pub fn parse(text: &str, config: &DelimiterConfig, registry_size: usize) -> Vec<ParsedRecord> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let field_delimiter = config.field.resolve();
    text.split(config.record.resolve())
        .filter(|raw| !raw.trim().is_empty())
        .filter_map(|raw| parse_record(raw, field_delimiter, registry_size))
        .collect()
}

fn parse_record(raw: &str, field_delimiter: &str, registry_size: usize) -> Option<ParsedRecord> {
    let mut columns = raw.split(field_delimiter).map(str::trim);
    let front = columns.next().unwrap_or_default();
    let back = columns.next().unwrap_or_default();
    if front.is_empty() || back.is_empty() {
        return None;
    }

    let custom_values = (0..registry_size)
        .map(|_| {
            columns
                .next()
                .filter(|value| !value.is_empty())
                .map(str::to_owned)
        })
        .collect();

    Some(ParsedRecord {
        front: front.to_owned(),
        back: back.to_owned(),
        custom_values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{FieldDelimiter, RecordDelimiter};

    fn comma_lines() -> DelimiterConfig {
        DelimiterConfig::new(FieldDelimiter::Comma, RecordDelimiter::Newline)
    }

    #[test]
    fn maps_custom_column_and_keeps_missing_absent() {
        let records = parse("cat,chat,The cat sat\ndog,chien", &comma_lines(), 1);
        assert_eq!(
            records,
            vec![
                ParsedRecord::new("cat", "chat")
                    .with_custom_values(vec![Some("The cat sat".into())]),
                ParsedRecord::new("dog", "chien").with_custom_values(vec![None]),
            ]
        );
    }

    #[test]
    fn blank_text_yields_nothing() {
        assert!(parse("", &comma_lines(), 0).is_empty());
        assert!(parse(" \n\t\n ", &DelimiterConfig::default(), 0).is_empty());
    }

    #[test]
    fn drops_records_without_both_sides() {
        let text = "cat,chat\nlonely\n,chien\nbird, \n\n  \nfish,poisson";
        let records = parse(text, &comma_lines(), 0);
        let fronts: Vec<_> = records.iter().map(|r| r.front.as_str()).collect();
        assert_eq!(fronts, vec!["cat", "fish"]);
    }

    #[test]
    fn trims_columns_and_ignores_surplus() {
        let config = DelimiterConfig::new(FieldDelimiter::Pipe, RecordDelimiter::Newline);
        let records = parse("  cat | chat | note |  | extra | more ", &config, 2);
        assert_eq!(
            records,
            vec![
                ParsedRecord::new("cat", "chat")
                    .with_custom_values(vec![Some("note".into()), None])
            ]
        );
    }

    #[test]
    fn without_registry_custom_columns_are_ignored() {
        let records = parse("cat,chat,ignored", &comma_lines(), 0);
        assert_eq!(records, vec![ParsedRecord::new("cat", "chat")]);
    }

    #[test]
    fn tab_default_handles_crlf_input() {
        let records = parse("cat\tchat\r\ndog\tchien\r\n", &DelimiterConfig::default(), 0);
        assert_eq!(
            records,
            vec![ParsedRecord::new("cat", "chat"), ParsedRecord::new("dog", "chien")]
        );
    }

    #[test]
    fn double_newline_keeps_multiline_backs_together() {
        let config = DelimiterConfig::new(
            FieldDelimiter::Custom("::".into()),
            RecordDelimiter::DoubleNewline,
        );
        let records = parse("a::first\nsecond\n\nb::third", &config, 0);
        assert_eq!(
            records,
            vec![ParsedRecord::new("a", "first\nsecond"), ParsedRecord::new("b", "third")]
        );
    }

    #[test]
    fn empty_custom_delimiters_parse_with_defaults() {
        let config = DelimiterConfig::new(
            FieldDelimiter::Custom(String::new()),
            RecordDelimiter::Custom(String::new()),
        );
        let records = parse("cat\tchat\ndog\tchien", &config, 0);
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn custom_record_delimiter_splits_on_literal() {
        let config =
            DelimiterConfig::new(FieldDelimiter::Semicolon, RecordDelimiter::Custom("|||".into()));
        let records = parse("cat;chat|||dog;chien|||", &config, 0);
        assert_eq!(
            records,
            vec![ParsedRecord::new("cat", "chat"), ParsedRecord::new("dog", "chien")]
        );
    }
}
