use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::codec::ParsedRecord;
use crate::model::field::CustomFieldRegistry;
use crate::model::ids::{CardId, ClientKey, FieldKey};

//
// ─── WIRE SHAPES ───────────────────────────────────────────────────────────────
//

/// Card content as submitted to the store: trimmed, custom data keyed by
/// field name, blank values omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardContent {
    pub front: String,
    pub back: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_data: BTreeMap<String, String>,
}

impl CardContent {
    #[must_use]
    pub fn new(front: impl Into<String>, back: impl Into<String>) -> Self {
        Self {
            front: front.into(),
            back: back.into(),
            custom_data: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_custom(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_data.insert(name.into(), value.into());
        self
    }
}

/// An existing card whose content changed, as carried by a deck patch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardUpdate {
    pub id: CardId,
    #[serde(flatten)]
    pub content: CardContent,
}

//
// ─── DRAFT ─────────────────────────────────────────────────────────────────────
//

/// One card row of a deck being edited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardDraft {
    client_key: ClientKey,
    server_id: Option<CardId>,
    front: String,
    back: String,
    custom: BTreeMap<FieldKey, String>,
    is_new: bool,
}

impl CardDraft {
    /// An empty row added by the user.
    #[must_use]
    pub fn blank() -> Self {
        Self {
            client_key: ClientKey::new(),
            server_id: None,
            front: String::new(),
            back: String::new(),
            custom: BTreeMap::new(),
            is_new: true,
        }
    }

    /// A card that already exists server-side.
    ///
    /// Values stored under names the registry does not know are dropped.
    #[must_use]
    pub fn existing(
        server_id: CardId,
        content: CardContent,
        registry: &CustomFieldRegistry,
    ) -> Self {
        let custom = content
            .custom_data
            .into_iter()
            .filter(|(_, value)| !value.trim().is_empty())
            .filter_map(|(name, value)| {
                registry
                    .position(&name)
                    .and_then(|index| registry.get(index))
                    .map(|field| (field.key(), value))
            })
            .collect();

        Self {
            client_key: ClientKey::new(),
            server_id: Some(server_id),
            front: content.front,
            back: content.back,
            custom,
            is_new: false,
        }
    }

    /// A new card built from a parsed bulk-import record.
    ///
    /// Custom values map positionally onto the registry; extra values are
    /// ignored.
    #[must_use]
    pub fn from_record(record: &ParsedRecord, registry: &CustomFieldRegistry) -> Self {
        let custom = registry
            .iter()
            .zip(&record.custom_values)
            .filter_map(|(field, value)| value.clone().map(|v| (field.key(), v)))
            .collect();

        Self {
            custom,
            front: record.front.clone(),
            back: record.back.clone(),
            ..Self::blank()
        }
    }

    #[must_use]
    pub fn client_key(&self) -> ClientKey {
        self.client_key
    }

    #[must_use]
    pub fn server_id(&self) -> Option<CardId> {
        self.server_id
    }

    #[must_use]
    pub fn front(&self) -> &str {
        &self.front
    }

    #[must_use]
    pub fn back(&self) -> &str {
        &self.back
    }

    #[must_use]
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    /// True when front or back holds non-whitespace text.
    #[must_use]
    pub fn is_content_bearing(&self) -> bool {
        !self.front.trim().is_empty() || !self.back.trim().is_empty()
    }

    /// True when both sides hold non-whitespace text.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.front.trim().is_empty() && !self.back.trim().is_empty()
    }

    pub fn set_front(&mut self, text: impl Into<String>) {
        self.front = text.into();
    }

    pub fn set_back(&mut self, text: impl Into<String>) {
        self.back = text.into();
    }

    #[must_use]
    pub fn custom_value(&self, key: FieldKey) -> Option<&str> {
        self.custom.get(&key).map(String::as_str)
    }

    /// Stores `value` for the field; a blank value removes the entry.
    pub fn set_custom_value(&mut self, key: FieldKey, value: impl Into<String>) {
        let value = value.into();
        if value.trim().is_empty() {
            self.custom.remove(&key);
        } else {
            self.custom.insert(key, value);
        }
    }

    pub(crate) fn purge_field(&mut self, key: FieldKey) {
        self.custom.remove(&key);
    }

    /// Custom data keyed by the registry's current field names.
    ///
    /// Fields without a usable name yet are skipped.
    #[must_use]
    pub fn custom_data(&self, registry: &CustomFieldRegistry) -> BTreeMap<String, String> {
        registry
            .iter()
            .filter(|field| !field.name().is_empty())
            .filter_map(|field| {
                self.custom
                    .get(&field.key())
                    .map(|value| (field.name().to_owned(), value.clone()))
            })
            .collect()
    }

    /// Trimmed submission payload; blank custom values are omitted.
    #[must_use]
    pub fn to_content(&self, registry: &CustomFieldRegistry) -> CardContent {
        let custom_data = self
            .custom_data(registry)
            .into_iter()
            .filter_map(|(name, value)| {
                let value = value.trim();
                (!value.is_empty()).then(|| (name, value.to_owned()))
            })
            .collect();

        CardContent {
            front: self.front.trim().to_owned(),
            back: self.back.trim().to_owned(),
            custom_data,
        }
    }

    /// Positional record for export, custom values in registry order.
    #[must_use]
    pub fn to_record(&self, registry: &CustomFieldRegistry) -> ParsedRecord {
        ParsedRecord {
            front: self.front.trim().to_owned(),
            back: self.back.trim().to_owned(),
            custom_values: registry
                .iter()
                .map(|field| {
                    self.custom
                        .get(&field.key())
                        .map(|v| v.trim().to_owned())
                        .filter(|v| !v.is_empty())
                })
                .collect(),
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::field::CustomFieldDef;

    fn registry() -> CustomFieldRegistry {
        CustomFieldRegistry::from_defs(vec![
            CustomFieldDef::from_label("Notes"),
            CustomFieldDef::from_label("Example"),
        ])
    }

    #[test]
    fn blank_card_is_new_and_content_less() {
        let card = CardDraft::blank();
        assert!(card.is_new());
        assert!(card.server_id().is_none());
        assert!(!card.is_content_bearing());
    }

    #[test]
    fn one_side_is_enough_to_bear_content() {
        let mut card = CardDraft::blank();
        card.set_back("  chien ");
        assert!(card.is_content_bearing());
        assert!(!card.is_complete());
    }

    #[test]
    fn existing_card_drops_unknown_names() {
        let registry = registry();
        let content = CardContent::new("cat", "chat")
            .with_custom("notes", "feline")
            .with_custom("removed_field", "stale");
        let card = CardDraft::existing(CardId::new(3), content, &registry);

        assert!(!card.is_new());
        assert_eq!(card.server_id(), Some(CardId::new(3)));
        let data = card.custom_data(&registry);
        assert_eq!(data.len(), 1);
        assert_eq!(data.get("notes").map(String::as_str), Some("feline"));
    }

    #[test]
    fn blank_custom_value_removes_entry() {
        let registry = registry();
        let key = registry.get(0).unwrap().key();
        let mut card = CardDraft::blank();
        card.set_custom_value(key, "first");
        assert_eq!(card.custom_value(key), Some("first"));
        card.set_custom_value(key, "   ");
        assert_eq!(card.custom_value(key), None);
    }

    #[test]
    fn to_content_trims_and_skips_blank_values() {
        let registry = registry();
        let notes = registry.get(0).unwrap().key();
        let mut card = CardDraft::blank();
        card.set_front(" cat ");
        card.set_back("chat\n");
        card.set_custom_value(notes, " feline ");

        let content = card.to_content(&registry);
        assert_eq!(content, CardContent::new("cat", "chat").with_custom("notes", "feline"));
    }

    #[test]
    fn from_record_maps_values_positionally() {
        let registry = registry();
        let record = ParsedRecord {
            front: "dog".into(),
            back: "chien".into(),
            custom_values: vec![None, Some("The dog ran".into()), Some("extra".into())],
        };
        let card = CardDraft::from_record(&record, &registry);

        assert!(card.is_new());
        let data = card.custom_data(&registry);
        assert_eq!(data.len(), 1);
        assert_eq!(data.get("example").map(String::as_str), Some("The dog ran"));
    }

    #[test]
    fn content_serializes_without_empty_custom_data() {
        let json = serde_json::to_string(&CardContent::new("a", "b")).unwrap();
        assert_eq!(json, r#"{"front":"a","back":"b"}"#);

        let update = CardUpdate {
            id: CardId::new(9),
            content: CardContent::new("a", "b").with_custom("notes", "n"),
        };
        let json = serde_json::to_string(&update).unwrap();
        assert_eq!(json, r#"{"id":9,"front":"a","back":"b","custom_data":{"notes":"n"}}"#);
    }
}
