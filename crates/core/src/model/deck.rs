use std::ops::Deref;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::codec::ParsedRecord;
use crate::model::card::{CardContent, CardDraft};
use crate::model::field::{CustomFieldDef, CustomFieldRegistry, FieldError};
use crate::model::ids::{CardId, ClientKey, DeckId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DraftError {
    #[error("deck title is required")]
    EmptyTitle,

    #[error("at least one flashcard with content is required")]
    NoContent,

    #[error(transparent)]
    Field(#[from] FieldError),

    #[error("unknown card {0}")]
    UnknownCard(ClientKey),

    #[error("unknown custom field '{0}'")]
    UnknownField(String),

    #[error("a deck must keep at least one card row")]
    LastCard,
}

//
// ─── LOAD / CREATE PAYLOADS ────────────────────────────────────────────────────
//

/// A persisted card as delivered by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadedCard {
    pub id: CardId,
    #[serde(flatten)]
    pub content: CardContent,
}

/// A persisted deck as delivered by the store; seeds an edit session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadedDeck {
    pub id: DeckId,
    pub title: String,
    pub is_public: bool,
    #[serde(default)]
    pub custom_fields: Vec<CustomFieldDef>,
    #[serde(default)]
    pub cards: Vec<LoadedCard>,
}

/// Payload for creating a brand-new deck with its cards in one call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDeck {
    pub title: String,
    pub is_public: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub custom_fields: Vec<CustomFieldDef>,
    pub cards: Vec<CardContent>,
}

//
// ─── DRAFT ─────────────────────────────────────────────────────────────────────
//

/// In-memory state of a deck being edited.
///
/// Card custom values are keyed by field identity, so removing a field purges
/// them and relabelling a field carries them over to the new name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckDraft {
    title: String,
    is_public: bool,
    registry: CustomFieldRegistry,
    cards: Vec<CardDraft>,
}

/// Immutable copy of a [`DeckDraft`] taken at load time; the diff baseline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckSnapshot(DeckDraft);

impl Deref for DeckSnapshot {
    type Target = DeckDraft;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DeckDraft {
    /// Empty form for a deck that does not exist yet.
    #[must_use]
    pub fn new_deck() -> Self {
        Self {
            title: String::new(),
            is_public: false,
            registry: CustomFieldRegistry::new(),
            cards: vec![CardDraft::blank()],
        }
    }

    /// Seeds the editable draft and its snapshot from a persisted deck.
    ///
    /// A deck without cards gets one blank row in the draft only, so the
    /// snapshot still reflects exactly what the store holds.
    #[must_use]
    pub fn load(deck: LoadedDeck) -> (Self, DeckSnapshot) {
        let registry = CustomFieldRegistry::from_defs(deck.custom_fields);
        let cards = deck
            .cards
            .into_iter()
            .map(|card| CardDraft::existing(card.id, card.content, &registry))
            .collect();

        let mut draft = Self {
            title: deck.title,
            is_public: deck.is_public,
            registry,
            cards,
        };
        let snapshot = DeckSnapshot(draft.clone());
        if draft.cards.is_empty() {
            draft.cards.push(CardDraft::blank());
        }
        (draft, snapshot)
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn is_public(&self) -> bool {
        self.is_public
    }

    #[must_use]
    pub fn registry(&self) -> &CustomFieldRegistry {
        &self.registry
    }

    #[must_use]
    pub fn cards(&self) -> &[CardDraft] {
        &self.cards
    }

    #[must_use]
    pub fn card(&self, key: ClientKey) -> Option<&CardDraft> {
        self.cards.iter().find(|c| c.client_key() == key)
    }

    pub fn content_bearing_cards(&self) -> impl Iterator<Item = &CardDraft> {
        self.cards.iter().filter(|c| c.is_content_bearing())
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn set_public(&mut self, is_public: bool) {
        self.is_public = is_public;
    }

    // Cards

    /// Appends a blank row and returns its key.
    pub fn add_card(&mut self) -> ClientKey {
        let card = CardDraft::blank();
        let key = card.client_key();
        self.cards.push(card);
        key
    }

    /// Removes a card row. The last remaining row cannot be removed.
    ///
    /// # Errors
    ///
    /// Returns `DraftError::LastCard` or `DraftError::UnknownCard`.
    pub fn remove_card(&mut self, key: ClientKey) -> Result<CardDraft, DraftError> {
        let index = self.card_index(key)?;
        if self.cards.len() <= 1 {
            return Err(DraftError::LastCard);
        }
        Ok(self.cards.remove(index))
    }

    /// # Errors
    ///
    /// Returns `DraftError::UnknownCard` if no row has `key`.
    pub fn set_front(&mut self, key: ClientKey, text: impl Into<String>) -> Result<(), DraftError> {
        self.card_mut(key)?.set_front(text);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `DraftError::UnknownCard` if no row has `key`.
    pub fn set_back(&mut self, key: ClientKey, text: impl Into<String>) -> Result<(), DraftError> {
        self.card_mut(key)?.set_back(text);
        Ok(())
    }

    /// Sets a card's value for the field currently named `name`; a blank
    /// value clears it.
    ///
    /// # Errors
    ///
    /// Returns `DraftError::UnknownField` if no field has that name, or
    /// `DraftError::UnknownCard` if no row has `key`.
    pub fn set_custom_value(
        &mut self,
        key: ClientKey,
        name: &str,
        value: impl Into<String>,
    ) -> Result<(), DraftError> {
        let field_key = self
            .registry
            .position(name)
            .filter(|_| !name.is_empty())
            .and_then(|index| self.registry.get(index))
            .map(CustomFieldDef::key)
            .ok_or_else(|| DraftError::UnknownField(name.to_owned()))?;
        self.card_mut(key)?.set_custom_value(field_key, value);
        Ok(())
    }

    /// Appends parsed bulk-import records as new cards; returns how many.
    pub fn append_parsed(&mut self, records: &[ParsedRecord]) -> usize {
        let registry = &self.registry;
        self.cards
            .extend(records.iter().map(|r| CardDraft::from_record(r, registry)));
        records.len()
    }

    /// Replaces every card row with the parsed records.
    ///
    /// An empty record list leaves a single blank row.
    pub fn replace_with_parsed(&mut self, records: &[ParsedRecord]) -> usize {
        self.cards.clear();
        let added = self.append_parsed(records);
        if self.cards.is_empty() {
            self.cards.push(CardDraft::blank());
        }
        added
    }

    // Custom fields

    /// Adds an empty custom field row; `false` once the limit is reached.
    pub fn add_field(&mut self) -> bool {
        self.registry.add()
    }

    /// Removes a custom field and purges its values from every card.
    pub fn remove_field(&mut self, index: usize) -> Option<CustomFieldDef> {
        let removed = self.registry.remove(index)?;
        for card in &mut self.cards {
            card.purge_field(removed.key());
        }
        Some(removed)
    }

    /// Relabels a custom field. Card values stay attached to the field and
    /// are reported under the newly derived name.
    pub fn set_field_label(&mut self, index: usize, label: impl Into<String>) -> bool {
        self.registry.set_label(index, label)
    }

    // Submission

    /// Collects every problem that blocks submission.
    ///
    /// # Errors
    ///
    /// Returns all `DraftError`s found, title first.
    pub fn validate(&self) -> Result<(), Vec<DraftError>> {
        let mut errors = Vec::new();
        if self.title.trim().is_empty() {
            errors.push(DraftError::EmptyTitle);
        }
        if let Err(err) = self.registry.validate() {
            errors.push(err.into());
        }
        if self.content_bearing_cards().next().is_none() {
            errors.push(DraftError::NoContent);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Payload for creating this draft as a new deck.
    ///
    /// Only cards with both sides filled are included, and blank field rows
    /// are dropped.
    #[must_use]
    pub fn creation_request(&self) -> NewDeck {
        NewDeck {
            title: self.title.trim().to_owned(),
            is_public: self.is_public,
            custom_fields: self.registry.for_creation(),
            cards: self
                .cards
                .iter()
                .filter(|c| c.is_complete())
                .map(|c| c.to_content(&self.registry))
                .collect(),
        }
    }

    /// Content-bearing cards as positional records for export.
    #[must_use]
    pub fn export_records(&self) -> Vec<ParsedRecord> {
        self.content_bearing_cards()
            .map(|c| c.to_record(&self.registry))
            .collect()
    }

    fn card_index(&self, key: ClientKey) -> Result<usize, DraftError> {
        self.cards
            .iter()
            .position(|c| c.client_key() == key)
            .ok_or(DraftError::UnknownCard(key))
    }

    fn card_mut(&mut self, key: ClientKey) -> Result<&mut CardDraft, DraftError> {
        let index = self.card_index(key)?;
        Ok(&mut self.cards[index])
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
