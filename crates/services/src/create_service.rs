use std::sync::Arc;

use flashdeck_core::codec::{self, CodecError, DelimiterConfig};
use flashdeck_core::model::{DeckDraft, DeckId};
use storage::repository::DeckStore;

use crate::error::CreateDeckError;

/// Submits brand-new decks, typed row by row or pasted as bulk text.
#[derive(Clone)]
pub struct DeckCreateService {
    decks: Arc<dyn DeckStore>,
}

impl DeckCreateService {
    #[must_use]
    pub fn new(decks: Arc<dyn DeckStore>) -> Self {
        Self { decks }
    }

    /// Validate `draft` and persist it as a new deck.
    ///
    /// Rows missing either side are left out of the request.
    ///
    /// # Errors
    ///
    /// Returns `CreateDeckError::Validation` for draft problems.
    /// Returns `CreateDeckError::Storage` if persistence fails.
    pub async fn create_deck(&self, draft: &DeckDraft) -> Result<DeckId, CreateDeckError> {
        draft.validate().map_err(CreateDeckError::Validation)?;
        let deck_id = self.decks.create_deck(&draft.creation_request()).await?;
        Ok(deck_id)
    }

    /// Create a deck whose cards come from bulk text instead of the draft's
    /// rows. Title, visibility and custom fields are taken from `draft`.
    ///
    /// # Errors
    ///
    /// Returns `CreateDeckError::Codec` for a blank custom delimiter or text
    /// without any usable record, plus the errors of [`Self::create_deck`].
    pub async fn create_from_text(
        &self,
        draft: &DeckDraft,
        text: &str,
        config: &DelimiterConfig,
    ) -> Result<DeckId, CreateDeckError> {
        config.validate_for_submit()?;
        let records = codec::parse(text, config, draft.registry().len());
        if records.is_empty() {
            return Err(CodecError::NoRecords.into());
        }

        let mut bulk = draft.clone();
        bulk.replace_with_parsed(&records);
        self.create_deck(&bulk).await
    }
}
