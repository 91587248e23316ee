use async_trait::async_trait;
use flashdeck_core::model::{CardContent, CardId, DeckId, LoadedCard, LoadedDeck, NewDeck};
use flashdeck_core::reconcile::DeckPatch;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// The per-deck and per-card primitives a deck editor submits through.
///
/// There is no bulk-diff call; an edit is replayed as deletes, one patch and
/// creates.
#[async_trait]
pub trait DeckStore: Send + Sync {
    /// Fetch a deck with its custom fields and cards.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn load_deck(&self, deck_id: DeckId) -> Result<LoadedDeck, StorageError>;

    /// Create a deck together with its initial cards.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the deck cannot be stored.
    async fn create_deck(&self, deck: &NewDeck) -> Result<DeckId, StorageError>;

    /// Delete one card.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the deck or card is missing.
    async fn delete_card(&self, deck_id: DeckId, card_id: CardId) -> Result<(), StorageError>;

    /// Replace deck metadata and the content of the listed cards.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the deck or any listed card is
    /// missing; nothing is applied in that case.
    async fn patch_deck(&self, deck_id: DeckId, patch: &DeckPatch) -> Result<(), StorageError>;

    /// Append one card to a deck.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the deck is missing.
    async fn create_card(
        &self,
        deck_id: DeckId,
        content: &CardContent,
    ) -> Result<CardId, StorageError>;
}

/// Store primitive kinds, used to target injected failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    LoadDeck,
    CreateDeck,
    DeleteCard,
    PatchDeck,
    CreateCard,
}

/// A mutation accepted by [`InMemoryRepository`], in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    CreateDeck(DeckId),
    DeleteCard(CardId),
    PatchDeck(DeckId),
    CreateCard(CardId),
}

#[derive(Default)]
struct State {
    decks: HashMap<DeckId, LoadedDeck>,
    last_deck_id: u64,
    last_card_id: u64,
    failures: Vec<StoreOp>,
    calls: Vec<StoreCall>,
}

impl State {
    fn take_failure(&mut self, op: StoreOp) -> Result<(), StorageError> {
        match self.failures.iter().position(|f| *f == op) {
            Some(index) => {
                self.failures.remove(index);
                Err(StorageError::Connection(format!("injected {op:?} failure")))
            }
            None => Ok(()),
        }
    }

    fn next_card_id(&mut self) -> CardId {
        self.last_card_id += 1;
        CardId::new(self.last_card_id)
    }
}

/// Simple in-memory store for testing and prototyping.
///
/// Supports one-shot failure injection per primitive and records every
/// accepted mutation.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    state: Arc<Mutex<State>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a deck as-is, keeping its ids.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the deck id is taken.
    pub fn insert_deck(&self, deck: LoadedDeck) -> Result<(), StorageError> {
        let mut state = self.lock()?;
        if state.decks.contains_key(&deck.id) {
            return Err(StorageError::Conflict);
        }
        state.last_deck_id = state.last_deck_id.max(deck.id.value());
        let max_card = deck.cards.iter().map(|c| c.id.value()).max().unwrap_or(0);
        state.last_card_id = state.last_card_id.max(max_card);
        state.decks.insert(deck.id, deck);
        Ok(())
    }

    /// Makes the next call of `op` fail with a connection error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the state lock is poisoned.
    pub fn fail_next(&self, op: StoreOp) -> Result<(), StorageError> {
        self.lock()?.failures.push(op);
        Ok(())
    }

    /// Mutations accepted so far.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the state lock is poisoned.
    pub fn calls(&self) -> Result<Vec<StoreCall>, StorageError> {
        Ok(self.lock()?.calls.clone())
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, StorageError> {
        self.state
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }
}

#[async_trait]
impl DeckStore for InMemoryRepository {
    async fn load_deck(&self, deck_id: DeckId) -> Result<LoadedDeck, StorageError> {
        let mut state = self.lock()?;
        state.take_failure(StoreOp::LoadDeck)?;
        state.decks.get(&deck_id).cloned().ok_or(StorageError::NotFound)
    }

    async fn create_deck(&self, deck: &NewDeck) -> Result<DeckId, StorageError> {
        let mut state = self.lock()?;
        state.take_failure(StoreOp::CreateDeck)?;
        state.last_deck_id += 1;
        let id = DeckId::new(state.last_deck_id);
        let cards = deck
            .cards
            .iter()
            .map(|content| LoadedCard {
                id: state.next_card_id(),
                content: content.clone(),
            })
            .collect();
        state.decks.insert(
            id,
            LoadedDeck {
                id,
                title: deck.title.clone(),
                is_public: deck.is_public,
                custom_fields: deck.custom_fields.clone(),
                cards,
            },
        );
        state.calls.push(StoreCall::CreateDeck(id));
        Ok(id)
    }

    async fn delete_card(&self, deck_id: DeckId, card_id: CardId) -> Result<(), StorageError> {
        let mut state = self.lock()?;
        state.take_failure(StoreOp::DeleteCard)?;
        let deck = state.decks.get_mut(&deck_id).ok_or(StorageError::NotFound)?;
        let index = deck
            .cards
            .iter()
            .position(|c| c.id == card_id)
            .ok_or(StorageError::NotFound)?;
        deck.cards.remove(index);
        state.calls.push(StoreCall::DeleteCard(card_id));
        Ok(())
    }

    async fn patch_deck(&self, deck_id: DeckId, patch: &DeckPatch) -> Result<(), StorageError> {
        let mut state = self.lock()?;
        state.take_failure(StoreOp::PatchDeck)?;
        let deck = state.decks.get_mut(&deck_id).ok_or(StorageError::NotFound)?;

        let mut targets = Vec::with_capacity(patch.updated_cards.len());
        for update in &patch.updated_cards {
            let index = deck
                .cards
                .iter()
                .position(|c| c.id == update.id)
                .ok_or(StorageError::NotFound)?;
            targets.push((index, &update.content));
        }

        deck.title.clone_from(&patch.title);
        deck.is_public = patch.is_public;
        deck.custom_fields = patch.custom_fields.iter().cloned().collect();
        for (index, content) in targets {
            deck.cards[index].content = content.clone();
        }

        // Values under names the schema no longer has are unreachable.
        let names = patch.custom_fields.names();
        for card in &mut deck.cards {
            card.content
                .custom_data
                .retain(|name, _| names.contains(&name.as_str()));
        }

        state.calls.push(StoreCall::PatchDeck(deck_id));
        Ok(())
    }

    async fn create_card(
        &self,
        deck_id: DeckId,
        content: &CardContent,
    ) -> Result<CardId, StorageError> {
        let mut state = self.lock()?;
        state.take_failure(StoreOp::CreateCard)?;
        if !state.decks.contains_key(&deck_id) {
            return Err(StorageError::NotFound);
        }
        let id = state.next_card_id();
        if let Some(deck) = state.decks.get_mut(&deck_id) {
            deck.cards.push(LoadedCard {
                id,
                content: content.clone(),
            });
        }
        state.calls.push(StoreCall::CreateCard(id));
        Ok(id)
    }
}

/// Store handle shared by services, behind a trait object for easy backend
/// swapping.
#[derive(Clone)]
pub struct Storage {
    pub decks: Arc<dyn DeckStore>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            decks: Arc::new(InMemoryRepository::new()),
        }
    }
}
