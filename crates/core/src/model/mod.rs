mod card;
mod deck;
mod field;
mod ids;

pub use ids::{CardId, ClientKey, DeckId, FieldKey, ParseIdError};

pub use card::{CardContent, CardDraft, CardUpdate};
pub use deck::{DeckDraft, DeckSnapshot, DraftError, LoadedCard, LoadedDeck, NewDeck};
pub use field::{
    CustomFieldDef, CustomFieldRegistry, FieldError, MAX_CUSTOM_FIELDS, RESERVED_FIELD_NAMES,
};
