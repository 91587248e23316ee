//! Deck-edit core: bulk text codec, custom-field schema, deck drafts and the
//! reconciliation engine that turns an edited draft into store operations.
//!
//! Everything here is synchronous and side-effect free; executing an
//! [`reconcile::OperationPlan`] is left to the caller.

#![forbid(unsafe_code)]

pub mod codec;
pub mod model;
pub mod reconcile;
pub mod slug;

pub use codec::{CodecError, DelimiterConfig, FieldDelimiter, ParsedRecord, RecordDelimiter};
pub use model::{CustomFieldRegistry, DeckDraft, DeckSnapshot};
pub use reconcile::{DeckPatch, OperationPlan, PlanStep, reconcile};
pub use slug::derive_name;
