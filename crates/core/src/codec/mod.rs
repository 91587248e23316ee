//! Bulk text ⇄ flashcard records.
//!
//! Columns are positional: front, back, then one column per custom field in
//! registry order. Delimiters are never escaped, so values containing the
//! chosen delimiters do not survive a round trip.

mod delimiter;
mod parse;
mod preview;
mod serialize;

use thiserror::Error;

pub use delimiter::{DelimiterConfig, FieldDelimiter, RecordDelimiter};
pub use parse::{ParsedRecord, parse};
pub use preview::{ImportPreview, PREVIEW_LIMIT, placeholder, preview};
pub use serialize::{ColumnMask, serialize};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CodecError {
    #[error("custom term delimiter is required")]
    EmptyCustomFieldDelimiter,

    #[error("custom card delimiter is required")]
    EmptyCustomRecordDelimiter,

    #[error("please enter valid text to create flashcards")]
    NoRecords,
}
