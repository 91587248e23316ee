//! Shared error types for the services crate.

use std::fmt;

use thiserror::Error;

use flashdeck_core::codec::CodecError;
use flashdeck_core::model::DraftError;
use storage::repository::StorageError;

/// Which part of an operation plan a store call belonged to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionPhase {
    Delete,
    Patch,
    Create,
}

impl fmt::Display for ExecutionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Delete => "delete",
            Self::Patch => "update",
            Self::Create => "create",
        };
        f.write_str(name)
    }
}

/// A store call of an operation plan failed; earlier calls stay committed.
#[derive(Debug, Error)]
#[error("{phase} #{step} failed: {source}")]
pub struct ExecutionError {
    pub phase: ExecutionPhase,
    /// Index within the phase.
    pub step: usize,
    #[source]
    pub source: StorageError,
}

/// Errors emitted by `DeckEditSession`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("deck has {} problem(s) to fix before saving", .0.len())]
    Validation(Vec<DraftError>),
    #[error("a previous save is unfinished; retry or discard it first")]
    PlanPending,
    #[error("deck was already saved")]
    Closed,
    #[error(transparent)]
    Execution(#[from] ExecutionError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `DeckCreateService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CreateDeckError {
    #[error("deck has {} problem(s) to fix before creating", .0.len())]
    Validation(Vec<DraftError>),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
