#![forbid(unsafe_code)]

pub mod create_service;
pub mod edit_session;
pub mod error;
pub mod executor;

pub use create_service::DeckCreateService;
pub use edit_session::DeckEditSession;
pub use error::{CreateDeckError, ExecutionError, ExecutionPhase, SessionError};
pub use executor::{ExecutionOutcome, ExecutionProgress, PlanExecutor};
