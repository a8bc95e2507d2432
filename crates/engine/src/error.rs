//! The module contains the errors the engine can return.
//!
//! The taxonomy is closed so callers can map kinds to transport status codes
//! without matching on message text:
//!
//! - [`NotFound`] a referenced group/bill/settlement/member does not exist or
//!   is outside the caller's group.
//! - [`Unauthorized`] the caller lacks the membership/admin/ownership the
//!   operation requires.
//! - [`StateConflict`] the operation is invalid for the current lifecycle
//!   state (e.g. confirming a non-pending settlement).
//! - [`Validation`] malformed input (empty bill list, negative amounts,
//!   total/items mismatch).
//! - [`Database`] a storage failure; multi-step writes roll back as a whole.
//!
//!  [`NotFound`]: EngineError::NotFound
//!  [`Unauthorized`]: EngineError::Unauthorized
//!  [`StateConflict`]: EngineError::StateConflict
//!  [`Validation`]: EngineError::Validation
//!  [`Database`]: EngineError::Database
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("not authorized: {0}")]
    Unauthorized(String),
    #[error("state conflict: {0}")]
    StateConflict(String),
    #[error("invalid input: {0}")]
    Validation(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::NotFound(a), Self::NotFound(b)) => a == b,
            (Self::Unauthorized(a), Self::Unauthorized(b)) => a == b,
            (Self::StateConflict(a), Self::StateConflict(b)) => a == b,
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
