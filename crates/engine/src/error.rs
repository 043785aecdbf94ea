//! The module contains the errors the engine can return.
//!
//! Every failure is detected before anything is written, so an error always
//! means the store is unchanged:
//!
//! - [`KeyNotFound`] the piggybank, transaction or category does not exist or
//!   belongs to another user.
//! - [`InsufficientFunds`] a withdrawal or transfer exceeds the balance.
//! - [`Conflict`] the operation would break a registry rule (e.g. deleting the
//!   main piggybank while other piggybanks exist).
//! - [`InvalidAmount`], [`InvalidName`], [`InvalidId`], [`InvalidKind`],
//!   [`InvalidDate`] rejected input.
//!
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`InsufficientFunds`]: EngineError::InsufficientFunds
//!  [`Conflict`]: EngineError::Conflict
//!  [`InvalidAmount`]: EngineError::InvalidAmount
//!  [`InvalidName`]: EngineError::InvalidName
//!  [`InvalidId`]: EngineError::InvalidId
//!  [`InvalidKind`]: EngineError::InvalidKind
//!  [`InvalidDate`]: EngineError::InvalidDate
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid name: {0}")]
    InvalidName(String),
    #[error("Invalid id: {0}")]
    InvalidId(String),
    #[error("Invalid kind: {0}")]
    InvalidKind(String),
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl EngineError {
    /// Returns `true` for errors caused by malformed input.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidAmount(_)
                | Self::InvalidName(_)
                | Self::InvalidId(_)
                | Self::InvalidKind(_)
                | Self::InvalidDate(_)
        )
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::InsufficientFunds(a), Self::InsufficientFunds(b)) => a == b,
            (Self::Conflict(a), Self::Conflict(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidName(a), Self::InvalidName(b)) => a == b,
            (Self::InvalidId(a), Self::InvalidId(b)) => a == b,
            (Self::InvalidKind(a), Self::InvalidKind(b)) => a == b,
            (Self::InvalidDate(a), Self::InvalidDate(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_are_flagged() {
        assert!(EngineError::InvalidAmount("x".to_string()).is_validation());
        assert!(EngineError::InvalidName("x".to_string()).is_validation());
        assert!(!EngineError::InsufficientFunds("x".to_string()).is_validation());
        assert!(!EngineError::Conflict("x".to_string()).is_validation());
        assert!(!EngineError::KeyNotFound("x".to_string()).is_validation());
    }
}
