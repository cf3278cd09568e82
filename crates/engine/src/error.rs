//! The module contains the errors the engine can return.
//!
//! Business rule violations are values, not panics: every lifecycle
//! operation returns `Result<_, EngineError>` and callers decide what to do
//! with the failure. None of the variants triggers an internal retry.

use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    /// A referenced loan, fund, member, group or user does not exist.
    #[error("\"{0}\" not found")]
    KeyNotFound(String),
    /// The loan's current status does not permit the requested operation.
    #[error("invalid state transition: {0}")]
    InvalidTransition(String),
    /// The actor lacks the role or ownership the operation requires.
    #[error("forbidden: {0}")]
    Forbidden(String),
    /// A repayment larger than the remaining balance; nothing is applied.
    #[error("excess repayment: {0}")]
    ExcessRepayment(String),
    /// The group fund cannot cover a disbursement; nothing is applied.
    #[error("insufficient funds: {0}")]
    InsufficientFunds(String),
    /// Rejected input amount or malformed value.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::InvalidTransition(a), Self::InvalidTransition(b)) => a == b,
            (Self::Forbidden(a), Self::Forbidden(b)) => a == b,
            (Self::ExcessRepayment(a), Self::ExcessRepayment(b)) => a == b,
            (Self::InsufficientFunds(a), Self::InsufficientFunds(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
