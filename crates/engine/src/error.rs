//! The module contains the errors the engine can throw.
//!
//! Validation errors ([`InvalidId`], [`InvalidBudgetRatioSet`],
//! [`InvalidRatio`], [`InvalidWeights`], [`InvalidAmount`]) are always raised
//! before anything is written. Lookup misses ([`UnknownCode`],
//! [`UnknownBudget`], [`UnknownProject`], [`UnknownPayment`]) abort the
//! current operation and roll back its database transaction.
//!
//! [`AllocationInvariantViolation`] signals a bug in the allocator and must
//! never be observed by callers.
//!
//!  [`InvalidId`]: EngineError::InvalidId
//!  [`InvalidBudgetRatioSet`]: EngineError::InvalidBudgetRatioSet
//!  [`InvalidRatio`]: EngineError::InvalidRatio
//!  [`InvalidWeights`]: EngineError::InvalidWeights
//!  [`InvalidAmount`]: EngineError::InvalidAmount
//!  [`UnknownCode`]: EngineError::UnknownCode
//!  [`UnknownBudget`]: EngineError::UnknownBudget
//!  [`UnknownProject`]: EngineError::UnknownProject
//!  [`UnknownPayment`]: EngineError::UnknownPayment
//!  [`AllocationInvariantViolation`]: EngineError::AllocationInvariantViolation
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid id: {0}")]
    InvalidId(String),
    #[error("Invalid budget & ratio set: {0}")]
    InvalidBudgetRatioSet(String),
    #[error("Invalid ratio: {0}")]
    InvalidRatio(String),
    #[error("Invalid weights: {0}")]
    InvalidWeights(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid name: {0}")]
    InvalidName(String),
    #[error("Unknown code: {0}")]
    UnknownCode(String),
    #[error("Unknown budget: {0}")]
    UnknownBudget(String),
    #[error("Unknown project: {0}")]
    UnknownProject(String),
    #[error("Unknown payment: {0}")]
    UnknownPayment(String),
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Payment already settled: {0}")]
    PaymentSettled(String),
    #[error("No unambiguous token left after {0} attempts")]
    TokenSpaceExhausted(usize),
    #[error("Allocation invariant violated: {0}")]
    AllocationInvariantViolation(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InvalidId(a), Self::InvalidId(b)) => a == b,
            (Self::InvalidBudgetRatioSet(a), Self::InvalidBudgetRatioSet(b)) => a == b,
            (Self::InvalidRatio(a), Self::InvalidRatio(b)) => a == b,
            (Self::InvalidWeights(a), Self::InvalidWeights(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidName(a), Self::InvalidName(b)) => a == b,
            (Self::UnknownCode(a), Self::UnknownCode(b)) => a == b,
            (Self::UnknownBudget(a), Self::UnknownBudget(b)) => a == b,
            (Self::UnknownProject(a), Self::UnknownProject(b)) => a == b,
            (Self::UnknownPayment(a), Self::UnknownPayment(b)) => a == b,
            (Self::InsufficientFunds(a), Self::InsufficientFunds(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::PaymentSettled(a), Self::PaymentSettled(b)) => a == b,
            (Self::TokenSpaceExhausted(a), Self::TokenSpaceExhausted(b)) => a == b,
            (Self::AllocationInvariantViolation(a), Self::AllocationInvariantViolation(b)) => {
                a == b
            }
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
