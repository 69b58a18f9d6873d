//! The module contains the errors the engine can throw.
//!
//! The interesting ones for callers are:
//!
//! - [`InsufficientBalance`] rejected expense that would overdraw an asset.
//! - [`AssetNotFound`] / [`TransactionNotFound`] lookups that miss (also used
//!   when the caller does not own the record).
//!
//!  [`InsufficientBalance`]: EngineError::InsufficientBalance
//!  [`AssetNotFound`]: EngineError::AssetNotFound
//!  [`TransactionNotFound`]: EngineError::TransactionNotFound
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Insufficient balance: {0}")]
    InsufficientBalance(String),
    #[error("Asset \"{0}\" not found!")]
    AssetNotFound(String),
    #[error("Transaction \"{0}\" not found!")]
    TransactionNotFound(String),
    #[error("Export \"{0}\" not found!")]
    ExportNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid id: {0}")]
    InvalidId(String),
    #[error("Currency mismatch: {0}")]
    CurrencyMismatch(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InsufficientBalance(a), Self::InsufficientBalance(b)) => a == b,
            (Self::AssetNotFound(a), Self::AssetNotFound(b)) => a == b,
            (Self::TransactionNotFound(a), Self::TransactionNotFound(b)) => a == b,
            (Self::ExportNotFound(a), Self::ExportNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidId(a), Self::InvalidId(b)) => a == b,
            (Self::CurrencyMismatch(a), Self::CurrencyMismatch(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
