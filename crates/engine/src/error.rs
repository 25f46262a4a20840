//! The module contains the errors the engine can throw.
//!
//! Purchase bookings fail with one of:
//!
//! - [`ContractNotFound`] when the target contract cannot be resolved.
//! - [`DateNotValid`] when the purchase falls outside the contract window.
//! - [`InsufficientCredit`] when the remaining credit does not cover the spend.
//! - [`Database`] when the storage fails after validation passed.
//!
//!  [`ContractNotFound`]: EngineError::ContractNotFound
//!  [`DateNotValid`]: EngineError::DateNotValid
//!  [`InsufficientCredit`]: EngineError::InsufficientCredit
//!  [`Database`]: EngineError::Database
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("contract doesn't exist")]
    ContractNotFound,
    #[error("seller company doesn't exist")]
    SellerNotExist,
    #[error("client company doesn't exist")]
    ClientNotExist,
    #[error("purchase date is outside the contract date range")]
    DateNotValid,
    #[error("not enough money for the purchase")]
    InsufficientCredit,
    #[error("Invalid period: {0}")]
    InvalidPeriod(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl EngineError {
    /// `true` for outcomes caused by the request itself rather than the store.
    pub fn is_client_fault(&self) -> bool {
        !matches!(self, Self::Database(_))
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ContractNotFound, Self::ContractNotFound)
            | (Self::SellerNotExist, Self::SellerNotExist)
            | (Self::ClientNotExist, Self::ClientNotExist)
            | (Self::DateNotValid, Self::DateNotValid)
            | (Self::InsufficientCredit, Self::InsufficientCredit) => true,
            (Self::InvalidPeriod(a), Self::InvalidPeriod(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_single_line() {
        let errors = [
            EngineError::ContractNotFound,
            EngineError::SellerNotExist,
            EngineError::ClientNotExist,
            EngineError::DateNotValid,
            EngineError::InsufficientCredit,
            EngineError::InvalidPeriod("validFrom after validTo".to_string()),
            EngineError::Database(DbErr::Custom("disk full".to_string())),
        ];
        for err in errors {
            assert!(!err.to_string().contains('\n'), "{err}");
        }
    }

    #[test]
    fn storage_errors_are_server_faults() {
        assert!(EngineError::InsufficientCredit.is_client_fault());
        assert!(EngineError::ContractNotFound.is_client_fault());
        assert!(!EngineError::Database(DbErr::Custom("x".to_string())).is_client_fault());
    }
}
