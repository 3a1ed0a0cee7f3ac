//! Domain Error Types
//!
//! Pure domain errors that don't depend on infrastructure.

use thiserror::Error;

/// Business rule violations and domain invariant failures.
/// Independent of the web/storage layers.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// Amount is zero, negative, has too many decimal places, or failed to parse
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Transaction type is not one of the closed set (credit, debit)
    #[error("Invalid transaction type: {0}")]
    InvalidType(String),

    /// Debit would overdraw the account
    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds {
        required: rust_decimal::Decimal,
        available: rust_decimal::Decimal,
    },

    /// Account not found
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// Transfer where source and destination are the same account
    #[error("Cannot transfer to the same account")]
    SameAccountTransfer,
}

impl DomainError {
    pub fn insufficient_funds(
        required: rust_decimal::Decimal,
        available: rust_decimal::Decimal,
    ) -> Self {
        Self::InsufficientFunds {
            required,
            available,
        }
    }

    /// Check if this is a client error (user's fault)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidAmount(_)
                | Self::InvalidType(_)
                | Self::InsufficientFunds { .. }
                | Self::SameAccountTransfer
        )
    }
}
