//! Amount type
//!
//! Domain primitive for monetary amounts. All arithmetic in the ledger uses
//! fixed-point decimals; binary floats never cross this boundary. Amounts are
//! validated at construction time, so an invalid value cannot exist in the
//! system.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::DomainError;

/// Maximum decimal places for a monetary amount (cents precision)
const MAX_SCALE: u32 = 2;

/// A validated transaction amount.
///
/// # Invariants
/// - Strictly positive; the sign of a transaction is carried by its type,
///   never embedded in the amount.
/// - At most 2 decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Amount(Decimal);

impl Amount {
    /// Create a new Amount with validation.
    ///
    /// # Errors
    /// `DomainError::InvalidAmount` if the value is zero, negative, or has
    /// more than 2 decimal places.
    pub fn new(value: Decimal) -> Result<Self, DomainError> {
        if value <= Decimal::ZERO {
            return Err(DomainError::InvalidAmount(format!(
                "amount must be strictly positive (got {value})"
            )));
        }

        if value.scale() > MAX_SCALE {
            return Err(DomainError::InvalidAmount(format!(
                "amount has too many decimal places (max {MAX_SCALE}, got {})",
                value.scale()
            )));
        }

        Ok(Self(value))
    }

    /// Get the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl FromStr for Amount {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let decimal = Decimal::from_str(s)
            .map_err(|e| DomainError::InvalidAmount(format!("{s:?}: {e}")))?;
        Amount::new(decimal)
    }
}

impl TryFrom<String> for Amount {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Amount::from_str(&value)
    }
}

impl From<Amount> for String {
    fn from(amount: Amount) -> Self {
        format!("{:.2}", amount.0)
    }
}
