//! Bank products
//!
//! Cards and loans attached to an account. These records sit outside the
//! ledger: creating or listing them never touches a balance, so they need no
//! atomic unit, only the owning account to exist.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::error::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardType {
    #[default]
    Debit,
    Credit,
    Virtual,
}

impl fmt::Display for CardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Debit => write!(f, "debit"),
            Self::Credit => write!(f, "credit"),
            Self::Virtual => write!(f, "virtual"),
        }
    }
}

impl FromStr for CardType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "debit" => Ok(Self::Debit),
            "credit" => Ok(Self::Credit),
            "virtual" => Ok(Self::Virtual),
            other => Err(DomainError::InvalidType(other.to_string())),
        }
    }
}

/// A payment card issued against an account.
#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    pub id: Uuid,
    pub account_id: String,
    /// 16 digits, Luhn-valid.
    pub card_number: String,
    pub kind: CardType,
    pub cardholder_name: String,
    /// `MM/YY`.
    pub expiry_date: String,
    pub cvv: String,
    /// Spending limit; credit cards get one even when the caller omits it.
    pub limit: Option<Decimal>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoanType {
    Personal,
    Mortgage,
    Auto,
}

impl fmt::Display for LoanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Personal => write!(f, "personal"),
            Self::Mortgage => write!(f, "mortgage"),
            Self::Auto => write!(f, "auto"),
        }
    }
}

impl FromStr for LoanType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "personal" => Ok(Self::Personal),
            "mortgage" => Ok(Self::Mortgage),
            "auto" => Ok(Self::Auto),
            other => Err(DomainError::InvalidType(other.to_string())),
        }
    }
}

/// A loan attached to an account. `monthly_payment` is fixed at creation
/// from the amortization formula; repayment is not modelled.
#[derive(Debug, Clone, PartialEq)]
pub struct Loan {
    pub id: Uuid,
    pub account_id: String,
    pub kind: LoanType,
    pub amount: Decimal,
    pub remaining_balance: Decimal,
    /// Annual rate in percent.
    pub interest_rate: Decimal,
    pub duration_months: u32,
    pub monthly_payment: Decimal,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_type_roundtrip() {
        for kind in [CardType::Debit, CardType::Credit, CardType::Virtual] {
            assert_eq!(kind.to_string().parse::<CardType>().unwrap(), kind);
        }
        assert!("prepaid".parse::<CardType>().is_err());
    }

    #[test]
    fn test_loan_type_roundtrip() {
        for kind in [LoanType::Personal, LoanType::Mortgage, LoanType::Auto] {
            assert_eq!(kind.to_string().parse::<LoanType>().unwrap(), kind);
        }
        assert!("student".parse::<LoanType>().is_err());
    }

    #[test]
    fn test_card_type_default_is_debit() {
        assert_eq!(CardType::default(), CardType::Debit);
    }
}
