//! Ledger records
//!
//! Accounts and their committed transactions. Balances are signed decimals;
//! transactions are immutable once committed, with the history ordered
//! most-recent-first.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::error::DomainError;

/// Transaction type. A closed set: the sign of a transaction is derived from
/// this tag, never from the amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Credit,
    Debit,
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Credit => write!(f, "credit"),
            Self::Debit => write!(f, "debit"),
        }
    }
}

impl FromStr for TransactionKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "credit" => Ok(Self::Credit),
            "debit" => Ok(Self::Debit),
            other => Err(DomainError::InvalidType(other.to_string())),
        }
    }
}

/// A committed ledger transaction. Append-only: never updated or recomputed
/// after commit. `balance_after` is a snapshot of the account balance at
/// commit time.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub id: Uuid,
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub label: String,
    pub balance_after: Decimal,
    /// Correlation token shared by the two legs of a transfer.
    pub reference: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A transaction draft handed to the store for commit. The store assigns the
/// id and commit timestamp.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub label: String,
    pub balance_after: Decimal,
    pub reference: Option<String>,
}

/// An account with its full transaction history (most recent first).
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    /// Stable external identifier, IBAN-like.
    pub id: String,
    pub owner_name: String,
    pub balance: Decimal,
    /// ISO-4217-like code; all arithmetic on an account is single-currency.
    pub currency: String,
    pub created_at: DateTime<Utc>,
    pub transactions: Vec<Transaction>,
}

/// The persisted account row without its history, as read under lock inside
/// an atomic unit.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountRecord {
    pub id: String,
    pub owner_name: String,
    pub balance: Decimal,
    pub currency: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parse_credit_debit() {
        assert_eq!("credit".parse::<TransactionKind>().unwrap(), TransactionKind::Credit);
        assert_eq!("debit".parse::<TransactionKind>().unwrap(), TransactionKind::Debit);
    }

    #[test]
    fn test_kind_parse_rejects_unknown() {
        let err = "withdrawal".parse::<TransactionKind>().unwrap_err();
        assert_eq!(err, DomainError::InvalidType("withdrawal".to_string()));
    }

    #[test]
    fn test_kind_roundtrip_display() {
        for kind in [TransactionKind::Credit, TransactionKind::Debit] {
            assert_eq!(kind.to_string().parse::<TransactionKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_kind_serde_lowercase() {
        assert_eq!(serde_json::to_string(&TransactionKind::Debit).unwrap(), "\"debit\"");
        let kind: TransactionKind = serde_json::from_str("\"credit\"").unwrap();
        assert_eq!(kind, TransactionKind::Credit);
    }
}
