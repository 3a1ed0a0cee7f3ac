//! Domain module
//!
//! Core ledger types and the balance engine.

pub mod account;
pub mod engine;
pub mod error;
pub mod money;
pub mod product;

pub use account::{Account, AccountRecord, NewTransaction, Transaction, TransactionKind};
pub use error::DomainError;
pub use money::Amount;
pub use product::{Card, CardType, Loan, LoanType};
