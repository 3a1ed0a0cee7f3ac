//! Ledger Store
//!
//! The single shared mutable resource in the system. One trait, one
//! canonical Postgres implementation, one in-memory substitute for isolated
//! tests. Services never cache balances across calls; every operation
//! re-reads current state through this interface.

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::{Account, AccountRecord, Card, Loan, NewTransaction, Transaction};

pub mod memory;
pub mod postgres;

pub use memory::MemoryLedgerStore;
pub use postgres::PgLedgerStore;

/// Store-level failures. Surfaced to callers as a retriable condition: an
/// atomic unit that hits one of these is guaranteed not to have partially
/// committed.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Durable record of accounts and their transaction history.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Fetch one account with its full history, most recent first.
    async fn get_account(&self, id: &str) -> Result<Option<Account>, StoreError>;

    /// List all accounts with nested histories.
    async fn list_accounts(&self) -> Result<Vec<Account>, StoreError>;

    /// Persist a freshly generated account.
    async fn insert_account(&self, account: Account) -> Result<Account, StoreError>;

    /// Persist a card issued against an account.
    async fn insert_card(&self, card: Card) -> Result<Card, StoreError>;

    /// List the cards issued against one account, oldest first.
    async fn cards_for_account(&self, account_id: &str) -> Result<Vec<Card>, StoreError>;

    /// Persist a loan attached to an account.
    async fn insert_loan(&self, loan: Loan) -> Result<Loan, StoreError>;

    /// List the loans attached to one account, oldest first.
    async fn loans_for_account(&self, account_id: &str) -> Result<Vec<Loan>, StoreError>;

    /// Open an atomic unit of work. All reads and writes made through the
    /// returned handle commit together or not at all; two concurrent units
    /// touching the same account cannot interleave their read-check-write
    /// sequence.
    async fn begin(&self) -> Result<Box<dyn LedgerTx>, StoreError>;

    /// Bulk reset: delete every account and transaction. Returns the number
    /// of accounts removed.
    async fn reset(&self) -> Result<u64, StoreError>;
}

/// An open atomic unit. Dropping the handle without calling [`commit`]
/// rolls back everything staged in it.
///
/// Lock discipline: callers lock every account they will touch before the
/// first write, and when locking two accounts always lock the lower id
/// first so opposite-direction transfers cannot deadlock.
///
/// [`commit`]: LedgerTx::commit
#[async_trait]
pub trait LedgerTx: Send {
    /// Read an account row under a lock that serializes concurrent atomic
    /// units against the same account.
    async fn lock_account(&mut self, id: &str) -> Result<Option<AccountRecord>, StoreError>;

    /// Stage a balance update for an account locked in this unit.
    async fn update_balance(&mut self, id: &str, new_balance: Decimal) -> Result<(), StoreError>;

    /// Stage a committed transaction row; the store assigns id and timestamp.
    async fn insert_transaction(
        &mut self,
        account_id: &str,
        txn: NewTransaction,
    ) -> Result<Transaction, StoreError>;

    /// Commit the unit.
    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
}
