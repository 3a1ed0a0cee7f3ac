//! In-memory Ledger Store
//!
//! Substitute implementation for isolated tests: same contract as the
//! Postgres store, no database. Atomic units take the single book mutex for
//! their whole lifetime, which trivially serializes concurrent
//! read-check-write sequences; writes are staged and only applied on commit,
//! so dropping an unfinished unit rolls back.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::domain::{Account, AccountRecord, Card, Loan, NewTransaction, Transaction};

use super::{LedgerStore, LedgerTx, StoreError};

#[derive(Debug, Default)]
struct Book {
    accounts: HashMap<String, StoredAccount>,
    cards: HashMap<String, Vec<Card>>,
    loans: HashMap<String, Vec<Loan>>,
}

#[derive(Debug, Clone)]
struct StoredAccount {
    account: Account,
}

#[derive(Debug, Default)]
pub struct MemoryLedgerStore {
    book: Arc<Mutex<Book>>,
    /// Test failpoint: when set, that many staged inserts succeed and the
    /// next one fails with `StoreError::Unavailable`.
    insert_budget: Arc<std::sync::Mutex<Option<usize>>>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arrange for the (n+1)-th `insert_transaction` from now on to fail,
    /// simulating the store going away mid-unit.
    pub fn fail_after_inserts(&self, n: usize) {
        if let Ok(mut budget) = self.insert_budget.lock() {
            *budget = Some(n);
        }
    }

    pub fn clear_failpoint(&self) {
        if let Ok(mut budget) = self.insert_budget.lock() {
            *budget = None;
        }
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn get_account(&self, id: &str) -> Result<Option<Account>, StoreError> {
        let book = self.book.lock().await;
        Ok(book.accounts.get(id).map(|stored| stored.account.clone()))
    }

    async fn list_accounts(&self) -> Result<Vec<Account>, StoreError> {
        let book = self.book.lock().await;
        let mut accounts: Vec<Account> = book
            .accounts
            .values()
            .map(|stored| stored.account.clone())
            .collect();
        accounts.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(accounts)
    }

    async fn insert_account(&self, account: Account) -> Result<Account, StoreError> {
        let mut book = self.book.lock().await;
        book.accounts.insert(
            account.id.clone(),
            StoredAccount {
                account: account.clone(),
            },
        );
        Ok(account)
    }

    async fn insert_card(&self, card: Card) -> Result<Card, StoreError> {
        let mut book = self.book.lock().await;
        book.cards
            .entry(card.account_id.clone())
            .or_default()
            .push(card.clone());
        Ok(card)
    }

    async fn cards_for_account(&self, account_id: &str) -> Result<Vec<Card>, StoreError> {
        let book = self.book.lock().await;
        Ok(book.cards.get(account_id).cloned().unwrap_or_default())
    }

    async fn insert_loan(&self, loan: Loan) -> Result<Loan, StoreError> {
        let mut book = self.book.lock().await;
        book.loans
            .entry(loan.account_id.clone())
            .or_default()
            .push(loan.clone());
        Ok(loan)
    }

    async fn loans_for_account(&self, account_id: &str) -> Result<Vec<Loan>, StoreError> {
        let book = self.book.lock().await;
        Ok(book.loans.get(account_id).cloned().unwrap_or_default())
    }

    async fn begin(&self) -> Result<Box<dyn LedgerTx>, StoreError> {
        let guard = self.book.clone().lock_owned().await;
        Ok(Box::new(MemoryLedgerTx {
            guard,
            staged: Vec::new(),
            insert_budget: self.insert_budget.clone(),
        }))
    }

    async fn reset(&self) -> Result<u64, StoreError> {
        let mut book = self.book.lock().await;
        let count = book.accounts.len() as u64;
        book.accounts.clear();
        book.cards.clear();
        book.loans.clear();
        Ok(count)
    }
}

#[derive(Debug)]
enum Staged {
    Balance { account_id: String, new_balance: Decimal },
    Txn { account_id: String, txn: Transaction },
}

pub struct MemoryLedgerTx {
    guard: OwnedMutexGuard<Book>,
    staged: Vec<Staged>,
    insert_budget: Arc<std::sync::Mutex<Option<usize>>>,
}

#[async_trait]
impl LedgerTx for MemoryLedgerTx {
    async fn lock_account(&mut self, id: &str) -> Result<Option<AccountRecord>, StoreError> {
        Ok(self.guard.accounts.get(id).map(|stored| AccountRecord {
            id: stored.account.id.clone(),
            owner_name: stored.account.owner_name.clone(),
            balance: stored.account.balance,
            currency: stored.account.currency.clone(),
        }))
    }

    async fn update_balance(&mut self, id: &str, new_balance: Decimal) -> Result<(), StoreError> {
        self.staged.push(Staged::Balance {
            account_id: id.to_string(),
            new_balance,
        });
        Ok(())
    }

    async fn insert_transaction(
        &mut self,
        account_id: &str,
        txn: NewTransaction,
    ) -> Result<Transaction, StoreError> {
        {
            let mut budget = self
                .insert_budget
                .lock()
                .map_err(|_| StoreError::Unavailable("failpoint lock poisoned".to_string()))?;
            if let Some(remaining) = budget.as_mut() {
                if *remaining == 0 {
                    return Err(StoreError::Unavailable("induced insert failure".to_string()));
                }
                *remaining -= 1;
            }
        }

        let committed = Transaction {
            id: Uuid::new_v4(),
            kind: txn.kind,
            amount: txn.amount,
            label: txn.label,
            balance_after: txn.balance_after,
            reference: txn.reference,
            created_at: Utc::now(),
        };
        self.staged.push(Staged::Txn {
            account_id: account_id.to_string(),
            txn: committed.clone(),
        });
        Ok(committed)
    }

    async fn commit(mut self: Box<Self>) -> Result<(), StoreError> {
        let staged = std::mem::take(&mut self.staged);
        for staged in staged {
            match staged {
                Staged::Balance {
                    account_id,
                    new_balance,
                } => {
                    let stored = self.guard.accounts.get_mut(&account_id).ok_or_else(|| {
                        StoreError::Unavailable(format!("account {account_id} vanished mid-unit"))
                    })?;
                    stored.account.balance = new_balance;
                }
                Staged::Txn { account_id, txn } => {
                    let stored = self.guard.accounts.get_mut(&account_id).ok_or_else(|| {
                        StoreError::Unavailable(format!("account {account_id} vanished mid-unit"))
                    })?;
                    // History is most-recent-first.
                    stored.account.transactions.insert(0, txn);
                }
            }
        }
        Ok(())
    }
}
