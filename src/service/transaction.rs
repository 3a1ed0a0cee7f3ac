//! Single-Account Transaction Service
//!
//! Applies one credit or debit to one account. The funds check runs against
//! the balance read under lock, inside the same atomic unit as both writes,
//! so concurrent debits cannot overdraw the account.

use std::sync::Arc;

use rust_decimal::Decimal;

use crate::domain::{engine, Account, DomainError, NewTransaction, Transaction, TransactionKind};
use crate::error::AppError;
use crate::store::LedgerStore;

/// Default label when the caller provides none.
const DEFAULT_LABEL: &str = "Transaction";

pub struct TransactionService {
    store: Arc<dyn LedgerStore>,
}

/// Result of a committed single-account transaction: the refreshed account
/// (post-commit) and the created transaction.
#[derive(Debug)]
pub struct TransactionOutcome {
    pub account: Account,
    pub transaction: Transaction,
}

impl TransactionService {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// List an account's transaction history, most recent first.
    pub async fn list_transactions(&self, account_id: &str) -> Result<Vec<Transaction>, AppError> {
        let account = self
            .store
            .get_account(account_id)
            .await?
            .ok_or_else(|| DomainError::AccountNotFound(account_id.to_string()))?;
        Ok(account.transactions)
    }

    /// Apply one credit/debit to one account.
    ///
    /// Exactly one transaction row and one balance mutation per call; both
    /// commit together or not at all.
    pub async fn create_transaction(
        &self,
        account_id: &str,
        kind: TransactionKind,
        amount: Decimal,
        label: Option<String>,
    ) -> Result<TransactionOutcome, AppError> {
        let amount = engine::validate(amount)?;

        // Fast-path existence check before the atomic unit opens. The lock
        // read below re-checks: a concurrent reset cannot half-apply.
        if self.store.get_account(account_id).await?.is_none() {
            return Err(DomainError::AccountNotFound(account_id.to_string()).into());
        }

        let mut tx = self.store.begin().await?;

        let record = tx
            .lock_account(account_id)
            .await?
            .ok_or_else(|| DomainError::AccountNotFound(account_id.to_string()))?;

        engine::check_sufficient_funds(record.balance, kind, &amount)?;
        let new_balance = engine::apply(record.balance, kind, &amount)?;

        let transaction = tx
            .insert_transaction(
                account_id,
                NewTransaction {
                    kind,
                    amount: amount.value(),
                    label: label.unwrap_or_else(|| DEFAULT_LABEL.to_string()),
                    balance_after: new_balance,
                    reference: None,
                },
            )
            .await?;
        tx.update_balance(account_id, new_balance).await?;
        tx.commit().await?;

        let account = self
            .store
            .get_account(account_id)
            .await?
            .ok_or_else(|| AppError::Internal("account missing after commit".to_string()))?;

        Ok(TransactionOutcome {
            account,
            transaction,
        })
    }
}
