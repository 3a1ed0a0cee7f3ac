//! Transfer Service
//!
//! Double-entry transfer between two accounts: one debit on the source, one
//! credit on the destination, four writes in one atomic unit. Both legs
//! share a correlation reference; each carries its own balance snapshot.
//!
//! Lock order: the lower account id is always locked first, so two transfers
//! running in opposite directions over the same pair cannot deadlock.

use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::{engine, Account, DomainError, NewTransaction, Transaction, TransactionKind};
use crate::error::AppError;
use crate::store::LedgerStore;

pub struct TransferService {
    store: Arc<dyn LedgerStore>,
}

/// Result of a committed transfer: both refreshed accounts and both legs.
#[derive(Debug)]
pub struct TransferOutcome {
    pub from_account: Account,
    pub to_account: Account,
    pub debit: Transaction,
    pub credit: Transaction,
    pub reference: String,
}

impl TransferService {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Move `amount` from one account to another.
    ///
    /// Money is conserved: the amount debited always equals the amount
    /// credited. On any failure none of the four writes take effect.
    pub async fn create_transfer(
        &self,
        from_account_id: &str,
        to_account_id: &str,
        amount: Decimal,
        description: Option<String>,
    ) -> Result<TransferOutcome, AppError> {
        if from_account_id == to_account_id {
            return Err(DomainError::SameAccountTransfer.into());
        }

        let amount = engine::validate(amount)?;

        // Fast-path existence checks before the atomic unit opens; both are
        // re-checked under lock.
        for id in [from_account_id, to_account_id] {
            if self.store.get_account(id).await?.is_none() {
                return Err(DomainError::AccountNotFound(id.to_string()).into());
            }
        }

        let mut tx = self.store.begin().await?;

        // Lock in id order regardless of transfer direction.
        let (first_id, second_id) = if from_account_id <= to_account_id {
            (from_account_id, to_account_id)
        } else {
            (to_account_id, from_account_id)
        };
        let first = tx
            .lock_account(first_id)
            .await?
            .ok_or_else(|| DomainError::AccountNotFound(first_id.to_string()))?;
        let second = tx
            .lock_account(second_id)
            .await?
            .ok_or_else(|| DomainError::AccountNotFound(second_id.to_string()))?;
        let (from, to) = if first.id == from_account_id {
            (first, second)
        } else {
            (second, first)
        };

        // Sufficiency is evaluated here, at commit time, on the locked
        // balance. Checking earlier and writing later is a lost-update race.
        engine::check_sufficient_funds(from.balance, TransactionKind::Debit, &amount)?;
        let new_from_balance = engine::apply(from.balance, TransactionKind::Debit, &amount)?;
        let new_to_balance = engine::apply(to.balance, TransactionKind::Credit, &amount)?;

        let reference = format!("TRF-{}", Uuid::new_v4());

        let debit = tx
            .insert_transaction(
                from_account_id,
                NewTransaction {
                    kind: TransactionKind::Debit,
                    amount: amount.value(),
                    label: description.clone().unwrap_or_else(|| "Transfer out".to_string()),
                    balance_after: new_from_balance,
                    reference: Some(reference.clone()),
                },
            )
            .await?;
        tx.update_balance(from_account_id, new_from_balance).await?;

        let credit = tx
            .insert_transaction(
                to_account_id,
                NewTransaction {
                    kind: TransactionKind::Credit,
                    amount: amount.value(),
                    label: description.unwrap_or_else(|| "Transfer in".to_string()),
                    balance_after: new_to_balance,
                    reference: Some(reference.clone()),
                },
            )
            .await?;
        tx.update_balance(to_account_id, new_to_balance).await?;

        tx.commit().await?;

        let from_account = self
            .store
            .get_account(from_account_id)
            .await?
            .ok_or_else(|| AppError::Internal("source account missing after commit".to_string()))?;
        let to_account = self
            .store
            .get_account(to_account_id)
            .await?
            .ok_or_else(|| AppError::Internal("destination account missing after commit".to_string()))?;

        Ok(TransferOutcome {
            from_account,
            to_account,
            debit,
            credit,
            reference,
        })
    }
}
