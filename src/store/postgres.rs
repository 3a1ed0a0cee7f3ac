//! Postgres Ledger Store
//!
//! Canonical implementation. Atomic units map to database transactions and
//! per-account serialization to `SELECT ... FOR UPDATE` row locks.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use crate::domain::{
    Account, AccountRecord, Card, CardType, Loan, LoanType, NewTransaction, Transaction,
    TransactionKind,
};

use super::{LedgerStore, LedgerTx, StoreError};

#[derive(Debug, Clone)]
pub struct PgLedgerStore {
    pool: PgPool,
}

impl PgLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Fetch an account's history inside the caller's transaction, so the rows
/// are from the same snapshot as the account row already read there.
async fn fetch_transactions(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    account_id: &str,
) -> Result<Vec<Transaction>, StoreError> {
    let rows: Vec<(
        Uuid,
        String,
        Decimal,
        String,
        Decimal,
        Option<String>,
        DateTime<Utc>,
    )> = sqlx::query_as(
        r#"
        SELECT id, kind, amount, label, balance_after, reference, created_at
        FROM transactions
        WHERE account_id = $1
        ORDER BY seq DESC
        "#,
    )
    .bind(account_id)
    .fetch_all(&mut **tx)
    .await?;

    rows.into_iter()
        .map(|(id, kind, amount, label, balance_after, reference, created_at)| {
            let kind: TransactionKind = kind
                .parse()
                .map_err(|_| StoreError::Unavailable(format!("corrupt transaction kind: {kind}")))?;
            Ok(Transaction {
                id,
                kind,
                amount,
                label,
                balance_after,
                reference,
                created_at,
            })
        })
        .collect()
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn get_account(&self, id: &str) -> Result<Option<Account>, StoreError> {
        // Account row and history read from one snapshot: a commit landing
        // between two pool queries could desync balance and history.
        // REPEATABLE READ is needed because READ COMMITTED re-snapshots per
        // statement.
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ")
            .execute(&mut *tx)
            .await?;

        let row: Option<(String, String, Decimal, String, DateTime<Utc>)> = sqlx::query_as(
            r#"
            SELECT id, owner_name, balance, currency, created_at
            FROM accounts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((id, owner_name, balance, currency, created_at)) = row else {
            return Ok(None);
        };

        let transactions = fetch_transactions(&mut tx, &id).await?;
        tx.commit().await?;

        Ok(Some(Account {
            id,
            owner_name,
            balance,
            currency,
            created_at,
            transactions,
        }))
    }

    async fn list_accounts(&self) -> Result<Vec<Account>, StoreError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ")
            .execute(&mut *tx)
            .await?;

        let rows: Vec<(String, String, Decimal, String, DateTime<Utc>)> = sqlx::query_as(
            r#"
            SELECT id, owner_name, balance, currency, created_at
            FROM accounts
            ORDER BY created_at, id
            "#,
        )
        .fetch_all(&mut *tx)
        .await?;

        let mut accounts = Vec::with_capacity(rows.len());
        for (id, owner_name, balance, currency, created_at) in rows {
            let transactions = fetch_transactions(&mut tx, &id).await?;
            accounts.push(Account {
                id,
                owner_name,
                balance,
                currency,
                created_at,
                transactions,
            });
        }
        tx.commit().await?;

        Ok(accounts)
    }

    async fn insert_account(&self, account: Account) -> Result<Account, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO accounts (id, owner_name, balance, currency, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&account.id)
        .bind(&account.owner_name)
        .bind(account.balance)
        .bind(&account.currency)
        .bind(account.created_at)
        .execute(&self.pool)
        .await?;

        Ok(account)
    }

    async fn insert_card(&self, card: Card) -> Result<Card, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO cards (id, account_id, card_number, kind, cardholder_name,
                               expiry_date, cvv, card_limit, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(card.id)
        .bind(&card.account_id)
        .bind(&card.card_number)
        .bind(card.kind.to_string())
        .bind(&card.cardholder_name)
        .bind(&card.expiry_date)
        .bind(&card.cvv)
        .bind(card.limit)
        .bind(&card.status)
        .bind(card.created_at)
        .execute(&self.pool)
        .await?;

        Ok(card)
    }

    async fn cards_for_account(&self, account_id: &str) -> Result<Vec<Card>, StoreError> {
        let rows: Vec<(
            Uuid,
            String,
            String,
            String,
            String,
            String,
            Option<Decimal>,
            String,
            DateTime<Utc>,
        )> = sqlx::query_as(
            r#"
            SELECT id, card_number, kind, cardholder_name, expiry_date, cvv,
                   card_limit, status, created_at
            FROM cards
            WHERE account_id = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(
                |(id, card_number, kind, cardholder_name, expiry_date, cvv, limit, status, created_at)| {
                    let kind: CardType = kind
                        .parse()
                        .map_err(|_| StoreError::Unavailable(format!("corrupt card type: {kind}")))?;
                    Ok(Card {
                        id,
                        account_id: account_id.to_string(),
                        card_number,
                        kind,
                        cardholder_name,
                        expiry_date,
                        cvv,
                        limit,
                        status,
                        created_at,
                    })
                },
            )
            .collect()
    }

    async fn insert_loan(&self, loan: Loan) -> Result<Loan, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO loans (id, account_id, kind, amount, remaining_balance,
                               interest_rate, duration_months, monthly_payment, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(loan.id)
        .bind(&loan.account_id)
        .bind(loan.kind.to_string())
        .bind(loan.amount)
        .bind(loan.remaining_balance)
        .bind(loan.interest_rate)
        .bind(loan.duration_months as i32)
        .bind(loan.monthly_payment)
        .bind(&loan.status)
        .bind(loan.created_at)
        .execute(&self.pool)
        .await?;

        Ok(loan)
    }

    async fn loans_for_account(&self, account_id: &str) -> Result<Vec<Loan>, StoreError> {
        let rows: Vec<(
            Uuid,
            String,
            Decimal,
            Decimal,
            Decimal,
            i32,
            Decimal,
            String,
            DateTime<Utc>,
        )> = sqlx::query_as(
            r#"
            SELECT id, kind, amount, remaining_balance, interest_rate,
                   duration_months, monthly_payment, status, created_at
            FROM loans
            WHERE account_id = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(
                |(id, kind, amount, remaining_balance, interest_rate, duration_months, monthly_payment, status, created_at)| {
                    let kind: LoanType = kind
                        .parse()
                        .map_err(|_| StoreError::Unavailable(format!("corrupt loan type: {kind}")))?;
                    Ok(Loan {
                        id,
                        account_id: account_id.to_string(),
                        kind,
                        amount,
                        remaining_balance,
                        interest_rate,
                        duration_months: duration_months as u32,
                        monthly_payment,
                        status,
                        created_at,
                    })
                },
            )
            .collect()
    }

    async fn begin(&self) -> Result<Box<dyn LedgerTx>, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgLedgerTx { tx }))
    }

    async fn reset(&self) -> Result<u64, StoreError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM transactions")
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM cards").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM loans").execute(&mut *tx).await?;
        let deleted = sqlx::query("DELETE FROM accounts")
            .execute(&mut *tx)
            .await?
            .rows_affected();
        tx.commit().await?;
        Ok(deleted)
    }
}

/// An open database transaction. sqlx rolls back on drop, which gives the
/// rollback-on-failure semantics of the atomic unit for free.
pub struct PgLedgerTx {
    tx: sqlx::Transaction<'static, Postgres>,
}

#[async_trait]
impl LedgerTx for PgLedgerTx {
    async fn lock_account(&mut self, id: &str) -> Result<Option<AccountRecord>, StoreError> {
        let row: Option<(String, String, Decimal, String)> = sqlx::query_as(
            r#"
            SELECT id, owner_name, balance, currency
            FROM accounts
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.map(|(id, owner_name, balance, currency)| AccountRecord {
            id,
            owner_name,
            balance,
            currency,
        }))
    }

    async fn update_balance(&mut self, id: &str, new_balance: Decimal) -> Result<(), StoreError> {
        sqlx::query("UPDATE accounts SET balance = $2 WHERE id = $1")
            .bind(id)
            .bind(new_balance)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn insert_transaction(
        &mut self,
        account_id: &str,
        txn: NewTransaction,
    ) -> Result<Transaction, StoreError> {
        let id = Uuid::new_v4();
        let created_at = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO transactions (id, account_id, kind, amount, label, balance_after, reference, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(id)
        .bind(account_id)
        .bind(txn.kind.to_string())
        .bind(txn.amount)
        .bind(&txn.label)
        .bind(txn.balance_after)
        .bind(&txn.reference)
        .bind(created_at)
        .execute(&mut *self.tx)
        .await?;

        Ok(Transaction {
            id,
            kind: txn.kind,
            amount: txn.amount,
            label: txn.label,
            balance_after: txn.balance_after,
            reference: txn.reference,
            created_at,
        })
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }
}
