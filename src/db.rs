//! Database module
//!
//! Pool creation and self-initializing schema.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::config::Config;

/// Create the connection pool.
pub async fn connect(config: &Config) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
}

/// Create the ledger tables if they do not exist yet.
///
/// `seq` is a monotonic insert counter so "most recent first" stays stable
/// even when two commits land in the same timestamp tick.
pub async fn init_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS accounts (
            id          TEXT PRIMARY KEY,
            owner_name  TEXT NOT NULL,
            balance     NUMERIC(19, 2) NOT NULL,
            currency    TEXT NOT NULL,
            created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS transactions (
            id            UUID PRIMARY KEY,
            seq           BIGSERIAL,
            account_id    TEXT NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
            kind          TEXT NOT NULL CHECK (kind IN ('credit', 'debit')),
            amount        NUMERIC(19, 2) NOT NULL CHECK (amount > 0),
            label         TEXT NOT NULL,
            balance_after NUMERIC(19, 2) NOT NULL,
            reference     TEXT,
            created_at    TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_transactions_account_seq
        ON transactions (account_id, seq DESC)
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS cards (
            id              UUID PRIMARY KEY,
            account_id      TEXT NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
            card_number     TEXT NOT NULL,
            kind            TEXT NOT NULL CHECK (kind IN ('debit', 'credit', 'virtual')),
            cardholder_name TEXT NOT NULL,
            expiry_date     TEXT NOT NULL,
            cvv             TEXT NOT NULL,
            card_limit      NUMERIC(19, 2),
            status          TEXT NOT NULL,
            created_at      TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS loans (
            id                UUID PRIMARY KEY,
            account_id        TEXT NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
            kind              TEXT NOT NULL CHECK (kind IN ('personal', 'mortgage', 'auto')),
            amount            NUMERIC(19, 2) NOT NULL CHECK (amount > 0),
            remaining_balance NUMERIC(19, 2) NOT NULL,
            interest_rate     NUMERIC(5, 2) NOT NULL CHECK (interest_rate > 0),
            duration_months   INTEGER NOT NULL CHECK (duration_months > 0),
            monthly_payment   NUMERIC(19, 2) NOT NULL,
            status            TEXT NOT NULL,
            created_at        TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Simple connectivity check.
pub async fn verify_connection(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}
