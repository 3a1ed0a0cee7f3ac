//! API Routes
//!
//! HTTP endpoint definitions.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    Account, Card, CardType, DomainError, Loan, LoanType, Transaction, TransactionKind,
};
use crate::error::{AppError, AppJson};
use crate::service::{BankService, TransactionService, TransferService};

use super::AppState;

// =========================================================================
// Request/Response types
// =========================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub id: String,
    pub owner_name: String,
    pub balance: Decimal,
    pub currency: String,
    pub created_at: DateTime<Utc>,
    pub transactions: Vec<TransactionResponse>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            owner_name: account.owner_name,
            balance: account.balance,
            currency: account.currency,
            created_at: account.created_at,
            transactions: account.transactions.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponse {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub label: String,
    pub balance_after: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Transaction> for TransactionResponse {
    fn from(txn: Transaction) -> Self {
        Self {
            id: txn.id,
            kind: txn.kind,
            amount: txn.amount,
            label: txn.label,
            balance_after: txn.balance_after,
            reference: txn.reference,
            created_at: txn.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateTransactionRequest {
    /// Open on the wire, validated into the closed TransactionKind set.
    #[serde(rename = "type")]
    pub kind: String,
    pub amount: String,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateTransactionResponse {
    pub account: AccountResponse,
    pub transaction: TransactionResponse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferType {
    #[default]
    Sepa,
    International,
    Instant,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub from_account_id: String,
    pub to_account_id: String,
    pub amount: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub transfer_type: TransferType,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferResponse {
    pub reference: String,
    pub transfer_type: TransferType,
    pub amount: Decimal,
    pub from_account: AccountResponse,
    pub to_account: AccountResponse,
    pub debit: TransactionResponse,
    pub credit: TransactionResponse,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateAccountsRequest {
    #[serde(default = "default_account_count")]
    pub count: u32,
    #[serde(default)]
    pub owner: Option<String>,
}

fn default_account_count() -> u32 {
    5
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateTransactionsRequest {
    #[serde(default = "default_transaction_count")]
    pub count: u32,
    pub account_id: String,
}

fn default_transaction_count() -> u32 {
    10
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCardRequest {
    pub account_id: String,
    #[serde(default)]
    pub card_type: CardType,
    #[serde(default)]
    pub limit: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardResponse {
    pub id: Uuid,
    pub account_id: String,
    pub card_number: String,
    #[serde(rename = "type")]
    pub kind: CardType,
    pub cardholder_name: String,
    pub expiry_date: String,
    pub cvv: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<Decimal>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl From<Card> for CardResponse {
    fn from(card: Card) -> Self {
        Self {
            id: card.id,
            account_id: card.account_id,
            card_number: card.card_number,
            kind: card.kind,
            cardholder_name: card.cardholder_name,
            expiry_date: card.expiry_date,
            cvv: card.cvv,
            limit: card.limit,
            status: card.status,
            created_at: card.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLoanRequest {
    pub account_id: String,
    pub loan_type: LoanType,
    pub amount: String,
    pub interest_rate: String,
    pub duration_months: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanResponse {
    pub id: Uuid,
    pub account_id: String,
    #[serde(rename = "type")]
    pub kind: LoanType,
    pub amount: Decimal,
    pub remaining_balance: Decimal,
    pub interest_rate: Decimal,
    pub duration_months: u32,
    pub monthly_payment: Decimal,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl From<Loan> for LoanResponse {
    fn from(loan: Loan) -> Self {
        Self {
            id: loan.id,
            account_id: loan.account_id,
            kind: loan.kind,
            amount: loan.amount,
            remaining_balance: loan.remaining_balance,
            interest_rate: loan.interest_rate,
            duration_months: loan.duration_months,
            monthly_payment: loan.monthly_payment,
            status: loan.status,
            created_at: loan.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetResponse {
    pub message: String,
    pub accounts_deleted: u64,
}

// =========================================================================
// API Router
// =========================================================================

/// Create the API router
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/accounts", get(list_accounts))
        .route("/accounts/:account_id", get(get_account))
        .route(
            "/accounts/:account_id/transactions",
            get(list_transactions).post(create_transaction),
        )
        .route("/bank/transfers", post(create_transfer))
        .route("/bank/cards", post(create_card))
        .route("/bank/cards/:account_id", get(list_cards))
        .route("/bank/loans", post(create_loan))
        .route("/bank/loans/:account_id", get(list_loans))
        .route("/bank/accounts/generate", post(generate_accounts))
        .route("/bank/transactions/generate", post(generate_transactions))
        .route("/bank/reset", delete(reset_bank))
}

// =========================================================================
// GET /accounts
// =========================================================================

/// List all accounts with nested transaction history
async fn list_accounts(
    State(state): State<AppState>,
) -> Result<Json<Vec<AccountResponse>>, AppError> {
    let accounts = state.store.list_accounts().await?;
    Ok(Json(accounts.into_iter().map(Into::into).collect()))
}

// =========================================================================
// GET /accounts/:account_id
// =========================================================================

/// Get a single account
async fn get_account(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
) -> Result<Json<AccountResponse>, AppError> {
    let account = state
        .store
        .get_account(&account_id)
        .await?
        .ok_or(DomainError::AccountNotFound(account_id))?;
    Ok(Json(account.into()))
}

// =========================================================================
// GET /accounts/:account_id/transactions
// =========================================================================

/// Get an account's transaction history, most recent first
async fn list_transactions(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
) -> Result<Json<Vec<TransactionResponse>>, AppError> {
    let service = TransactionService::new(state.store.clone());
    let transactions = service.list_transactions(&account_id).await?;
    Ok(Json(transactions.into_iter().map(Into::into).collect()))
}

// =========================================================================
// POST /accounts/:account_id/transactions
// =========================================================================

/// Apply a single credit/debit to an account
async fn create_transaction(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
    AppJson(request): AppJson<CreateTransactionRequest>,
) -> Result<(StatusCode, Json<CreateTransactionResponse>), AppError> {
    let kind: TransactionKind = request.kind.parse()?;
    let amount: Decimal = request
        .amount
        .parse()
        .map_err(|_| DomainError::InvalidAmount(format!("not a decimal: {:?}", request.amount)))?;

    let service = TransactionService::new(state.store.clone());
    let outcome = service
        .create_transaction(&account_id, kind, amount, request.label)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateTransactionResponse {
            account: outcome.account.into(),
            transaction: outcome.transaction.into(),
        }),
    ))
}

// =========================================================================
// POST /bank/transfers
// =========================================================================

/// Double-entry transfer between two accounts
async fn create_transfer(
    State(state): State<AppState>,
    AppJson(request): AppJson<TransferRequest>,
) -> Result<(StatusCode, Json<TransferResponse>), AppError> {
    let amount: Decimal = request
        .amount
        .parse()
        .map_err(|_| DomainError::InvalidAmount(format!("not a decimal: {:?}", request.amount)))?;

    let service = TransferService::new(state.store.clone());
    let outcome = service
        .create_transfer(
            &request.from_account_id,
            &request.to_account_id,
            amount,
            request.description,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(TransferResponse {
            reference: outcome.reference,
            transfer_type: request.transfer_type,
            amount: outcome.debit.amount,
            from_account: outcome.from_account.into(),
            to_account: outcome.to_account.into(),
            debit: outcome.debit.into(),
            credit: outcome.credit.into(),
            timestamp: Utc::now(),
        }),
    ))
}

// =========================================================================
// POST /bank/cards
// =========================================================================

/// Issue a mock card against an account
async fn create_card(
    State(state): State<AppState>,
    AppJson(request): AppJson<CreateCardRequest>,
) -> Result<(StatusCode, Json<CardResponse>), AppError> {
    let limit = request
        .limit
        .map(|raw| {
            raw.parse::<Decimal>()
                .map_err(|_| AppError::InvalidRequest(format!("not a decimal limit: {raw:?}")))
        })
        .transpose()?;

    let service = BankService::new(state.store.clone());
    let card = service
        .create_card(&request.account_id, request.card_type, limit)
        .await?;
    Ok((StatusCode::CREATED, Json(card.into())))
}

// =========================================================================
// GET /bank/cards/:account_id
// =========================================================================

/// List an account's cards
async fn list_cards(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
) -> Result<Json<Vec<CardResponse>>, AppError> {
    let service = BankService::new(state.store.clone());
    let cards = service.list_cards(&account_id).await?;
    Ok(Json(cards.into_iter().map(Into::into).collect()))
}

// =========================================================================
// POST /bank/loans
// =========================================================================

/// Create a mock loan attached to an account
async fn create_loan(
    State(state): State<AppState>,
    AppJson(request): AppJson<CreateLoanRequest>,
) -> Result<(StatusCode, Json<LoanResponse>), AppError> {
    let amount: Decimal = request
        .amount
        .parse()
        .map_err(|_| DomainError::InvalidAmount(format!("not a decimal: {:?}", request.amount)))?;
    let interest_rate: Decimal = request.interest_rate.parse().map_err(|_| {
        AppError::InvalidRequest(format!("not a decimal rate: {:?}", request.interest_rate))
    })?;

    let service = BankService::new(state.store.clone());
    let loan = service
        .create_loan(
            &request.account_id,
            request.loan_type,
            amount,
            interest_rate,
            request.duration_months,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(loan.into())))
}

// =========================================================================
// GET /bank/loans/:account_id
// =========================================================================

/// List an account's loans
async fn list_loans(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
) -> Result<Json<Vec<LoanResponse>>, AppError> {
    let service = BankService::new(state.store.clone());
    let loans = service.list_loans(&account_id).await?;
    Ok(Json(loans.into_iter().map(Into::into).collect()))
}

// =========================================================================
// POST /bank/accounts/generate
// =========================================================================

/// Generate mock accounts
async fn generate_accounts(
    State(state): State<AppState>,
    AppJson(request): AppJson<GenerateAccountsRequest>,
) -> Result<(StatusCode, Json<Vec<AccountResponse>>), AppError> {
    let service = BankService::new(state.store.clone());
    let accounts = service.generate_accounts(request.count, request.owner).await?;
    Ok((
        StatusCode::CREATED,
        Json(accounts.into_iter().map(Into::into).collect()),
    ))
}

// =========================================================================
// POST /bank/transactions/generate
// =========================================================================

/// Generate mock transactions against one account
async fn generate_transactions(
    State(state): State<AppState>,
    AppJson(request): AppJson<GenerateTransactionsRequest>,
) -> Result<(StatusCode, Json<Vec<TransactionResponse>>), AppError> {
    let service = BankService::new(state.store.clone());
    let transactions = service
        .generate_transactions(&request.account_id, request.count)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(transactions.into_iter().map(Into::into).collect()),
    ))
}

// =========================================================================
// DELETE /bank/reset
// =========================================================================

/// Delete all mock data
async fn reset_bank(State(state): State<AppState>) -> Result<Json<ResetResponse>, AppError> {
    let service = BankService::new(state.store.clone());
    let accounts_deleted = service.reset().await?;
    Ok(Json(ResetResponse {
        message: "All data deleted successfully".to_string(),
        accounts_deleted,
    }))
}
