//! Mock bank service
//!
//! Data-generation surface: random accounts, random transaction replay, and
//! bulk reset. Generated transactions go through the same balance engine and
//! atomic protocol as real traffic, so generation can never violate the
//! ledger invariants.

use std::sync::Arc;

use chrono::{Datelike, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::{
    engine, Account, Card, CardType, DomainError, Loan, LoanType, Transaction, TransactionKind,
};
use crate::error::AppError;
use crate::store::LedgerStore;

use super::transaction::TransactionService;

pub const MAX_GENERATED_ACCOUNTS: u32 = 50;
pub const MAX_GENERATED_TRANSACTIONS: u32 = 100;

const MIN_LOAN_MONTHS: u32 = 6;
const MAX_LOAN_MONTHS: u32 = 360;
const MAX_INTEREST_RATE_PERCENT: u32 = 20;

/// Default spending limit for credit cards when the caller sets none.
const DEFAULT_CREDIT_LIMIT: u32 = 5_000;

const CURRENCIES: &[&str] = &["EUR", "USD", "GBP"];

const LABELS: &[&str] = &[
    "Online purchase",
    "ATM withdrawal",
    "Direct deposit",
    "Bill payment",
    "Transfer",
    "Refund",
    "Subscription payment",
    "Restaurant",
];

pub struct BankService {
    store: Arc<dyn LedgerStore>,
}

impl BankService {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Create `count` accounts with IBAN-like ids and random seed balances.
    pub async fn generate_accounts(
        &self,
        count: u32,
        owner: Option<String>,
    ) -> Result<Vec<Account>, AppError> {
        if count == 0 || count > MAX_GENERATED_ACCOUNTS {
            return Err(AppError::InvalidRequest(format!(
                "count must be between 1 and {MAX_GENERATED_ACCOUNTS}"
            )));
        }

        let owner = owner.unwrap_or_else(|| "Mock User".to_string());
        let mut accounts = Vec::with_capacity(count as usize);

        for _ in 0..count {
            // Draw everything before the await so the RNG never crosses it.
            let (id, balance, currency) = {
                let mut rng = rand::thread_rng();
                let id = generate_account_number(&mut rng);
                let balance = Decimal::from(rng.gen_range(1_000..=51_000));
                let currency = CURRENCIES.choose(&mut rng).copied().unwrap_or("EUR");
                (id, balance, currency.to_string())
            };

            let account = self
                .store
                .insert_account(Account {
                    id,
                    owner_name: owner.clone(),
                    balance,
                    currency,
                    created_at: Utc::now(),
                    transactions: Vec::new(),
                })
                .await?;
            accounts.push(account);
        }

        Ok(accounts)
    }

    /// Replay `count` random credits/debits against one account.
    ///
    /// Each generated row is a real committed transaction. A debit that
    /// would overdraw the account is re-issued as a credit, so generation
    /// never drives a balance negative.
    pub async fn generate_transactions(
        &self,
        account_id: &str,
        count: u32,
    ) -> Result<Vec<Transaction>, AppError> {
        if count == 0 || count > MAX_GENERATED_TRANSACTIONS {
            return Err(AppError::InvalidRequest(format!(
                "count must be between 1 and {MAX_GENERATED_TRANSACTIONS}"
            )));
        }

        if self.store.get_account(account_id).await?.is_none() {
            return Err(DomainError::AccountNotFound(account_id.to_string()).into());
        }

        let transactions = TransactionService::new(self.store.clone());
        let mut generated = Vec::with_capacity(count as usize);

        for _ in 0..count {
            let (kind, amount, label) = {
                let mut rng = rand::thread_rng();
                let kind = if rng.gen_bool(0.5) {
                    TransactionKind::Credit
                } else {
                    TransactionKind::Debit
                };
                let amount = Decimal::from(rng.gen_range(10..=510));
                let label = LABELS.choose(&mut rng).copied().unwrap_or("Transfer");
                (kind, amount, label.to_string())
            };

            let outcome = match transactions
                .create_transaction(account_id, kind, amount, Some(label.clone()))
                .await
            {
                Ok(outcome) => outcome,
                Err(AppError::Domain(DomainError::InsufficientFunds { .. })) => {
                    transactions
                        .create_transaction(account_id, TransactionKind::Credit, amount, Some(label))
                        .await?
                }
                Err(e) => return Err(e),
            };
            generated.push(outcome.transaction);
        }

        Ok(generated)
    }

    /// Issue a card against an account. The cardholder name is the account
    /// owner's name in uppercase; number, expiry and CVV are generated.
    pub async fn create_card(
        &self,
        account_id: &str,
        kind: CardType,
        limit: Option<Decimal>,
    ) -> Result<Card, AppError> {
        if let Some(limit) = limit {
            if limit <= Decimal::ZERO {
                return Err(AppError::InvalidRequest("limit must be positive".to_string()));
            }
        }

        let account = self
            .store
            .get_account(account_id)
            .await?
            .ok_or_else(|| DomainError::AccountNotFound(account_id.to_string()))?;

        let (card_number, expiry_date, cvv) = {
            let mut rng = rand::thread_rng();
            (
                generate_card_number(&mut rng),
                generate_expiry_date(&mut rng),
                format!("{:03}", rng.gen_range(0..1000)),
            )
        };

        let limit = limit.or(match kind {
            CardType::Credit => Some(Decimal::from(DEFAULT_CREDIT_LIMIT)),
            CardType::Debit | CardType::Virtual => None,
        });

        let card = Card {
            id: Uuid::new_v4(),
            account_id: account_id.to_string(),
            card_number,
            kind,
            cardholder_name: account.owner_name.to_uppercase(),
            expiry_date,
            cvv,
            limit,
            status: "active".to_string(),
            created_at: Utc::now(),
        };
        Ok(self.store.insert_card(card).await?)
    }

    /// List the cards issued against one account.
    pub async fn list_cards(&self, account_id: &str) -> Result<Vec<Card>, AppError> {
        if self.store.get_account(account_id).await?.is_none() {
            return Err(DomainError::AccountNotFound(account_id.to_string()).into());
        }
        Ok(self.store.cards_for_account(account_id).await?)
    }

    /// Create a loan attached to an account. The monthly payment is fixed at
    /// creation via the standard amortization formula; the loan principal is
    /// not credited to the ledger balance.
    pub async fn create_loan(
        &self,
        account_id: &str,
        kind: LoanType,
        amount: Decimal,
        interest_rate: Decimal,
        duration_months: u32,
    ) -> Result<Loan, AppError> {
        let amount = engine::validate(amount)?;
        if interest_rate <= Decimal::ZERO || interest_rate > Decimal::from(MAX_INTEREST_RATE_PERCENT)
        {
            return Err(AppError::InvalidRequest(format!(
                "interestRate must be between 0 and {MAX_INTEREST_RATE_PERCENT}"
            )));
        }
        if !(MIN_LOAN_MONTHS..=MAX_LOAN_MONTHS).contains(&duration_months) {
            return Err(AppError::InvalidRequest(format!(
                "durationMonths must be between {MIN_LOAN_MONTHS} and {MAX_LOAN_MONTHS}"
            )));
        }

        if self.store.get_account(account_id).await?.is_none() {
            return Err(DomainError::AccountNotFound(account_id.to_string()).into());
        }

        let monthly_payment = monthly_payment(amount.value(), interest_rate, duration_months)
            .ok_or_else(|| {
                AppError::InvalidRequest("loan parameters out of range".to_string())
            })?;

        let loan = Loan {
            id: Uuid::new_v4(),
            account_id: account_id.to_string(),
            kind,
            amount: amount.value(),
            remaining_balance: amount.value(),
            interest_rate,
            duration_months,
            monthly_payment,
            status: "active".to_string(),
            created_at: Utc::now(),
        };
        Ok(self.store.insert_loan(loan).await?)
    }

    /// List the loans attached to one account.
    pub async fn list_loans(&self, account_id: &str) -> Result<Vec<Loan>, AppError> {
        if self.store.get_account(account_id).await?.is_none() {
            return Err(DomainError::AccountNotFound(account_id.to_string()).into());
        }
        Ok(self.store.loans_for_account(account_id).await?)
    }

    /// Delete all mock data. Returns the number of accounts removed.
    pub async fn reset(&self) -> Result<u64, AppError> {
        Ok(self.store.reset().await?)
    }
}

fn generate_account_number<R: Rng>(rng: &mut R) -> String {
    let digits: String = (0..20).map(|_| char::from(b'0' + rng.gen_range(0..10))).collect();
    format!("FR76{digits}")
}

/// 16-digit Luhn-valid card number with a Visa-style prefix.
fn generate_card_number<R: Rng>(rng: &mut R) -> String {
    let mut number = String::from("4532");
    for _ in 0..11 {
        number.push(char::from(b'0' + rng.gen_range(0..10)));
    }
    number.push(char::from(b'0' + luhn_check_digit(&number)));
    number
}

/// Check digit that makes `digits` + itself pass the Luhn checksum.
fn luhn_check_digit(digits: &str) -> u8 {
    let sum: u32 = digits
        .bytes()
        .rev()
        .enumerate()
        .map(|(i, b)| {
            let mut d = u32::from(b - b'0');
            // Every second digit from the right doubles, counting the
            // yet-to-be-appended check digit as position zero.
            if i % 2 == 0 {
                d *= 2;
                if d > 9 {
                    d -= 9;
                }
            }
            d
        })
        .sum();
    ((10 - sum % 10) % 10) as u8
}

/// `MM/YY`, one to five years out.
fn generate_expiry_date<R: Rng>(rng: &mut R) -> String {
    let month = rng.gen_range(1..=12);
    let year = (Utc::now().year() + rng.gen_range(1..=5)) % 100;
    format!("{month:02}/{year:02}")
}

/// Fixed monthly payment for a fully amortizing loan:
/// `P * r * (1+r)^n / ((1+r)^n - 1)` with `r` the monthly rate.
fn monthly_payment(principal: Decimal, annual_rate_percent: Decimal, months: u32) -> Option<Decimal> {
    let monthly_rate = annual_rate_percent.checked_div(Decimal::from(1_200))?;
    let base = Decimal::ONE + monthly_rate;
    let mut factor = Decimal::ONE;
    for _ in 0..months {
        factor = factor.checked_mul(base)?;
    }
    let numerator = principal.checked_mul(monthly_rate)?.checked_mul(factor)?;
    let denominator = factor - Decimal::ONE;
    if denominator <= Decimal::ZERO {
        return None;
    }
    Some(numerator.checked_div(denominator)?.round_dp(2))
}
