//! Balance Engine
//!
//! Pure computation and validation: no I/O, never suspends. Every balance
//! mutation in the system goes through these three functions, inside an
//! atomic unit owned by the store.

use rust_decimal::Decimal;

use super::account::TransactionKind;
use super::error::DomainError;
use super::money::Amount;

/// Validate a proposed amount, producing the domain-checked [`Amount`].
pub fn validate(amount: Decimal) -> Result<Amount, DomainError> {
    Amount::new(amount)
}

/// Compute the balance after applying a transaction.
///
/// Credit adds, debit subtracts. Fixed-point decimal arithmetic; no rounding
/// beyond the monetary precision already enforced by [`Amount`]. A result
/// outside the representable decimal range is rejected rather than wrapped.
pub fn apply(
    balance: Decimal,
    kind: TransactionKind,
    amount: &Amount,
) -> Result<Decimal, DomainError> {
    let next = match kind {
        TransactionKind::Credit => balance.checked_add(amount.value()),
        TransactionKind::Debit => balance.checked_sub(amount.value()),
    };
    next.ok_or_else(|| DomainError::InvalidAmount("balance out of range".to_string()))
}

/// Reject a debit that would overdraw the account.
///
/// Must be called against the balance read inside the same atomic unit as
/// the write; a check against an earlier read races with concurrent debits.
/// Credits have no upper bound check. Debits never producing a negative
/// balance is a hard invariant, not a configurable policy.
pub fn check_sufficient_funds(
    balance: Decimal,
    kind: TransactionKind,
    amount: &Amount,
) -> Result<(), DomainError> {
    if kind == TransactionKind::Debit && amount.value() > balance {
        return Err(DomainError::insufficient_funds(amount.value(), balance));
    }
    Ok(())
}
