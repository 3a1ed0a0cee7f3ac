//! Ledger services
//!
//! Stateless orchestrators over the Ledger Store. Each holds no balance
//! state between calls; every operation re-reads current state inside the
//! store's atomic unit before computing the next state.

mod bank;
mod transaction;
mod transfer;

pub use bank::BankService;
pub use transaction::{TransactionOutcome, TransactionService};
pub use transfer::{TransferOutcome, TransferService};
