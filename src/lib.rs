//! demobank Library
//!
//! Digital-banking demo API. The core is the ledger consistency engine:
//! balance arithmetic, the transactional protocol keeping stored balances
//! consistent with transaction history under concurrent writes, and the
//! double-entry transfer.

pub mod api;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod service;
pub mod store;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use domain::{Amount, DomainError};
