//! Wallet ledger.
//!
//! This module implements the ledger engine:
//! - Transaction kind classification
//! - Wallet and transaction entities
//! - The persistence contract (`LedgerStore`, `LedgerUnit`)
//! - The balance mutator, the only path that changes a balance
//! - Balance reconciliation from ledger rows
//! - The scoped service façade

pub mod balance;
pub mod error;
pub mod kind;
pub mod mutator;
pub mod service;
pub mod store;
pub mod types;

#[cfg(test)]
mod service_props;

pub use balance::ledger_balance;
pub use error::{LedgerError, StoreError};
pub use kind::Kind;
pub use mutator::{Applied, BalanceMutator, Transferred};
pub use service::LedgerService;
pub use store::{LedgerStore, LedgerUnit, TransactionFilter, WalletFilter};
pub use types::{
    Account, INSUFFICIENT_FUNDS_MSG, MAX_TEXT_LEN, Memo, NewTransaction, NewTransfer,
    Reconciliation, Wallet, WalletTransaction,
};
