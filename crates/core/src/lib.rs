//! Wallet ledger engine for walletd.
//!
//! This crate contains the ledger rules with ZERO web or database dependencies.
//! Storage is reached through the `LedgerStore` trait.
//!
//! # Modules
//!
//! - `ledger` - Classification, balance mutation, reconciliation and the service façade
//! - `access` - Principals, access scopes and per-principal views
//! - `memory` - In-memory `LedgerStore` with per-wallet locks

pub mod access;
pub mod ledger;
pub mod memory;

pub use access::{AccessScope, Principal, TransactionView, ViewPolicy, WalletView};
pub use ledger::{LedgerError, LedgerService, LedgerStore, StoreError};
pub use memory::MemoryLedgerStore;
