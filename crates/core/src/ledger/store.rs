//! Persistence contract for the ledger.
//!
//! A `LedgerStore` serves reads and opens units of work. A `LedgerUnit` holds
//! exclusive wallet locks and staged writes; nothing it stages is visible to
//! other callers until `commit`. Dropping a unit without committing discards
//! its writes and releases its locks.

use async_trait::async_trait;
use walletd_shared::types::{AccountId, PageRequest, TransactionId, WalletId};

use super::error::StoreError;
use super::types::{Account, Wallet, WalletTransaction};

/// Restricts a wallet listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalletFilter {
    /// Only wallets owned by this account.
    pub account_id: Option<AccountId>,
}

/// Restricts a transaction listing.
///
/// A row matches an account or wallet when either its own wallet or its
/// counterparty wallet matches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransactionFilter {
    /// Only rows touching wallets owned by this account.
    pub account_id: Option<AccountId>,
    /// Only rows touching this wallet.
    pub wallet_id: Option<WalletId>,
}

/// Durable storage for accounts, wallets and transaction rows.
///
/// Listings are ordered by creation time, then id, ascending.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Opens a new unit of work.
    async fn begin(&self) -> Result<Box<dyn LedgerUnit>, StoreError>;

    /// Looks up an account.
    async fn find_account(&self, id: AccountId) -> Result<Option<Account>, StoreError>;

    /// Inserts a new account.
    async fn insert_account(&self, account: &Account) -> Result<(), StoreError>;

    /// Looks up a wallet without locking it.
    async fn find_wallet(&self, id: WalletId) -> Result<Option<Wallet>, StoreError>;

    /// Inserts a new wallet.
    async fn insert_wallet(&self, wallet: &Wallet) -> Result<(), StoreError>;

    /// Lists one page of wallets.
    async fn list_wallets(
        &self,
        filter: WalletFilter,
        page: PageRequest,
    ) -> Result<Vec<Wallet>, StoreError>;

    /// Counts wallets matching `filter`.
    async fn count_wallets(&self, filter: WalletFilter) -> Result<u64, StoreError>;

    /// Looks up a transaction row.
    async fn find_transaction(
        &self,
        id: TransactionId,
    ) -> Result<Option<WalletTransaction>, StoreError>;

    /// Lists one page of transaction rows.
    async fn list_transactions(
        &self,
        filter: TransactionFilter,
        page: PageRequest,
    ) -> Result<Vec<WalletTransaction>, StoreError>;

    /// Counts transaction rows matching `filter`.
    async fn count_transactions(&self, filter: TransactionFilter) -> Result<u64, StoreError>;
}

/// One all-or-nothing unit of work.
#[async_trait]
pub trait LedgerUnit: Send {
    /// Takes the exclusive lock on a wallet and returns its current state.
    ///
    /// Blocks while another unit holds the lock. Returns `None` if the
    /// wallet does not exist.
    async fn lock_wallet(&mut self, id: WalletId) -> Result<Option<Wallet>, StoreError>;

    /// Stages a balance update. The wallet must be locked by this unit.
    async fn save_wallet(&mut self, wallet: &Wallet) -> Result<(), StoreError>;

    /// Returns every committed row touching `wallet_id`, in ledger order.
    async fn wallet_history(&mut self, wallet_id: WalletId)
    -> Result<Vec<WalletTransaction>, StoreError>;

    /// Stages a new transaction row.
    async fn insert_transaction(&mut self, transaction: &WalletTransaction)
    -> Result<(), StoreError>;

    /// Makes every staged write durable and releases the locks.
    async fn commit(self: Box<Self>) -> Result<(), StoreError>;

    /// Discards every staged write and releases the locks.
    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}
