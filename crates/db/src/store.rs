//! `PostgreSQL` implementation of the ledger store.

use std::time::Duration;

use async_trait::async_trait;
use sea_orm::DatabaseConnection;
use walletd_core::ledger::{
    Account, LedgerStore, LedgerUnit, StoreError, TransactionFilter, Wallet, WalletFilter,
    WalletTransaction,
};
use walletd_shared::types::{AccountId, PageRequest, TransactionId, WalletId};

use crate::error::store_error;
use crate::repositories::{AccountRepository, WalletRepository, WalletTransactionRepository};
use crate::unit::PgLedgerUnit;

/// Ledger store backed by a `SeaORM` connection pool.
#[derive(Debug, Clone)]
pub struct PgLedgerStore {
    db: DatabaseConnection,
    accounts: AccountRepository,
    wallets: WalletRepository,
    transactions: WalletTransactionRepository,
    lock_timeout: Duration,
}

impl PgLedgerStore {
    /// Creates a store whose units wait at most `lock_timeout` for a row lock.
    #[must_use]
    pub fn new(db: DatabaseConnection, lock_timeout: Duration) -> Self {
        Self {
            accounts: AccountRepository::new(db.clone()),
            wallets: WalletRepository::new(db.clone()),
            transactions: WalletTransactionRepository::new(db.clone()),
            db,
            lock_timeout,
        }
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn begin(&self) -> Result<Box<dyn LedgerUnit>, StoreError> {
        let unit = PgLedgerUnit::begin(&self.db, self.lock_timeout)
            .await
            .map_err(store_error)?;
        Ok(Box::new(unit))
    }

    async fn find_account(&self, id: AccountId) -> Result<Option<Account>, StoreError> {
        self.accounts.find_by_id(id).await.map_err(store_error)
    }

    async fn insert_account(&self, account: &Account) -> Result<(), StoreError> {
        self.accounts.create(account).await.map_err(store_error)
    }

    async fn find_wallet(&self, id: WalletId) -> Result<Option<Wallet>, StoreError> {
        self.wallets.find_by_id(id).await.map_err(store_error)
    }

    async fn insert_wallet(&self, wallet: &Wallet) -> Result<(), StoreError> {
        self.wallets.create(wallet).await.map_err(store_error)
    }

    async fn list_wallets(
        &self,
        filter: WalletFilter,
        page: PageRequest,
    ) -> Result<Vec<Wallet>, StoreError> {
        self.wallets.list(filter, page).await.map_err(store_error)
    }

    async fn count_wallets(&self, filter: WalletFilter) -> Result<u64, StoreError> {
        self.wallets.count(filter).await.map_err(store_error)
    }

    async fn find_transaction(
        &self,
        id: TransactionId,
    ) -> Result<Option<WalletTransaction>, StoreError> {
        self.transactions.find_by_id(id).await.map_err(store_error)
    }

    async fn list_transactions(
        &self,
        filter: TransactionFilter,
        page: PageRequest,
    ) -> Result<Vec<WalletTransaction>, StoreError> {
        self.transactions
            .list(filter, page)
            .await
            .map_err(store_error)
    }

    async fn count_transactions(&self, filter: TransactionFilter) -> Result<u64, StoreError> {
        self.transactions.count(filter).await.map_err(store_error)
    }
}
