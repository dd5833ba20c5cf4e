//! Transaction-scoped unit of work for the Postgres ledger store.
//!
//! A unit is one database transaction with `lock_timeout` set via
//! `SET LOCAL`, so the setting ends with the transaction. Wallet locks are
//! row locks taken with `SELECT ... FOR UPDATE`.

use std::time::Duration;

use async_trait::async_trait;
use sea_orm::{ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbErr, TransactionTrait};
use walletd_core::ledger::{LedgerUnit, StoreError, Wallet, WalletTransaction};
use walletd_shared::types::WalletId;

use crate::error::store_error;
use crate::repositories::{WalletRepository, WalletTransactionRepository};

/// A database transaction holding wallet row locks.
pub struct PgLedgerUnit {
    txn: DatabaseTransaction,
}

impl PgLedgerUnit {
    /// Begins a transaction whose lock waits are bounded by `lock_timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction cannot be started or the timeout
    /// cannot be set.
    pub async fn begin(db: &DatabaseConnection, lock_timeout: Duration) -> Result<Self, DbErr> {
        let txn = db.begin().await?;

        // Interpolated from an integer, never from caller input.
        let sql = format!("SET LOCAL lock_timeout = '{}ms'", lock_timeout.as_millis());
        txn.execute_unprepared(&sql).await?;

        Ok(Self { txn })
    }

    /// Returns the underlying transaction.
    #[must_use]
    pub const fn transaction(&self) -> &DatabaseTransaction {
        &self.txn
    }
}

#[async_trait]
impl LedgerUnit for PgLedgerUnit {
    async fn lock_wallet(&mut self, id: WalletId) -> Result<Option<Wallet>, StoreError> {
        WalletRepository::lock(&self.txn, id)
            .await
            .map_err(store_error)
    }

    async fn save_wallet(&mut self, wallet: &Wallet) -> Result<(), StoreError> {
        WalletRepository::update_balance(&self.txn, wallet)
            .await
            .map_err(store_error)
    }

    async fn wallet_history(
        &mut self,
        wallet_id: WalletId,
    ) -> Result<Vec<WalletTransaction>, StoreError> {
        WalletTransactionRepository::history(&self.txn, wallet_id)
            .await
            .map_err(store_error)
    }

    async fn insert_transaction(
        &mut self,
        transaction: &WalletTransaction,
    ) -> Result<(), StoreError> {
        WalletTransactionRepository::insert(&self.txn, transaction)
            .await
            .map_err(store_error)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.txn.commit().await.map_err(store_error)
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        self.txn.rollback().await.map_err(store_error)
    }
}
