//! Wallet repository.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait,
    ActiveValue::{Set, Unchanged},
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Select,
};
use walletd_core::ledger::{Wallet, WalletFilter};
use walletd_shared::types::{AccountId, PageRequest, WalletId};

use crate::entities::wallets;

/// Repository for wallets.
#[derive(Debug, Clone)]
pub struct WalletRepository {
    db: DatabaseConnection,
}

impl WalletRepository {
    /// Creates a new wallet repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a wallet by ID without locking it.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: WalletId) -> Result<Option<Wallet>, DbErr> {
        let model = wallets::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await?;
        Ok(model.map(to_domain))
    }

    /// Inserts a new wallet.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails, including an unknown account.
    pub async fn create(&self, wallet: &Wallet) -> Result<(), DbErr> {
        wallets::ActiveModel {
            id: Set(wallet.id.into_inner()),
            account_id: Set(wallet.account_id.into_inner()),
            balance: Set(wallet.balance),
            created_at: Set(wallet.created_at.into()),
            updated_at: Set(wallet.updated_at.into()),
        }
        .insert(&self.db)
        .await?;
        Ok(())
    }

    /// Lists one page of wallets, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self, filter: WalletFilter, page: PageRequest) -> Result<Vec<Wallet>, DbErr> {
        let models = filtered(filter)
            .order_by_asc(wallets::Column::CreatedAt)
            .order_by_asc(wallets::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(to_domain).collect())
    }

    /// Counts wallets matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn count(&self, filter: WalletFilter) -> Result<u64, DbErr> {
        filtered(filter).count(&self.db).await
    }

    /// Reads a wallet with `SELECT ... FOR UPDATE`.
    ///
    /// The row stays locked until `conn`'s transaction ends.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the lock wait exceeds the
    /// transaction's `lock_timeout`.
    pub async fn lock<C: ConnectionTrait>(conn: &C, id: WalletId) -> Result<Option<Wallet>, DbErr> {
        let model = wallets::Entity::find_by_id(id.into_inner())
            .lock_exclusive()
            .one(conn)
            .await?;
        Ok(model.map(to_domain))
    }

    /// Writes a new balance for a wallet.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails or the wallet does not exist.
    pub async fn update_balance<C: ConnectionTrait>(conn: &C, wallet: &Wallet) -> Result<(), DbErr> {
        wallets::ActiveModel {
            id: Unchanged(wallet.id.into_inner()),
            balance: Set(wallet.balance),
            updated_at: Set(wallet.updated_at.into()),
            ..Default::default()
        }
        .update(conn)
        .await?;
        Ok(())
    }
}

fn filtered(filter: WalletFilter) -> Select<wallets::Entity> {
    let mut query = wallets::Entity::find();
    if let Some(account_id) = filter.account_id {
        query = query.filter(wallets::Column::AccountId.eq(account_id.into_inner()));
    }
    query
}

fn to_domain(model: wallets::Model) -> Wallet {
    Wallet {
        id: WalletId::from_uuid(model.id),
        account_id: AccountId::from_uuid(model.account_id),
        balance: model.balance,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}
