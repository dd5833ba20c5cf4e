//! Wallet transaction repository.
//!
//! Rows are insert-only. The database rejects `UPDATE` on the table.

use chrono::Utc;
use sea_orm::{
    ActiveValue::Set, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, sea_query::Query,
};
use walletd_core::ledger::{Kind, TransactionFilter, WalletTransaction};
use walletd_shared::types::{AccountId, Amount, PageRequest, TransactionId, WalletId};

use crate::entities::{wallet_transactions, wallets};

/// Repository for ledger rows.
#[derive(Debug, Clone)]
pub struct WalletTransactionRepository {
    db: DatabaseConnection,
}

impl WalletTransactionRepository {
    /// Creates a new wallet transaction repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a row by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the stored row is malformed.
    pub async fn find_by_id(&self, id: TransactionId) -> Result<Option<WalletTransaction>, DbErr> {
        wallet_transactions::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await?
            .map(to_domain)
            .transpose()
    }

    /// Lists one page of rows, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a stored row is malformed.
    pub async fn list(
        &self,
        filter: TransactionFilter,
        page: PageRequest,
    ) -> Result<Vec<WalletTransaction>, DbErr> {
        let models = ordered(filtered(filter))
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;
        models.into_iter().map(to_domain).collect()
    }

    /// Counts rows matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn count(&self, filter: TransactionFilter) -> Result<u64, DbErr> {
        filtered(filter).count(&self.db).await
    }

    /// Returns every row touching `wallet_id`, in ledger order.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a stored row is malformed.
    pub async fn history<C: ConnectionTrait>(
        conn: &C,
        wallet_id: WalletId,
    ) -> Result<Vec<WalletTransaction>, DbErr> {
        let models = ordered(wallet_transactions::Entity::find().filter(touching(wallet_id)))
            .all(conn)
            .await?;
        models.into_iter().map(to_domain).collect()
    }

    /// Appends a row.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails or violates a table constraint.
    pub async fn insert<C: ConnectionTrait>(
        conn: &C,
        row: &WalletTransaction,
    ) -> Result<(), DbErr> {
        let model = wallet_transactions::ActiveModel {
            id: Set(row.id.into_inner()),
            wallet_id: Set(row.wallet_id.into_inner()),
            counterparty_wallet_id: Set(row.counterparty_wallet_id.map(WalletId::into_inner)),
            description: Set(row.description.clone()),
            amount: Set(row.amount.value()),
            done: Set(row.done),
            kind: Set(row.kind.code()),
            error_msg: Set(row.error_msg.clone()),
            extra_info: Set(row.extra_info.clone()),
            created_at: Set(row.created_at.into()),
        };
        wallet_transactions::Entity::insert(model)
            .exec_without_returning(conn)
            .await?;
        Ok(())
    }
}

fn touching(wallet_id: WalletId) -> Condition {
    Condition::any()
        .add(wallet_transactions::Column::WalletId.eq(wallet_id.into_inner()))
        .add(wallet_transactions::Column::CounterpartyWalletId.eq(wallet_id.into_inner()))
}

fn owned_by(account_id: AccountId) -> Condition {
    let owned = Query::select()
        .column(wallets::Column::Id)
        .from(wallets::Entity)
        .and_where(wallets::Column::AccountId.eq(account_id.into_inner()))
        .to_owned();
    Condition::any()
        .add(wallet_transactions::Column::WalletId.in_subquery(owned.clone()))
        .add(wallet_transactions::Column::CounterpartyWalletId.in_subquery(owned))
}

fn filtered(filter: TransactionFilter) -> Select<wallet_transactions::Entity> {
    let mut condition = Condition::all();
    if let Some(wallet_id) = filter.wallet_id {
        condition = condition.add(touching(wallet_id));
    }
    if let Some(account_id) = filter.account_id {
        condition = condition.add(owned_by(account_id));
    }
    wallet_transactions::Entity::find().filter(condition)
}

fn ordered(query: Select<wallet_transactions::Entity>) -> Select<wallet_transactions::Entity> {
    query
        .order_by_asc(wallet_transactions::Column::CreatedAt)
        .order_by_asc(wallet_transactions::Column::Id)
}

fn to_domain(model: wallet_transactions::Model) -> Result<WalletTransaction, DbErr> {
    let kind = Kind::from_code(model.kind).ok_or_else(|| {
        DbErr::Type(format!(
            "wallet transaction {} has unknown kind {}",
            model.id, model.kind
        ))
    })?;
    let amount = Amount::new(model.amount)
        .map_err(|e| DbErr::Type(format!("wallet transaction {}: {e}", model.id)))?;

    Ok(WalletTransaction {
        id: TransactionId::from_uuid(model.id),
        wallet_id: WalletId::from_uuid(model.wallet_id),
        counterparty_wallet_id: model.counterparty_wallet_id.map(WalletId::from_uuid),
        description: model.description,
        amount,
        done: model.done,
        kind,
        error_msg: model.error_msg,
        extra_info: model.extra_info,
        created_at: model.created_at.with_timezone(&Utc),
    })
}
