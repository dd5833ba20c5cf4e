//! `SeaORM` Entity for wallet_transactions table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "wallet_transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub wallet_id: Uuid,
    pub counterparty_wallet_id: Option<Uuid>,
    pub description: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((7, 2)))")]
    pub amount: Decimal,
    pub done: bool,
    pub kind: i16,
    pub error_msg: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub extra_info: Option<String>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::wallets::Entity",
        from = "Column::WalletId",
        to = "super::wallets::Column::Id",
        on_delete = "Cascade"
    )]
    Wallets,
    #[sea_orm(
        belongs_to = "super::wallets::Entity",
        from = "Column::CounterpartyWalletId",
        to = "super::wallets::Column::Id"
    )]
    CounterpartyWallets,
}

impl Related<super::wallets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Wallets.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
