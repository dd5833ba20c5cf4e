//! Account repository.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, DatabaseConnection, DbErr, EntityTrait};
use walletd_core::ledger::Account;
use walletd_shared::types::{AccountId, UserId};

use crate::entities::accounts;

/// Repository for account profiles.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    db: DatabaseConnection,
}

impl AccountRepository {
    /// Creates a new account repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds an account by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, DbErr> {
        let model = accounts::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await?;
        Ok(model.map(to_domain))
    }

    /// Inserts a new account.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails, including when the user already
    /// has an account.
    pub async fn create(&self, account: &Account) -> Result<(), DbErr> {
        accounts::ActiveModel {
            id: Set(account.id.into_inner()),
            user_id: Set(account.user_id.into_inner()),
            name: Set(account.name.clone()),
            surname: Set(account.surname.clone()),
            created_at: Set(account.created_at.into()),
            updated_at: Set(account.updated_at.into()),
        }
        .insert(&self.db)
        .await?;
        Ok(())
    }
}

fn to_domain(model: accounts::Model) -> Account {
    Account {
        id: AccountId::from_uuid(model.id),
        user_id: UserId::from_uuid(model.user_id),
        name: model.name,
        surname: model.surname,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}
