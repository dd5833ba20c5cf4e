//! Translation of database errors into ledger store errors.

use sea_orm::{DbErr, RuntimeErr};
use tracing::warn;
use walletd_core::StoreError;

/// `PostgreSQL` SQLSTATE raised when `lock_timeout` expires.
pub const LOCK_NOT_AVAILABLE: &str = "55P03";

/// Returns the SQLSTATE code carried by `err`, if any.
#[must_use]
pub fn sqlstate(err: &DbErr) -> Option<String> {
    match err {
        DbErr::Query(RuntimeErr::SqlxError(sqlx::Error::Database(db)))
        | DbErr::Exec(RuntimeErr::SqlxError(sqlx::Error::Database(db))) => {
            db.code().map(|code| code.into_owned())
        }
        _ => None,
    }
}

/// Maps a database error onto the store contract.
#[must_use]
pub fn store_error(err: DbErr) -> StoreError {
    if sqlstate(&err).as_deref() == Some(LOCK_NOT_AVAILABLE) {
        warn!(error = %err, "Row lock wait exceeded lock_timeout");
        StoreError::LockTimeout
    } else {
        StoreError::Backend(err.to_string())
    }
}
