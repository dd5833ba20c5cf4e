//! Ledger error types.
//!
//! `StoreError` is what a persistence backend may report. `LedgerError` is
//! what the mutator and the service report to callers.

use thiserror::Error;
use walletd_shared::AppError;
use walletd_shared::types::{AccountId, AmountError, TransactionId, WalletId};

/// Errors reported by a `LedgerStore` implementation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// A row lock could not be acquired before the backend's lock timeout.
    #[error("lock wait timed out")]
    LockTimeout,

    /// Any other backend failure.
    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Lookup Errors ==========
    /// Wallet does not exist or is outside the caller's scope.
    #[error("Wallet not found: {0}")]
    WalletNotFound(WalletId),

    /// Transaction does not exist or is outside the caller's scope.
    #[error("Transaction not found: {0}")]
    TransactionNotFound(TransactionId),

    /// Account does not exist or is outside the caller's scope.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    // ========== Validation Errors ==========
    /// Amount is not acceptable for the operation.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Amount does not fit the ledger column.
    #[error(transparent)]
    AmountOutOfRange(#[from] AmountError),

    /// Transfer source and destination are the same wallet.
    #[error("Cannot transfer from a wallet to itself")]
    SameWallet,

    /// A text field is too long or otherwise malformed.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // ========== Business Rule Errors ==========
    /// Applying the amount would overflow the balance column.
    #[error("Balance overflow on wallet {0}")]
    BalanceOverflow(WalletId),

    // ========== Concurrency Errors ==========
    /// The wallet lock was not acquired in time.
    #[error("Timed out waiting for wallet {0}, please retry")]
    LockTimeout(WalletId),

    // ========== Storage Errors ==========
    /// Persistence failure. The unit of work was rolled back.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl LedgerError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::WalletNotFound(_) => "WALLET_NOT_FOUND",
            Self::TransactionNotFound(_) => "TRANSACTION_NOT_FOUND",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::AmountOutOfRange(_) => "AMOUNT_OUT_OF_RANGE",
            Self::SameWallet => "SAME_WALLET",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::BalanceOverflow(_) => "BALANCE_OVERFLOW",
            Self::LockTimeout(_) | Self::Store(StoreError::LockTimeout) => "LOCK_TIMEOUT",
            Self::Store(StoreError::Backend(_)) => "DATABASE_ERROR",
        }
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::LockTimeout(_) | Self::Store(StoreError::LockTimeout)
        )
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::WalletNotFound(_) => Self::NotFound("Wallet".into()),
            LedgerError::TransactionNotFound(_) => Self::NotFound("Transaction".into()),
            LedgerError::AccountNotFound(_) => Self::NotFound("Account".into()),
            LedgerError::InvalidAmount(_)
            | LedgerError::AmountOutOfRange(_)
            | LedgerError::SameWallet
            | LedgerError::InvalidInput(_) => Self::Validation(err.to_string()),
            LedgerError::BalanceOverflow(_) => Self::BusinessRule(err.to_string()),
            LedgerError::LockTimeout(_) | LedgerError::Store(StoreError::LockTimeout) => {
                Self::LockTimeout(err.to_string())
            }
            LedgerError::Store(StoreError::Backend(msg)) => Self::Database(msg),
        }
    }
}
