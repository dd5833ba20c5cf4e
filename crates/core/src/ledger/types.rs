//! Ledger domain entities.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use walletd_shared::types::{AccountId, Amount, TransactionId, UserId, WalletId};

use super::kind::Kind;

/// Maximum length of a transaction description or error message.
pub const MAX_TEXT_LEN: usize = 250;

/// Message recorded on a transfer rejected for lack of funds.
pub const INSUFFICIENT_FUNDS_MSG: &str = "Transaction error: insufficient funds";

/// Identity-bound profile that owns wallets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Account ID.
    pub id: AccountId,
    /// The external user this profile belongs to.
    pub user_id: UserId,
    /// Given name.
    pub name: String,
    /// Family name.
    pub surname: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Creates a new account profile for `user_id`.
    #[must_use]
    pub fn new(user_id: UserId, name: impl Into<String>, surname: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: AccountId::new(),
            user_id,
            name: name.into(),
            surname: surname.into(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// A balance-holding entity owned by one account.
///
/// `balance` only ever changes as a side effect of recording a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    /// Wallet ID.
    pub id: WalletId,
    /// Owning account.
    pub account_id: AccountId,
    /// Current balance, two fractional digits.
    pub balance: Decimal,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Time of the last balance change.
    pub updated_at: DateTime<Utc>,
}

impl Wallet {
    /// Creates an empty wallet for `account_id`.
    #[must_use]
    pub fn open(account_id: AccountId) -> Self {
        let now = Utc::now();
        Self {
            id: WalletId::new(),
            account_id,
            balance: Amount::ZERO.value(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// An immutable ledger row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletTransaction {
    /// Transaction ID.
    pub id: TransactionId,
    /// The wallet this row is recorded against.
    pub wallet_id: WalletId,
    /// The other side of a transfer, if any.
    pub counterparty_wallet_id: Option<WalletId>,
    /// Free-text description.
    pub description: Option<String>,
    /// Signed amount, relative to `wallet_id`.
    pub amount: Amount,
    /// False when the mutation was rejected.
    pub done: bool,
    /// Derived from the sign of `amount`.
    pub kind: Kind,
    /// Why the mutation was rejected.
    pub error_msg: Option<String>,
    /// Operator notes, only shown to privileged principals.
    pub extra_info: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl WalletTransaction {
    /// Builds a completed row against `wallet_id`, classifying the amount.
    #[must_use]
    pub fn record(wallet_id: WalletId, amount: Amount, memo: Memo) -> Self {
        Self {
            id: TransactionId::new(),
            wallet_id,
            counterparty_wallet_id: None,
            description: memo.description,
            amount,
            done: true,
            kind: Kind::classify(amount),
            error_msg: None,
            extra_info: memo.extra_info,
            created_at: Utc::now(),
        }
    }

    /// Marks the row as rejected.
    #[must_use]
    pub fn rejected(mut self, reason: impl Into<String>) -> Self {
        self.done = false;
        self.error_msg = Some(reason.into());
        self
    }

    /// Returns true if this row contributes to a balance.
    #[must_use]
    pub const fn is_effective(&self) -> bool {
        self.done && self.kind.affects_balance()
    }

    /// Returns true if this row touches `wallet_id` on either side.
    #[must_use]
    pub fn touches(&self, wallet_id: WalletId) -> bool {
        self.wallet_id == wallet_id || self.counterparty_wallet_id == Some(wallet_id)
    }
}

/// Optional free text attached to a new transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Memo {
    /// Client-visible description.
    pub description: Option<String>,
    /// Operator notes.
    pub extra_info: Option<String>,
}

impl Memo {
    /// Memo with only a description.
    #[must_use]
    pub fn described(description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            extra_info: None,
        }
    }
}

/// Result of recomputing a wallet balance from its ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reconciliation {
    /// The wallet checked.
    pub wallet_id: WalletId,
    /// Balance stored on the wallet row.
    pub recorded_balance: Decimal,
    /// Balance recomputed from transaction rows.
    pub ledger_balance: Decimal,
    /// Number of rows that touch the wallet.
    pub transaction_count: u64,
    /// True when both balances agree.
    pub consistent: bool,
}

/// Input for recording an amount against one wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTransaction {
    /// Target wallet.
    pub wallet_id: WalletId,
    /// Signed amount.
    pub amount: Amount,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
    /// Optional operator notes.
    #[serde(default)]
    pub extra_info: Option<String>,
}

/// Input for moving funds between two wallets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTransfer {
    /// Wallet debited. Must be in the caller's scope.
    pub source_wallet_id: WalletId,
    /// Wallet credited. Only needs to exist.
    pub destination_wallet_id: WalletId,
    /// Positive amount to move.
    pub amount: Amount,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
}
