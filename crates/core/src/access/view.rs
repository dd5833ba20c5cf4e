//! Per-principal projections of ledger entities.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use walletd_shared::types::{AccountId, Amount, TransactionId, WalletId};

use super::principal::Principal;
use crate::ledger::kind::Kind;
use crate::ledger::types::{Wallet, WalletTransaction};

/// Which fields a principal may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewPolicy {
    /// Show the owning account of a wallet.
    pub show_owner: bool,
    /// Show operator notes on transactions.
    pub show_extra_info: bool,
}

impl ViewPolicy {
    /// Resolves the policy of `principal`.
    #[must_use]
    pub const fn for_principal(principal: &Principal) -> Self {
        Self {
            show_owner: principal.is_privileged,
            show_extra_info: principal.is_privileged,
        }
    }

    /// Projects a wallet.
    #[must_use]
    pub fn wallet(&self, wallet: &Wallet) -> WalletView {
        let mut balance = wallet.balance;
        balance.rescale(2);
        WalletView {
            id: wallet.id,
            account_id: self.show_owner.then_some(wallet.account_id),
            balance,
            created_at: wallet.created_at,
            updated_at: wallet.updated_at,
        }
    }

    /// Projects a transaction row.
    #[must_use]
    pub fn transaction(&self, row: &WalletTransaction) -> TransactionView {
        TransactionView {
            id: row.id,
            wallet_id: row.wallet_id,
            counterparty_wallet_id: row.counterparty_wallet_id,
            description: row.description.clone(),
            amount: row.amount,
            done: row.done,
            kind: row.kind,
            error_msg: row.error_msg.clone(),
            extra_info: if self.show_extra_info {
                row.extra_info.clone()
            } else {
                None
            },
            created_at: row.created_at,
        }
    }
}

/// Wallet as returned to a caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletView {
    /// Wallet ID.
    pub id: WalletId,
    /// Owning account, privileged callers only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<AccountId>,
    /// Balance with two fractional digits.
    pub balance: Decimal,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Time of the last balance change.
    pub updated_at: DateTime<Utc>,
}

/// Transaction row as returned to a caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionView {
    /// Transaction ID.
    pub id: TransactionId,
    /// Wallet the row is recorded against.
    pub wallet_id: WalletId,
    /// Other side of a transfer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counterparty_wallet_id: Option<WalletId>,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Signed amount.
    pub amount: Amount,
    /// False when the mutation was rejected.
    pub done: bool,
    /// Derived kind.
    pub kind: Kind,
    /// Rejection reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_msg: Option<String>,
    /// Operator notes, privileged callers only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_info: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::types::Memo;
    use rust_decimal_macros::dec;
    use walletd_shared::types::UserId;

    fn row_with_notes() -> WalletTransaction {
        WalletTransaction::record(
            WalletId::new(),
            "12.5".parse().unwrap(),
            Memo {
                description: Some("salary".into()),
                extra_info: Some("batch 42".into()),
            },
        )
    }

    #[test]
    fn test_regular_view_hides_owner_and_notes() {
        let account = AccountId::new();
        let policy = Principal::owner(UserId::new(), account).view_policy();

        let wallet = policy.wallet(&Wallet::open(account));
        assert_eq!(wallet.account_id, None);

        let json = serde_json::to_value(policy.transaction(&row_with_notes())).unwrap();
        assert!(json.get("extra_info").is_none());
        assert_eq!(json["description"], "salary");
        assert_eq!(json["amount"], "12.50");
        assert_eq!(json["kind"], "deposit");
    }

    #[test]
    fn test_privileged_view_shows_owner_and_notes() {
        let account = AccountId::new();
        let policy = Principal::staff(UserId::new(), None).view_policy();

        assert_eq!(policy.wallet(&Wallet::open(account)).account_id, Some(account));
        assert_eq!(
            policy.transaction(&row_with_notes()).extra_info.as_deref(),
            Some("batch 42")
        );
    }

    #[test]
    fn test_balance_rendered_with_two_decimals() {
        let mut wallet = Wallet::open(AccountId::new());
        wallet.balance = dec!(7);

        let view = ViewPolicy::for_principal(&Principal::staff(UserId::new(), None)).wallet(&wallet);
        let json = serde_json::to_value(view).unwrap();
        assert_eq!(json["balance"], "7.00");
    }
}
