//! Access scope resolution.

use walletd_shared::types::AccountId;

use super::principal::Principal;
use crate::ledger::store::{TransactionFilter, WalletFilter};
use crate::ledger::types::Wallet;

/// The set of entities a principal may read or mutate.
///
/// Anything outside the scope is reported as not found, never as forbidden.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessScope {
    /// Every entity.
    All,
    /// Entities owned by one account.
    Owner(AccountId),
    /// Nothing. A regular user that has not registered an account.
    Empty,
}

impl AccessScope {
    /// Resolves the scope of `principal`.
    #[must_use]
    pub const fn for_principal(principal: &Principal) -> Self {
        if principal.is_privileged {
            return Self::All;
        }
        match principal.account_id {
            Some(account_id) => Self::Owner(account_id),
            None => Self::Empty,
        }
    }

    /// Returns true if entities of `account_id` are in scope.
    #[must_use]
    pub fn permits_account(&self, account_id: AccountId) -> bool {
        match self {
            Self::All => true,
            Self::Owner(owner) => *owner == account_id,
            Self::Empty => false,
        }
    }

    /// Returns true if `wallet` is in scope.
    #[must_use]
    pub fn permits_wallet(&self, wallet: &Wallet) -> bool {
        self.permits_account(wallet.account_id)
    }

    /// Wallet listing filter, or `None` when nothing is visible.
    #[must_use]
    pub const fn wallet_filter(&self) -> Option<WalletFilter> {
        match self {
            Self::All => Some(WalletFilter { account_id: None }),
            Self::Owner(account_id) => Some(WalletFilter {
                account_id: Some(*account_id),
            }),
            Self::Empty => None,
        }
    }

    /// Transaction listing filter, or `None` when nothing is visible.
    #[must_use]
    pub const fn transaction_filter(&self) -> Option<TransactionFilter> {
        match self {
            Self::All => Some(TransactionFilter {
                account_id: None,
                wallet_id: None,
            }),
            Self::Owner(account_id) => Some(TransactionFilter {
                account_id: Some(*account_id),
                wallet_id: None,
            }),
            Self::Empty => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use walletd_shared::types::UserId;

    #[test]
    fn test_staff_sees_everything() {
        let scope = Principal::staff(UserId::new(), None).scope();
        let wallet = Wallet::open(AccountId::new());
        assert!(scope.permits_wallet(&wallet));
        assert_eq!(scope.wallet_filter(), Some(WalletFilter::default()));
    }

    #[test]
    fn test_owner_sees_only_own_account() {
        let mine = AccountId::new();
        let scope = Principal::owner(UserId::new(), mine).scope();

        assert!(scope.permits_wallet(&Wallet::open(mine)));
        assert!(!scope.permits_wallet(&Wallet::open(AccountId::new())));
        assert_eq!(
            scope.transaction_filter().and_then(|f| f.account_id),
            Some(mine)
        );
    }

    #[test]
    fn test_user_without_account_sees_nothing() {
        let principal = Principal {
            user_id: UserId::new(),
            account_id: None,
            is_privileged: false,
        };
        let scope = principal.scope();

        assert_eq!(scope, AccessScope::Empty);
        assert!(!scope.permits_account(AccountId::new()));
        assert!(scope.wallet_filter().is_none());
        assert!(scope.transaction_filter().is_none());
    }
}
