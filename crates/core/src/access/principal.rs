//! The authenticated caller.

use walletd_shared::Claims;
use walletd_shared::types::{AccountId, UserId};

use super::scope::AccessScope;
use super::view::ViewPolicy;

/// An authenticated caller as seen by the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    /// The external user.
    pub user_id: UserId,
    /// The account owned by the user, if one exists.
    pub account_id: Option<AccountId>,
    /// Staff users see and act on every account.
    pub is_privileged: bool,
}

impl Principal {
    /// A regular user that owns `account_id`.
    #[must_use]
    pub const fn owner(user_id: UserId, account_id: AccountId) -> Self {
        Self {
            user_id,
            account_id: Some(account_id),
            is_privileged: false,
        }
    }

    /// A staff user.
    #[must_use]
    pub const fn staff(user_id: UserId, account_id: Option<AccountId>) -> Self {
        Self {
            user_id,
            account_id,
            is_privileged: true,
        }
    }

    /// Returns what this principal may touch.
    #[must_use]
    pub const fn scope(&self) -> AccessScope {
        AccessScope::for_principal(self)
    }

    /// Returns which fields this principal may see.
    #[must_use]
    pub const fn view_policy(&self) -> ViewPolicy {
        ViewPolicy::for_principal(self)
    }
}

impl From<&Claims> for Principal {
    fn from(claims: &Claims) -> Self {
        Self {
            user_id: UserId::from_uuid(claims.user_id()),
            account_id: claims.account_id().map(AccountId::from_uuid),
            is_privileged: claims.is_staff(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn test_from_claims() {
        let user = Uuid::new_v4();
        let account = Uuid::new_v4();
        let claims = Claims::new(user, Some(account), false, Utc::now());

        let principal = Principal::from(&claims);
        assert_eq!(principal.user_id.into_inner(), user);
        assert_eq!(principal.account_id.map(AccountId::into_inner), Some(account));
        assert!(!principal.is_privileged);
    }

    #[test]
    fn test_staff_claims_are_privileged() {
        let claims = Claims::new(Uuid::new_v4(), None, true, Utc::now());
        let principal = Principal::from(&claims);
        assert!(principal.is_privileged);
        assert_eq!(principal.scope(), AccessScope::All);
    }
}
