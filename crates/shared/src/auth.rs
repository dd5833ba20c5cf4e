//! Authentication types for JWT access tokens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT claims for access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID).
    pub sub: Uuid,
    /// The account profile owned by the user, if one has been registered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acct: Option<Uuid>,
    /// Whether the user is staff and may act on every account.
    #[serde(default)]
    pub staff: bool,
    /// Issued at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
}

impl Claims {
    /// Creates new claims for a user.
    #[must_use]
    pub fn new(
        user_id: Uuid,
        account_id: Option<Uuid>,
        is_staff: bool,
        expires_at: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id,
            acct: account_id,
            staff: is_staff,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    /// Returns the user ID from claims.
    #[must_use]
    pub const fn user_id(&self) -> Uuid {
        self.sub
    }

    /// Returns the account ID from claims.
    #[must_use]
    pub const fn account_id(&self) -> Option<Uuid> {
        self.acct
    }

    /// Returns true if the token belongs to a staff user.
    #[must_use]
    pub const fn is_staff(&self) -> bool {
        self.staff
    }
}
