//! Transaction kind classification.

use serde::{Deserialize, Serialize};
use walletd_shared::types::Amount;

/// Classification of a wallet transaction.
///
/// The kind is never supplied by a client; it is always derived from the
/// signed amount with [`Kind::classify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(i16)]
pub enum Kind {
    /// The transaction could not be classified.
    Error = 0,
    /// Zero-amount marker. Recorded, never moves a balance.
    Testing = 1,
    /// Positive amount.
    Deposit = 2,
    /// Negative amount.
    Withdraw = 3,
}

impl Kind {
    /// Derives the kind from the sign of `amount`.
    #[must_use]
    pub fn classify(amount: Amount) -> Self {
        if amount.is_positive() {
            Self::Deposit
        } else if amount.is_negative() {
            Self::Withdraw
        } else {
            Self::Testing
        }
    }

    /// Returns true if rows of this kind move a wallet balance.
    #[must_use]
    pub const fn affects_balance(self) -> bool {
        matches!(self, Self::Deposit | Self::Withdraw)
    }

    /// Stable storage code.
    #[must_use]
    pub const fn code(self) -> i16 {
        self as i16
    }

    /// Decodes a storage code.
    #[must_use]
    pub const fn from_code(code: i16) -> Option<Self> {
        match code {
            0 => Some(Self::Error),
            1 => Some(Self::Testing),
            2 => Some(Self::Deposit),
            3 => Some(Self::Withdraw),
            _ => None,
        }
    }

    /// Returns the wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Testing => "testing",
            Self::Deposit => "deposit",
            Self::Withdraw => "withdraw",
        }
    }
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn amount(s: &str) -> Amount {
        s.parse().unwrap()
    }

    #[rstest]
    #[case("10.00", Kind::Deposit)]
    #[case("0.01", Kind::Deposit)]
    #[case("-5.50", Kind::Withdraw)]
    #[case("-0.01", Kind::Withdraw)]
    #[case("0", Kind::Testing)]
    #[case("0.00", Kind::Testing)]
    fn test_classify(#[case] input: &str, #[case] expected: Kind) {
        assert_eq!(Kind::classify(amount(input)), expected);
    }

    #[test]
    fn test_only_deposit_and_withdraw_affect_balance() {
        assert!(Kind::Deposit.affects_balance());
        assert!(Kind::Withdraw.affects_balance());
        assert!(!Kind::Testing.affects_balance());
        assert!(!Kind::Error.affects_balance());
    }

    #[test]
    fn test_code_roundtrip_is_stable() {
        for kind in [Kind::Error, Kind::Testing, Kind::Deposit, Kind::Withdraw] {
            assert_eq!(Kind::from_code(kind.code()), Some(kind));
        }
        assert_eq!(Kind::Deposit.code(), 2);
        assert_eq!(Kind::from_code(7), None);
    }

    #[test]
    fn test_wire_name() {
        assert_eq!(
            serde_json::to_string(&Kind::Withdraw).unwrap(),
            "\"withdraw\""
        );
        assert_eq!(Kind::Testing.to_string(), "testing");
    }
}
