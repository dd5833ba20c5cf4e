//! Fixed-point amount type for ledger entries.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! This type wraps `rust_decimal::Decimal` and is only constructed through
//! validation, so every `Amount` in the system fits the ledger column.
//!
//! JSON numbers are read from their literal text (serde_json
//! `arbitrary_precision`), so `10.50` and `"10.50"` decode to the same value.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::de::value::MapAccessDeserializer;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Maximum number of fractional digits an amount may carry.
pub const AMOUNT_SCALE: u32 = 2;

/// Errors produced while validating an amount.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    /// The input is not a decimal number.
    #[error("'{0}' is not a valid decimal amount")]
    Malformed(String),

    /// The input has more fractional digits than allowed.
    #[error("amount {0} has more than {scale} decimal places", scale = AMOUNT_SCALE)]
    TooManyDecimals(Decimal),

    /// The input exceeds the maximum magnitude.
    #[error("amount {0} exceeds the maximum of {max}", max = Amount::MAX)]
    OutOfRange(Decimal),
}

/// A signed monetary amount with exactly two fractional digits.
///
/// |amount| is bounded by 99 999.99.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(Decimal);

impl Amount {
    /// Largest representable amount.
    pub const MAX: Decimal = Decimal::from_parts(9_999_999, 0, 0, false, AMOUNT_SCALE);

    /// Zero with two fractional digits.
    pub const ZERO: Self = Self(Decimal::from_parts(0, 0, 0, false, AMOUNT_SCALE));

    /// Validates a decimal and wraps it.
    ///
    /// Trailing zeros are ignored when counting fractional digits, so `10.500`
    /// is accepted as `10.50`.
    pub fn new(value: Decimal) -> Result<Self, AmountError> {
        let normalized = value.normalize();
        if normalized.scale() > AMOUNT_SCALE {
            return Err(AmountError::TooManyDecimals(value));
        }
        if normalized.abs() > Self::MAX {
            return Err(AmountError::OutOfRange(value));
        }

        let mut fixed = if normalized.is_zero() {
            Decimal::ZERO
        } else {
            normalized
        };
        fixed.rescale(AMOUNT_SCALE);
        Ok(Self(fixed))
    }

    /// Returns the underlying decimal.
    #[must_use]
    pub const fn value(self) -> Decimal {
        self.0
    }

    /// Returns true if the amount is zero.
    #[must_use]
    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the amount is strictly greater than zero.
    #[must_use]
    pub fn is_positive(self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Returns true if the amount is strictly less than zero.
    #[must_use]
    pub fn is_negative(self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Returns the amount with its sign flipped. Always in range.
    #[must_use]
    pub fn negate(self) -> Self {
        if self.is_zero() { self } else { Self(-self.0) }
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = AmountError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let value = Decimal::from_str_exact(trimmed)
            .map_err(|_| AmountError::Malformed(trimmed.to_string()))?;
        Self::new(value)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

struct AmountVisitor;

impl<'de> Visitor<'de> for AmountVisitor {
    type Value = Amount;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a decimal amount such as 10.50 or \"10.50\"")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Amount, E> {
        v.parse().map_err(E::custom)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Amount, E> {
        Amount::new(Decimal::from(v)).map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Amount, E> {
        Amount::new(Decimal::from(v)).map_err(E::custom)
    }

    // Exact JSON number token.
    fn visit_map<A: de::MapAccess<'de>>(self, map: A) -> Result<Amount, A::Error> {
        let value =
            rust_decimal::serde::arbitrary_precision::deserialize(MapAccessDeserializer::new(map))?;
        Amount::new(value).map_err(<A::Error as de::Error>::custom)
    }

    fn visit_f64<E: de::Error>(self, _v: f64) -> Result<Amount, E> {
        Err(E::custom(
            "binary floating-point amounts are not accepted, send a decimal literal",
        ))
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(AmountVisitor)
    }
}
