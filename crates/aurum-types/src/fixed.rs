//! Canonical 18-digit fixed-point arithmetic.
//!
//! Every price and USD value inside Aurum is a [`Fixed18`]: an unsigned
//! 256-bit integer holding the value scaled by `10^18`. Products of two
//! 18-digit quantities fit comfortably in 256 bits, so every helper
//! multiplies first and divides last, with checked arithmetic throughout.
//!
//! Config files and logs use the human form (`"4202.24275955921453056"`),
//! parsed through `rust_decimal`.

use std::{fmt, str::FromStr};

use alloy_primitives::U256;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{AurumError, Result, constants};

/// A non-negative value on the canonical 18-fractional-digit scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Fixed18(U256);

impl Fixed18 {
    /// `0.0`
    pub const ZERO: Self = Self(U256::ZERO);

    /// `1.0` (raw `10^18`).
    pub const ONE: Self = Self(U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]));

    /// Wrap a raw, already-scaled value.
    #[must_use]
    pub const fn from_raw(raw: U256) -> Self {
        Self(raw)
    }

    /// The raw scaled value.
    #[must_use]
    pub const fn raw(self) -> U256 {
        self.0
    }

    /// A whole number, e.g. `from_integer(3)` is `3.0`.
    #[must_use]
    pub fn from_integer(value: u64) -> Self {
        // u64 * 10^18 < 2^124, cannot overflow 256 bits.
        Self(U256::from(value) * Self::ONE.0)
    }

    #[must_use]
    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    /// `|self - other|` on the raw scale.
    #[must_use]
    pub fn abs_diff(self, other: Self) -> U256 {
        if self.0 >= other.0 {
            self.0 - other.0
        } else {
            other.0 - self.0
        }
    }

    /// `self * other`, keeping 18 fractional digits (truncated).
    pub fn checked_mul(self, other: Self) -> Result<Self> {
        mul_div(self.0, other.0, Self::ONE.0, "fixed mul").map(Self)
    }

    /// `self / other`, keeping 18 fractional digits (truncated).
    pub fn checked_div(self, other: Self) -> Result<Self> {
        mul_div(self.0, Self::ONE.0, other.0, "fixed div").map(Self)
    }

    /// Convert from a `rust_decimal` value. Digits past the 18th fractional
    /// digit are truncated.
    pub fn from_decimal(value: Decimal) -> Result<Self> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(AurumError::Configuration(format!(
                "fixed-point value must be non-negative, got {value}"
            )));
        }
        let truncated = value.round_dp_with_strategy(
            u32::from(constants::CANONICAL_DECIMALS),
            RoundingStrategy::ToZero,
        );
        let scale = u8::try_from(truncated.scale())
            .map_err(|_| AurumError::Configuration(format!("scale out of range: {value}")))?;
        let mantissa = U256::from(truncated.mantissa().unsigned_abs());
        let factor = pow10(constants::CANONICAL_DECIMALS - scale)?;
        mantissa
            .checked_mul(factor)
            .map(Self)
            .ok_or(AurumError::ArithmeticOverflow {
                context: "decimal to fixed",
            })
    }

    /// Convert to `rust_decimal`, if the value fits its 96-bit mantissa.
    #[must_use]
    pub fn to_decimal(self) -> Option<Decimal> {
        let raw: u128 = self.0.try_into().ok()?;
        let raw = i128::try_from(raw).ok()?;
        Decimal::try_from_i128_with_scale(raw, u32::from(constants::CANONICAL_DECIMALS)).ok()
    }
}

/// `10^exp` as a `U256`.
pub fn pow10(exp: u8) -> Result<U256> {
    U256::from(10u8)
        .checked_pow(U256::from(exp))
        .ok_or(AurumError::ArithmeticOverflow { context: "pow10" })
}

/// `a * b / denominator` with a 256-bit intermediate product, truncating.
///
/// # Errors
/// `ArithmeticOverflow` if the product overflows or `denominator` is zero.
pub fn mul_div(a: U256, b: U256, denominator: U256, context: &'static str) -> Result<U256> {
    a.checked_mul(b)
        .and_then(|product| product.checked_div(denominator))
        .ok_or(AurumError::ArithmeticOverflow { context })
}

impl fmt::Display for Fixed18 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let integer = self.0 / Self::ONE.0;
        // The remainder is below 10^18 < 2^64, so it lives in the lowest limb.
        let fraction = (self.0 % Self::ONE.0).as_limbs()[0];
        if fraction == 0 {
            return write!(f, "{integer}");
        }
        let digits = format!("{fraction:018}");
        write!(f, "{integer}.{}", digits.trim_end_matches('0'))
    }
}

impl FromStr for Fixed18 {
    type Err = AurumError;

    fn from_str(s: &str) -> Result<Self> {
        let value = Decimal::from_str_exact(s.trim())
            .map_err(|e| AurumError::Configuration(format!("invalid fixed-point value {s:?}: {e}")))?;
        Self::from_decimal(value)
    }
}

impl Serialize for Fixed18 {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Fixed18 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
