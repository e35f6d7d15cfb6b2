//! Gram price derivation and cross-asset amount conversion.
//!
//! The settlement token is pegged to one gram of gold, so every quote
//! starts from the per-gram price:
//!
//! ```text
//! gram_price = ounce_price * 10^18 / grams_per_troy_ounce
//! ```
//!
//! Amounts move between a token's native decimals and USD on the canonical
//! scale. Each conversion is a single multiply-then-divide, and anything
//! converted back into native units is floored.

use alloy_primitives::U256;
use aurum_types::{
    AurumError, Fixed18, PoolConfig, Result, constants,
    fixed::{mul_div, pow10},
};

/// Derives per-gram prices from XAU/oz spot prices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceNormalizer {
    grams_per_troy_ounce: Fixed18,
}

impl PriceNormalizer {
    /// # Errors
    /// `Configuration` if the conversion constant is zero.
    pub fn new(grams_per_troy_ounce: Fixed18) -> Result<Self> {
        if grams_per_troy_ounce.is_zero() {
            return Err(AurumError::Configuration(
                "grams per troy ounce must be positive".into(),
            ));
        }
        Ok(Self {
            grams_per_troy_ounce,
        })
    }

    pub fn from_config(config: &PoolConfig) -> Result<Self> {
        Self::new(config.grams_per_troy_ounce)
    }

    #[must_use]
    pub fn grams_per_troy_ounce(&self) -> Fixed18 {
        self.grams_per_troy_ounce
    }

    /// USD per gram for a USD-per-troy-ounce price.
    pub fn gram_price(&self, ounce_price: Fixed18) -> Result<Fixed18> {
        ounce_price.checked_div(self.grams_per_troy_ounce)
    }
}

/// Native token units → canonical value (exact for `decimals <= 18`).
pub fn to_canonical(amount: U256, decimals: u8) -> Result<Fixed18> {
    if decimals <= constants::CANONICAL_DECIMALS {
        amount
            .checked_mul(pow10(constants::CANONICAL_DECIMALS - decimals)?)
            .map(Fixed18::from_raw)
            .ok_or(AurumError::ArithmeticOverflow {
                context: "to canonical",
            })
    } else {
        Ok(Fixed18::from_raw(
            amount / pow10(decimals - constants::CANONICAL_DECIMALS)?,
        ))
    }
}

/// Canonical value → native token units, floored.
pub fn from_canonical(value: Fixed18, decimals: u8) -> Result<U256> {
    if decimals <= constants::CANONICAL_DECIMALS {
        Ok(value.raw() / pow10(constants::CANONICAL_DECIMALS - decimals)?)
    } else {
        value
            .raw()
            .checked_mul(pow10(decimals - constants::CANONICAL_DECIMALS)?)
            .ok_or(AurumError::ArithmeticOverflow {
                context: "from canonical",
            })
    }
}

/// USD value of `amount` native units priced at `unit_price` per whole token.
///
/// `amount * unit_price / 10^decimals`
pub fn usd_value(amount: U256, decimals: u8, unit_price: Fixed18) -> Result<Fixed18> {
    mul_div(amount, unit_price.raw(), pow10(decimals)?, "usd value").map(Fixed18::from_raw)
}

/// Native units of a token priced at `unit_price` that `usd` buys, floored.
///
/// `usd * 10^decimals / unit_price`
pub fn units_for_usd(usd: Fixed18, unit_price: Fixed18, decimals: u8) -> Result<U256> {
    mul_div(usd.raw(), pow10(decimals)?, unit_price.raw(), "units for usd")
}
