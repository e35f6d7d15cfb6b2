//! Deviation bounds on an attested price.
//!
//! ```text
//! deviation_bp = |price - reference| * 10_000 / reference
//! ```
//!
//! A price fails a bound only when `deviation_bp` is strictly greater than
//! the configured maximum. The oracle bound is checked before the
//! last-accepted-price bound.

use alloy_primitives::U256;
use aurum_pricing::FeedRegistry;
use aurum_types::{
    AurumError, FeedId, Fixed18, PoolConfig, PoolState, Result, constants, fixed::mul_div,
};

/// Two independent basis-point bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviationGuard {
    max_oracle_deviation_bp: u16,
    max_last_price_deviation_bp: u16,
}

impl DeviationGuard {
    #[must_use]
    pub fn new(max_oracle_deviation_bp: u16, max_last_price_deviation_bp: u16) -> Self {
        Self {
            max_oracle_deviation_bp,
            max_last_price_deviation_bp,
        }
    }

    #[must_use]
    pub fn from_config(config: &PoolConfig) -> Self {
        Self::new(
            config.max_oracle_deviation_bp,
            config.max_last_price_deviation_bp,
        )
    }

    #[must_use]
    pub fn max_oracle_deviation_bp(&self) -> u16 {
        self.max_oracle_deviation_bp
    }

    #[must_use]
    pub fn max_last_price_deviation_bp(&self) -> u16 {
        self.max_last_price_deviation_bp
    }

    /// Relative distance of `price` from `reference`, in basis points (floored).
    ///
    /// # Errors
    /// `Internal` if `reference` is zero.
    pub fn deviation_bp(price: Fixed18, reference: Fixed18) -> Result<U256> {
        if reference.is_zero() {
            return Err(AurumError::Internal(
                "deviation reference price is zero".into(),
            ));
        }
        mul_div(
            price.abs_diff(reference),
            U256::from(constants::BPS_DENOMINATOR),
            reference.raw(),
            "deviation bp",
        )
    }

    /// Bound the attested price against an oracle reading.
    pub fn check_oracle(&self, attested: Fixed18, oracle_price: Fixed18) -> Result<()> {
        let deviation_bp = Self::deviation_bp(attested, oracle_price)?;
        if deviation_bp > U256::from(self.max_oracle_deviation_bp) {
            return Err(AurumError::OracleDeviationExceeded {
                deviation_bp,
                max_bp: self.max_oracle_deviation_bp,
            });
        }
        Ok(())
    }

    /// Bound the attested price against the last accepted price.
    pub fn check_last_price(&self, attested: Fixed18, last_accepted: Fixed18) -> Result<()> {
        let deviation_bp = Self::deviation_bp(attested, last_accepted)?;
        if deviation_bp > U256::from(self.max_last_price_deviation_bp) {
            return Err(AurumError::LastPriceDeviationExceeded {
                deviation_bp,
                max_bp: self.max_last_price_deviation_bp,
            });
        }
        Ok(())
    }

    /// Full check: read `feed_id`, then both bounds, oracle first.
    ///
    /// # Errors
    /// `FeedUnavailable` from the feed, or the first bound that fails.
    pub fn check(
        &self,
        attested: Fixed18,
        feeds: &FeedRegistry,
        feed_id: FeedId,
        state: &PoolState,
    ) -> Result<()> {
        let oracle_price = feeds.read_canonical(feed_id)?;
        self.check_oracle(attested, oracle_price)?;
        self.check_last_price(attested, state.last_accepted_price())?;
        tracing::debug!(
            attested = %attested,
            oracle = %oracle_price,
            last = %state.last_accepted_price(),
            "Deviation bounds passed"
        );
        Ok(())
    }
}
