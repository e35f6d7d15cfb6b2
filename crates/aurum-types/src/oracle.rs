//! Oracle feed reading types.

use serde::{Deserialize, Serialize};

/// One answer from an external price feed, in the feed's native scale.
///
/// Re-read on every settlement; never cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleQuote {
    /// The answer as reported (feeds report a signed integer).
    pub raw_price: i128,
    /// Fractional digits of `raw_price` (commonly 8).
    pub decimals: u8,
}

impl OracleQuote {
    #[must_use]
    pub fn new(raw_price: i128, decimals: u8) -> Self {
        Self {
            raw_price,
            decimals,
        }
    }

    /// Feeds that answer zero or negative have no usable price.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.raw_price > 0
    }
}
