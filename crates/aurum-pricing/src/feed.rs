//! Oracle feed adapter.
//!
//! External feeds answer in their own fixed-point scale (8 fractional
//! digits is common). [`normalize_quote`] lifts an answer onto the
//! canonical 18-digit scale:
//!
//! ```text
//! canonical = raw_price * 10^(18 - decimals)
//! ```
//!
//! An unreachable feed or a non-positive answer is `FeedUnavailable`.
//! Nothing is retried here; retry policy belongs to the feed itself.

use std::collections::HashMap;

use alloy_primitives::U256;
use aurum_types::{AurumError, FeedId, Fixed18, OracleQuote, Result, constants, fixed::pow10};

/// A read-only external price source.
pub trait OracleFeed: Send + Sync {
    /// The feed's latest answer in its native scale.
    ///
    /// # Errors
    /// Implementations return `FeedUnavailable` when no answer can be read.
    fn latest_quote(&self) -> Result<OracleQuote>;
}

/// Lift a feed answer onto the canonical scale.
///
/// # Errors
/// `FeedUnavailable` if the answer is not positive (or truncates to zero).
pub fn normalize_quote(feed: FeedId, quote: OracleQuote) -> Result<Fixed18> {
    if !quote.is_positive() {
        return Err(AurumError::FeedUnavailable {
            feed,
            reason: format!("non-positive answer {}", quote.raw_price),
        });
    }
    let raw = U256::from(quote.raw_price.unsigned_abs());

    let canonical = if quote.decimals <= constants::CANONICAL_DECIMALS {
        raw.checked_mul(pow10(constants::CANONICAL_DECIMALS - quote.decimals)?)
            .ok_or(AurumError::ArithmeticOverflow {
                context: "feed normalization",
            })?
    } else {
        raw / pow10(quote.decimals - constants::CANONICAL_DECIMALS)?
    };

    if canonical.is_zero() {
        return Err(AurumError::FeedUnavailable {
            feed,
            reason: format!(
                "answer {} with {} decimals is below canonical precision",
                quote.raw_price, quote.decimals
            ),
        });
    }
    Ok(Fixed18::from_raw(canonical))
}

/// The set of feeds a pool can read, keyed by feed address.
pub struct FeedRegistry {
    feeds: HashMap<FeedId, Box<dyn OracleFeed>>,
}

impl FeedRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            feeds: HashMap::new(),
        }
    }

    /// Register (or replace) the source for `feed_id`.
    pub fn register(&mut self, feed_id: FeedId, feed: Box<dyn OracleFeed>) {
        self.feeds.insert(feed_id, feed);
    }

    /// Whether a source is registered for `feed_id`.
    #[must_use]
    pub fn contains(&self, feed_id: &FeedId) -> bool {
        self.feeds.contains_key(feed_id)
    }

    /// Read the raw answer of a feed.
    pub fn read(&self, feed_id: FeedId) -> Result<OracleQuote> {
        let feed = self
            .feeds
            .get(&feed_id)
            .ok_or_else(|| AurumError::FeedUnavailable {
                feed: feed_id,
                reason: "no source registered".to_string(),
            })?;
        feed.latest_quote()
    }

    /// Read a feed and normalize it to the canonical scale.
    pub fn read_canonical(&self, feed_id: FeedId) -> Result<Fixed18> {
        let quote = self.read(feed_id)?;
        let price = normalize_quote(feed_id, quote)?;
        tracing::debug!(
            feed = %feed_id,
            raw = quote.raw_price,
            decimals = quote.decimals,
            price = %price,
            "Oracle read"
        );
        Ok(price)
    }
}

impl Default for FeedRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixed-answer feed for tests. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
#[derive(Debug, Clone)]
pub struct StaticFeed {
    quote: Option<OracleQuote>,
    feed_id: FeedId,
}

#[cfg(any(test, feature = "test-helpers"))]
impl StaticFeed {
    /// A feed that always answers `raw_price` with `decimals`.
    #[must_use]
    pub fn new(feed_id: FeedId, raw_price: i128, decimals: u8) -> Self {
        Self {
            quote: Some(OracleQuote::new(raw_price, decimals)),
            feed_id,
        }
    }

    /// A feed that always fails to answer.
    #[must_use]
    pub fn unavailable(feed_id: FeedId) -> Self {
        Self {
            quote: None,
            feed_id,
        }
    }
}

#[cfg(any(test, feature = "test-helpers"))]
impl OracleFeed for StaticFeed {
    fn latest_quote(&self) -> Result<OracleQuote> {
        self.quote.ok_or_else(|| AurumError::FeedUnavailable {
            feed: self.feed_id,
            reason: "feed offline".to_string(),
        })
    }
}
