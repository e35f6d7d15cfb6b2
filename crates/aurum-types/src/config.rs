//! Configuration types for Aurum pools.
//!
//! A [`PoolConfig`] is fixed at initialization and only replaced through
//! privileged administrative operations. Settlement reads it and never
//! writes it.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use crate::{AssetId, AurumError, FeedId, Fixed18, Result, constants};

/// A token the pool holds or pays out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenConfig {
    /// Token contract address.
    pub asset: AssetId,
    /// Ticker, for logs (e.g., "GHK").
    pub symbol: String,
    /// Native decimals of the token.
    pub decimals: u8,
}

/// A stablecoin accepted as payment, with its own USD feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteAssetConfig {
    /// Token contract address.
    pub asset: AssetId,
    /// Ticker, for logs (e.g., "USDT").
    pub symbol: String,
    /// Native decimals of the token.
    pub decimals: u8,
    /// The QUOTE/USD feed.
    pub feed: FeedId,
}

/// Incentives paid out of the pool's utility-token reserve on every buy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardPolicy {
    /// Utility tokens rewarded per whole settlement token bought.
    pub utility_per_token: Fixed18,
    /// Whether an inviter named on a buy is credited.
    pub inviter_enabled: bool,
    /// Inviter share of the buyer's utility reward, in basis points.
    pub inviter_bp: u16,
}

impl Default for RewardPolicy {
    fn default() -> Self {
        Self {
            utility_per_token: Fixed18::ZERO,
            inviter_enabled: false,
            inviter_bp: 0,
        }
    }
}

/// Routing for utility → settlement swaps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapConfig {
    /// Account of the sibling pool whose settlement-token reserve backs swaps.
    pub sibling_pool: Address,
    /// USD value of one whole utility token.
    pub utility_price: Fixed18,
    /// Quote asset routed from this pool to the sibling pool per swap.
    pub routing_quote_asset: AssetId,
    /// Swaps are rejected while set.
    pub stopped: bool,
}

impl Default for SwapConfig {
    fn default() -> Self {
        Self {
            sibling_pool: Address::ZERO,
            utility_price: Fixed18::ZERO,
            routing_quote_asset: AssetId(Address::ZERO),
            stopped: true,
        }
    }
}

/// Everything a pool needs to price and settle requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// The pool's own ledger account (holds reserves).
    pub pool_account: Address,
    /// The only address whose attestations are accepted.
    pub signer: Address,
    /// XAU/USD feed.
    pub xau_feed: FeedId,
    /// The gold-pegged token (one token = one gram).
    pub settlement_token: TokenConfig,
    /// The companion reward/utility token.
    pub utility_token: TokenConfig,
    /// Accepted stablecoins.
    pub quote_assets: Vec<QuoteAssetConfig>,
    /// Quote asset paid out by offline sells.
    pub default_quote_asset: AssetId,
    /// Max attested-vs-oracle deviation, basis points.
    #[serde(default = "default_max_oracle_deviation_bp")]
    pub max_oracle_deviation_bp: u16,
    /// Max attested-vs-last-accepted deviation, basis points.
    #[serde(default = "default_max_last_price_deviation_bp")]
    pub max_last_price_deviation_bp: u16,
    /// Troy-ounce-to-gram conversion constant.
    #[serde(default = "default_grams_per_troy_ounce")]
    pub grams_per_troy_ounce: Fixed18,
    /// Reference price used before the first settlement commits one.
    pub initial_xau_price: Fixed18,
    #[serde(default)]
    pub rewards: RewardPolicy,
    /// Receives quote payments from buys; the pool account if unset.
    #[serde(default)]
    pub treasury: Option<Address>,
    #[serde(default)]
    pub swap: SwapConfig,
}

fn default_max_oracle_deviation_bp() -> u16 {
    constants::DEFAULT_MAX_ORACLE_DEVIATION_BP
}

fn default_max_last_price_deviation_bp() -> u16 {
    constants::DEFAULT_MAX_LAST_PRICE_DEVIATION_BP
}

fn default_grams_per_troy_ounce() -> Fixed18 {
    Fixed18::from_raw(alloy_primitives::U256::from(
        constants::GRAMS_PER_TROY_OUNCE_RAW,
    ))
}

impl PoolConfig {
    /// Parse and validate a JSON config.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(json)
            .map_err(|e| AurumError::Configuration(format!("invalid pool config: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Look up a configured quote asset.
    ///
    /// # Errors
    /// `UnknownQuoteAsset` if the asset is not accepted by this pool.
    pub fn quote_asset(&self, asset: &AssetId) -> Result<&QuoteAssetConfig> {
        self.quote_assets
            .iter()
            .find(|q| &q.asset == asset)
            .ok_or(AurumError::UnknownQuoteAsset(*asset))
    }

    /// Where buy payments are sent.
    #[must_use]
    pub fn payment_recipient(&self) -> Address {
        self.treasury.unwrap_or(self.pool_account)
    }

    /// Reject configurations that would make the guards meaningless.
    pub fn validate(&self) -> Result<()> {
        let bps = constants::BPS_DENOMINATOR;

        if self.signer == Address::ZERO {
            return Err(AurumError::Configuration("signer must not be the zero address".into()));
        }
        if self.pool_account == Address::ZERO {
            return Err(AurumError::Configuration(
                "pool account must not be the zero address".into(),
            ));
        }
        if self.initial_xau_price.is_zero() {
            return Err(AurumError::Configuration("initial XAU price must be positive".into()));
        }
        if self.grams_per_troy_ounce.is_zero() {
            return Err(AurumError::Configuration("grams per troy ounce must be positive".into()));
        }
        if self.max_oracle_deviation_bp > bps || self.max_last_price_deviation_bp > bps {
            return Err(AurumError::Configuration(format!(
                "deviation bounds must be at most {bps} bp"
            )));
        }
        if self.rewards.inviter_bp > bps {
            return Err(AurumError::Configuration(format!(
                "inviter share must be at most {bps} bp"
            )));
        }

        let decimals = [self.settlement_token.decimals, self.utility_token.decimals]
            .into_iter()
            .chain(self.quote_assets.iter().map(|q| q.decimals));
        for d in decimals {
            if d > constants::MAX_TOKEN_DECIMALS {
                return Err(AurumError::Configuration(format!(
                    "token decimals {d} exceed {}",
                    constants::MAX_TOKEN_DECIMALS
                )));
            }
        }

        if self.quote_assets.is_empty() {
            return Err(AurumError::Configuration("at least one quote asset is required".into()));
        }
        for (i, q) in self.quote_assets.iter().enumerate() {
            if self.quote_assets[..i].iter().any(|p| p.asset == q.asset) {
                return Err(AurumError::Configuration(format!(
                    "quote asset {} configured twice",
                    q.asset
                )));
            }
        }
        self.quote_asset(&self.default_quote_asset).map_err(|_| {
            AurumError::Configuration(format!(
                "default quote asset {} is not a configured quote asset",
                self.default_quote_asset
            ))
        })?;

        if !self.swap.stopped {
            if self.swap.sibling_pool == Address::ZERO {
                return Err(AurumError::Configuration(
                    "swap sibling pool must be set before enabling swaps".into(),
                ));
            }
            if self.swap.utility_price.is_zero() {
                return Err(AurumError::Configuration(
                    "swap utility price must be positive".into(),
                ));
            }
            self.quote_asset(&self.swap.routing_quote_asset).map_err(|_| {
                AurumError::Configuration(format!(
                    "swap routing asset {} is not a configured quote asset",
                    self.swap.routing_quote_asset
                ))
            })?;
        }

        Ok(())
    }
}

/// Fixture config for tests. **Never use in production.**
///
/// USDT uses 18 decimals and USDC 6, so both conversion directions get
/// exercised.
#[cfg(any(test, feature = "test-helpers"))]
impl PoolConfig {
    pub const DUMMY_POOL: Address = Address::repeat_byte(0x50);
    pub const DUMMY_SIBLING_POOL: Address = Address::repeat_byte(0x51);
    pub const DUMMY_TREASURY: Address = Address::repeat_byte(0x52);
    pub const DUMMY_SETTLEMENT_TOKEN: AssetId = AssetId(Address::repeat_byte(0xa1));
    pub const DUMMY_UTILITY_TOKEN: AssetId = AssetId(Address::repeat_byte(0xa2));
    pub const DUMMY_USDT: AssetId = AssetId(Address::repeat_byte(0xb1));
    pub const DUMMY_USDC: AssetId = AssetId(Address::repeat_byte(0xb2));
    pub const DUMMY_XAU_FEED: FeedId = FeedId(Address::repeat_byte(0xf0));
    pub const DUMMY_USDT_FEED: FeedId = FeedId(Address::repeat_byte(0xf1));
    pub const DUMMY_USDC_FEED: FeedId = FeedId(Address::repeat_byte(0xf2));

    /// A valid config with swaps enabled, trusting `signer`.
    #[must_use]
    pub fn dummy(signer: Address) -> Self {
        Self {
            pool_account: Self::DUMMY_POOL,
            signer,
            xau_feed: Self::DUMMY_XAU_FEED,
            settlement_token: TokenConfig {
                asset: Self::DUMMY_SETTLEMENT_TOKEN,
                symbol: "GHK".to_string(),
                decimals: 18,
            },
            utility_token: TokenConfig {
                asset: Self::DUMMY_UTILITY_TOKEN,
                symbol: "GHKE".to_string(),
                decimals: 18,
            },
            quote_assets: vec![
                QuoteAssetConfig {
                    asset: Self::DUMMY_USDT,
                    symbol: "USDT".to_string(),
                    decimals: 18,
                    feed: Self::DUMMY_USDT_FEED,
                },
                QuoteAssetConfig {
                    asset: Self::DUMMY_USDC,
                    symbol: "USDC".to_string(),
                    decimals: 6,
                    feed: Self::DUMMY_USDC_FEED,
                },
            ],
            default_quote_asset: Self::DUMMY_USDT,
            max_oracle_deviation_bp: constants::DEFAULT_MAX_ORACLE_DEVIATION_BP,
            max_last_price_deviation_bp: constants::DEFAULT_MAX_LAST_PRICE_DEVIATION_BP,
            grams_per_troy_ounce: default_grams_per_troy_ounce(),
            initial_xau_price: Fixed18::from_raw(alloy_primitives::U256::from(
                4_202_242_759_559_214_530_560u128,
            )),
            rewards: RewardPolicy {
                utility_per_token: Fixed18::from_integer(100),
                inviter_enabled: true,
                inviter_bp: 1_000,
            },
            treasury: None,
            swap: SwapConfig {
                sibling_pool: Self::DUMMY_SIBLING_POOL,
                utility_price: Fixed18::from_raw(alloy_primitives::U256::from(
                    100_000_000_000_000_000u128,
                )),
                routing_quote_asset: Self::DUMMY_USDT,
                stopped: false,
            },
        }
    }
}
