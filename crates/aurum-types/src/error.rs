//! Error types for the Aurum settlement pools.
//!
//! The four guard failures display the exact revert strings callers match
//! on. Every variant also carries an `AU_ERR_` code (see
//! [`AurumError::code`]) for grepping in logs. Codes are grouped by
//! subsystem:
//! - 1xx: Attestation errors
//! - 2xx: Oracle / deviation errors
//! - 3xx: Balance / liquidity errors
//! - 4xx: Pool lifecycle errors
//! - 9xx: General / internal errors

use alloy_primitives::U256;
use thiserror::Error;

use crate::{AssetId, FeedId};

/// Central error enum for all Aurum operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AurumError {
    // =================================================================
    // Attestation Errors (1xx)
    // =================================================================
    /// The recovered signer is not the authorized oracle operator, or the
    /// signature blob could not be recovered at all.
    #[error("Invalid signature")]
    SignatureInvalid,

    /// The attestation deadline is in the past.
    #[error("Signature expired")]
    SignatureExpired { deadline: U256, now: u64 },

    // =================================================================
    // Oracle / Deviation Errors (2xx)
    // =================================================================
    /// Attested price is too far from the on-chain oracle price.
    #[error("Offchain price deviates from oracle price too much")]
    OracleDeviationExceeded { deviation_bp: U256, max_bp: u16 },

    /// Attested price is too far from the last accepted price.
    #[error("Offchain price deviates from latest price too much")]
    LastPriceDeviationExceeded { deviation_bp: U256, max_bp: u16 },

    /// The external feed could not produce a usable price.
    #[error("Oracle feed unavailable: {feed}: {reason}")]
    FeedUnavailable { feed: FeedId, reason: String },

    /// The quote asset is not configured for this pool.
    #[error("Unsupported quote asset: {0}")]
    UnknownQuoteAsset(AssetId),

    // =================================================================
    // Balance / Liquidity Errors (3xx)
    // =================================================================
    /// The caller does not hold enough of the asset being paid in.
    #[error("Insufficient balance of {asset}: need {needed}, have {available}")]
    InsufficientBalance {
        asset: AssetId,
        needed: U256,
        available: U256,
    },

    /// A pool reserve cannot cover the payout.
    #[error("Insufficient liquidity of {asset}: need {needed}, have {available}")]
    InsufficientLiquidity {
        asset: AssetId,
        needed: U256,
        available: U256,
    },

    /// The requested amount is zero or rounds to a zero payout.
    #[error("Invalid amount: {reason}")]
    InvalidAmount { reason: String },

    /// A settlement did not conserve ledger totals.
    #[error("Supply invariant violation: {reason}")]
    SupplyInvariantViolation { reason: String },

    // =================================================================
    // Pool Lifecycle Errors (4xx)
    // =================================================================
    /// Swaps are paused on this pool.
    #[error("Swap is stopped")]
    SwapStopped,

    /// The request is missing a field its kind requires.
    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    /// The pool stopped settling after its ledger broke supply
    /// conservation. Cleared only by an explicit resume.
    #[error("Pool halted: {reason}")]
    PoolHalted { reason: String },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Checked fixed-point arithmetic overflowed or divided by zero.
    #[error("Arithmetic overflow in {context}")]
    ArithmeticOverflow { context: &'static str },

    /// Configuration error (invalid config file, bad bounds, etc.).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Serialization / deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Unrecoverable internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AurumError {
    /// Stable `AU_ERR_` code for this error.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::SignatureInvalid => "AU_ERR_100",
            Self::SignatureExpired { .. } => "AU_ERR_101",
            Self::OracleDeviationExceeded { .. } => "AU_ERR_200",
            Self::LastPriceDeviationExceeded { .. } => "AU_ERR_201",
            Self::FeedUnavailable { .. } => "AU_ERR_202",
            Self::UnknownQuoteAsset(_) => "AU_ERR_203",
            Self::InsufficientBalance { .. } => "AU_ERR_300",
            Self::InsufficientLiquidity { .. } => "AU_ERR_301",
            Self::InvalidAmount { .. } => "AU_ERR_302",
            Self::SupplyInvariantViolation { .. } => "AU_ERR_303",
            Self::SwapStopped => "AU_ERR_400",
            Self::InvalidRequest { .. } => "AU_ERR_401",
            Self::PoolHalted { .. } => "AU_ERR_402",
            Self::ArithmeticOverflow { .. } => "AU_ERR_900",
            Self::Configuration(_) => "AU_ERR_901",
            Self::Serialization(_) => "AU_ERR_902",
            Self::Internal(_) => "AU_ERR_903",
        }
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, AurumError>;

impl From<serde_json::Error> for AurumError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
