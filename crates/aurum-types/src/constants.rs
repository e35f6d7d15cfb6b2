//! System-wide constants for the Aurum settlement pools.

/// Fractional decimal digits of the canonical fixed-point scale.
pub const CANONICAL_DECIMALS: u8 = 18;

/// `10^18` as a `u128`, the raw value of `1.0` on the canonical scale.
pub const CANONICAL_ONE: u128 = 1_000_000_000_000_000_000;

/// Basis-point denominator (100% = 10 000 bp).
pub const BPS_DENOMINATOR: u16 = 10_000;

/// Grams per troy ounce (31.1034768) on the canonical scale.
pub const GRAMS_PER_TROY_OUNCE_RAW: u128 = 31_103_476_800_000_000_000;

/// Default bound between the attested price and the on-chain oracle (5%).
pub const DEFAULT_MAX_ORACLE_DEVIATION_BP: u16 = 500;

/// Default bound between the attested price and the last accepted price (10%).
pub const DEFAULT_MAX_LAST_PRICE_DEVIATION_BP: u16 = 1_000;

/// Largest token decimals accepted by configuration validation.
pub const MAX_TOKEN_DECIMALS: u8 = 36;

/// Length of a recoverable secp256k1 signature (r || s || v).
pub const SIGNATURE_LEN: usize = 65;

/// Length of the packed attestation payload: price (32) || deadline (32) || address (20).
pub const ATTESTATION_PAYLOAD_LEN: usize = 84;

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "Aurum";
