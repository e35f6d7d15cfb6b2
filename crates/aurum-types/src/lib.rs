//! # aurum-types
//!
//! Shared types, errors, and configuration for the **Aurum** settlement pools.
//!
//! This crate is the leaf dependency of the workspace; every other crate
//! depends on it. It defines:
//!
//! - **Fixed point**: [`Fixed18`], the canonical 18-digit price scale
//! - **Identifiers**: [`AssetId`], [`FeedId`], [`SettlementId`], re-exported [`Address`]
//! - **Attestation model**: [`PriceAttestation`]
//! - **Oracle model**: [`OracleQuote`]
//! - **Settlement model**: [`SettlementKind`], [`SettlementRequest`], [`SettlementResult`], [`TransferLeg`]
//! - **Pool model**: [`PoolState`]
//! - **Configuration**: [`PoolConfig`], [`TokenConfig`], [`QuoteAssetConfig`], [`RewardPolicy`], [`SwapConfig`]
//! - **Errors**: [`AurumError`] with `AU_ERR_` codes
//! - **Constants**: system-wide scales and defaults

pub mod attestation;
pub mod config;
pub mod constants;
pub mod error;
pub mod fixed;
pub mod ids;
pub mod oracle;
pub mod request;
pub mod state;

// Re-export all primary types at crate root for ergonomic imports:
//   use aurum_types::{Fixed18, PriceAttestation, PoolConfig, ...};

pub use attestation::*;
pub use config::*;
pub use error::*;
pub use fixed::*;
pub use ids::*;
pub use oracle::*;
pub use request::*;
pub use state::*;

// Constants are accessed via `aurum_types::constants::FOO`
// (not re-exported to avoid name collisions).
