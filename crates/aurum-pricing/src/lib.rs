//! # aurum-pricing
//!
//! **Pure price math for Aurum pools.**
//!
//! This crate is the compute plane. It reads external feeds through the
//! [`OracleFeed`] trait and turns prices and token amounts into each other.
//! It has:
//!
//! - **Zero side effects**: no balances, no pool state, no signatures
//! - **One scale**: every price leaves this crate as an 18-digit [`Fixed18`](aurum_types::Fixed18)
//! - **Floor rounding**: amounts converted back to native decimals are truncated

pub mod feed;
pub mod normalizer;

#[cfg(any(test, feature = "test-helpers"))]
pub use feed::StaticFeed;
pub use feed::{FeedRegistry, OracleFeed, normalize_quote};
pub use normalizer::{PriceNormalizer, from_canonical, to_canonical, units_for_usd, usd_value};
