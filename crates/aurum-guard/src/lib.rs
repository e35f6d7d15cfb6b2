//! # aurum-guard
//!
//! **Hard gates** every attested settlement passes before any asset moves.
//!
//! ## Gates
//!
//! 1. **AttestationVerifier**: the price was signed by the configured
//!    oracle operator for this caller
//! 2. **AttestationVerifier**: the attestation deadline has not passed
//! 3. **DeviationGuard**: the price is within bounds of the on-chain oracle
//! 4. **DeviationGuard**: the price is within bounds of the last accepted price
//!
//! ```text
//! verify_signer() → verify_deadline() → check_oracle() → check_last_price()
//! ```
//!
//! Gates are independent and composable; each one fails closed with its own
//! error. None of them has side effects.

pub mod deviation;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_signer;
pub mod verifier;

pub use deviation::DeviationGuard;
#[cfg(any(test, feature = "test-helpers"))]
pub use test_signer::TestSigner;
pub use verifier::AttestationVerifier;
