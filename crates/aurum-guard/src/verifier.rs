//! Attestation verifier: authenticity and freshness of a signed price.
//!
//! The two checks are separate gates so callers can run either on its own:
//! - [`AttestationVerifier::verify_signer`]: recovered secp256k1 signer equals
//!   the configured operator (`SignatureInvalid` otherwise)
//! - [`AttestationVerifier::verify_deadline`]: `now <= deadline`
//!   (`SignatureExpired` otherwise; the deadline second itself is valid)
//!
//! [`AttestationVerifier::verify`] runs both, signer first.

use alloy_primitives::{Address, Signature, U256};
use aurum_types::{AurumError, Fixed18, PoolConfig, PriceAttestation, Result, constants};

/// Checks attestations against a single authorized signer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttestationVerifier {
    signer: Address,
}

impl AttestationVerifier {
    #[must_use]
    pub fn new(signer: Address) -> Self {
        Self { signer }
    }

    #[must_use]
    pub fn from_config(config: &PoolConfig) -> Self {
        Self::new(config.signer)
    }

    /// The only address whose attestations pass.
    #[must_use]
    pub fn expected_signer(&self) -> Address {
        self.signer
    }

    /// Recover the address that signed `attestation` for `recipient`.
    ///
    /// # Errors
    /// `SignatureInvalid` if the blob is malformed or unrecoverable.
    pub fn recover_signer(attestation: &PriceAttestation, recipient: Address) -> Result<Address> {
        if attestation.signature.len() != constants::SIGNATURE_LEN {
            return Err(AurumError::SignatureInvalid);
        }
        let signature =
            Signature::from_raw(&attestation.signature).map_err(|_| AurumError::SignatureInvalid)?;
        signature
            .recover_address_from_prehash(&attestation.signed_message_hash(recipient))
            .map_err(|_| AurumError::SignatureInvalid)
    }

    /// Gate: the attestation was signed by the configured operator for
    /// `recipient`.
    pub fn verify_signer(&self, attestation: &PriceAttestation, recipient: Address) -> Result<()> {
        let recovered = Self::recover_signer(attestation, recipient)?;
        if recovered != self.signer {
            tracing::debug!(
                expected = %self.signer,
                recovered = %recovered,
                "Attestation signer mismatch"
            );
            return Err(AurumError::SignatureInvalid);
        }
        Ok(())
    }

    /// Gate: `now` is not past the attestation deadline.
    pub fn verify_deadline(attestation: &PriceAttestation, now: u64) -> Result<()> {
        if U256::from(now) > attestation.deadline {
            return Err(AurumError::SignatureExpired {
                deadline: attestation.deadline,
                now,
            });
        }
        Ok(())
    }

    /// Both gates, signer first. Returns the attested price.
    pub fn verify(
        &self,
        attestation: &PriceAttestation,
        recipient: Address,
        now: u64,
    ) -> Result<Fixed18> {
        self.verify_signer(attestation, recipient)?;
        Self::verify_deadline(attestation, now)?;
        Ok(attestation.price)
    }
}
