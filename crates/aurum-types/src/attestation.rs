//! # PriceAttestation: an off-chain gold price signed by the oracle operator
//!
//! The operator signs `keccak256(price || deadline || recipient)` where the
//! three fields are packed in fixed width (32 + 32 + 20 bytes, no ABI
//! length tags). The signature is an EIP-191 personal-message signature
//! over that digest.
//!
//! An attestation has no nonce: it can be presented any number of times
//! until its deadline passes.

use alloy_primitives::{Address, B256, Bytes, U256, eip191_hash_message, keccak256};
use serde::{Deserialize, Serialize};

use crate::{Fixed18, constants};

/// A signed XAU/USD spot price, valid until `deadline` (unix seconds).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceAttestation {
    /// XAU/USD per troy ounce, canonical scale.
    pub price: Fixed18,
    /// Last unix second (inclusive) at which the attestation is valid.
    pub deadline: U256,
    /// 65-byte recoverable secp256k1 signature (r || s || v).
    pub signature: Bytes,
}

impl PriceAttestation {
    #[must_use]
    pub fn new(price: Fixed18, deadline: U256, signature: impl Into<Bytes>) -> Self {
        Self {
            price,
            deadline,
            signature: signature.into(),
        }
    }

    /// Packed signing payload: `price_be32 || deadline_be32 || recipient_20`.
    #[must_use]
    pub fn signing_payload(&self, recipient: Address) -> [u8; constants::ATTESTATION_PAYLOAD_LEN] {
        packed_payload(self.price, self.deadline, recipient)
    }

    /// `keccak256` of the packed payload (what the operator signs).
    #[must_use]
    pub fn digest(&self, recipient: Address) -> B256 {
        keccak256(self.signing_payload(recipient))
    }

    /// The EIP-191 message hash the signature is actually made over.
    #[must_use]
    pub fn signed_message_hash(&self, recipient: Address) -> B256 {
        eip191_hash_message(self.digest(recipient))
    }
}

/// Fixed-width packing of the three signed fields.
#[must_use]
pub fn packed_payload(
    price: Fixed18,
    deadline: U256,
    recipient: Address,
) -> [u8; constants::ATTESTATION_PAYLOAD_LEN] {
    let mut payload = [0u8; constants::ATTESTATION_PAYLOAD_LEN];
    payload[..32].copy_from_slice(&price.raw().to_be_bytes::<32>());
    payload[32..64].copy_from_slice(&deadline.to_be_bytes::<32>());
    payload[64..].copy_from_slice(recipient.as_slice());
    payload
}
