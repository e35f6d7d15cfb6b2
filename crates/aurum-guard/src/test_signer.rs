//! Oracle-operator signer for tests. **Never use in production.**

use alloy_primitives::{Address, U256, keccak256};
use aurum_types::{Fixed18, PriceAttestation};
use k256::ecdsa::SigningKey;

/// Produces attestations the way the off-chain operator does.
#[derive(Clone)]
pub struct TestSigner {
    key: SigningKey,
    address: Address,
}

impl TestSigner {
    /// Deterministic key derived from `seed`; distinct seeds give distinct keys.
    #[must_use]
    pub fn from_seed(seed: u8) -> Self {
        let secret = keccak256([b'a', b'u', b'r', b'u', b'm', seed]);
        let key = SigningKey::from_slice(secret.as_slice())
            .expect("keccak output is a valid secp256k1 scalar");
        Self::from_key(key)
    }

    /// Fresh random key.
    #[must_use]
    pub fn random() -> Self {
        Self::from_key(SigningKey::random(&mut rand::rngs::OsRng))
    }

    fn from_key(key: SigningKey) -> Self {
        let address = Address::from_private_key(&key);
        Self { key, address }
    }

    #[must_use]
    pub fn address(&self) -> Address {
        self.address
    }

    /// Sign `price` valid until `deadline` for `recipient`.
    #[must_use]
    pub fn sign(&self, price: Fixed18, deadline: U256, recipient: Address) -> PriceAttestation {
        let unsigned = PriceAttestation::new(price, deadline, Vec::new());
        let hash = unsigned.signed_message_hash(recipient);
        let (signature, recovery_id) = self
            .key
            .sign_prehash_recoverable(hash.as_slice())
            .expect("prehash signing cannot fail for a 32-byte hash");

        let mut blob = Vec::with_capacity(65);
        blob.extend_from_slice(&signature.to_bytes());
        blob.push(27 + recovery_id.to_byte());
        PriceAttestation::new(price, deadline, blob)
    }
}

impl std::fmt::Debug for TestSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestSigner")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}
