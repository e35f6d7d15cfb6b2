//! Settlement request and result types.

use std::fmt;

use alloy_primitives::{Address, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{AssetId, AurumError, Fixed18, PriceAttestation, Result, SettlementId};

/// What the caller wants to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SettlementKind {
    /// Pay a quote asset, receive settlement tokens (+ utility reward).
    Buy,
    /// Deliver settlement tokens, receive a quote asset at the attested price.
    Sell,
    /// Deliver settlement tokens, receive the default quote asset at the
    /// last accepted price. No attestation.
    SellOffline,
    /// Deliver utility tokens, receive settlement tokens from the sibling pool.
    Swap,
}

impl SettlementKind {
    /// Whether this kind must carry a signed attestation.
    #[must_use]
    pub fn requires_attestation(self) -> bool {
        !matches!(self, Self::SellOffline)
    }
}

impl fmt::Display for SettlementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
            Self::SellOffline => write!(f, "SELL_OFFLINE"),
            Self::Swap => write!(f, "SWAP"),
        }
    }
}

/// One settlement call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementRequest {
    pub kind: SettlementKind,
    /// The account paying in and receiving out. Also the address bound
    /// into the attestation signature.
    pub caller: Address,
    /// Settlement-token units for buy/sell, utility-token units for swap.
    pub amount: U256,
    /// Stablecoin paid in (buy) or out (sell). Ignored by offline sells and swaps.
    pub quote_asset: Option<AssetId>,
    pub attestation: Option<PriceAttestation>,
    /// Referrer credited on buys. The zero address means none.
    pub inviter: Option<Address>,
}

impl SettlementRequest {
    #[must_use]
    pub fn buy(
        caller: Address,
        amount: U256,
        quote_asset: AssetId,
        inviter: Option<Address>,
        attestation: PriceAttestation,
    ) -> Self {
        Self {
            kind: SettlementKind::Buy,
            caller,
            amount,
            quote_asset: Some(quote_asset),
            attestation: Some(attestation),
            inviter,
        }
    }

    #[must_use]
    pub fn sell(
        caller: Address,
        amount: U256,
        quote_asset: AssetId,
        attestation: PriceAttestation,
    ) -> Self {
        Self {
            kind: SettlementKind::Sell,
            caller,
            amount,
            quote_asset: Some(quote_asset),
            attestation: Some(attestation),
            inviter: None,
        }
    }

    #[must_use]
    pub fn sell_offline(caller: Address, amount: U256) -> Self {
        Self {
            kind: SettlementKind::SellOffline,
            caller,
            amount,
            quote_asset: None,
            attestation: None,
            inviter: None,
        }
    }

    #[must_use]
    pub fn swap(caller: Address, amount: U256, attestation: PriceAttestation) -> Self {
        Self {
            kind: SettlementKind::Swap,
            caller,
            amount,
            quote_asset: None,
            attestation: Some(attestation),
            inviter: None,
        }
    }

    /// The attestation, required for every kind except offline sells.
    pub fn require_attestation(&self) -> Result<&PriceAttestation> {
        self.attestation
            .as_ref()
            .ok_or_else(|| AurumError::InvalidRequest {
                reason: format!("{} requires a signed price attestation", self.kind),
            })
    }

    /// The quote asset, required for buys and attested sells.
    pub fn require_quote_asset(&self) -> Result<AssetId> {
        self.quote_asset.ok_or_else(|| AurumError::InvalidRequest {
            reason: format!("{} requires a quote asset", self.kind),
        })
    }

    /// The inviter, with the zero address normalized to `None`.
    #[must_use]
    pub fn effective_inviter(&self) -> Option<Address> {
        self.inviter.filter(|a| *a != Address::ZERO)
    }
}

/// One asset movement in a settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferLeg {
    pub asset: AssetId,
    pub from: Address,
    pub to: Address,
    pub amount: U256,
}

impl TransferLeg {
    #[must_use]
    pub fn new(asset: AssetId, from: Address, to: Address, amount: U256) -> Self {
        Self {
            asset,
            from,
            to,
            amount,
        }
    }
}

/// A committed settlement: every leg that moved plus the price used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementResult {
    pub id: SettlementId,
    pub kind: SettlementKind,
    pub caller: Address,
    /// XAU/oz price the amounts were computed at.
    pub accepted_price: Fixed18,
    /// Per-gram price derived from `accepted_price`.
    pub gram_price: Fixed18,
    /// Transfers in execution order.
    pub legs: Vec<TransferLeg>,
    pub settled_at: DateTime<Utc>,
}

impl SettlementResult {
    /// Total amount of `asset` received by `account` across all legs.
    #[must_use]
    pub fn received(&self, account: Address, asset: AssetId) -> U256 {
        self.legs
            .iter()
            .filter(|l| l.to == account && l.asset == asset)
            .fold(U256::ZERO, |acc, l| acc.saturating_add(l.amount))
    }

    /// Total amount of `asset` paid by `account` across all legs.
    #[must_use]
    pub fn paid(&self, account: Address, asset: AssetId) -> U256 {
        self.legs
            .iter()
            .filter(|l| l.from == account && l.asset == asset)
            .fold(U256::ZERO, |acc, l| acc.saturating_add(l.amount))
    }

    /// SHA-256 audit digest over the settlement's canonical fields.
    ///
    /// Format: `"aurum:stl:v1:" || id || kind || caller || price || (asset || from || to || amount)*`
    #[must_use]
    pub fn digest(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(b"aurum:stl:v1:");
        hasher.update(self.id.0.as_bytes());
        hasher.update(self.kind.to_string().as_bytes());
        hasher.update(self.caller.as_slice());
        hasher.update(self.accepted_price.raw().to_be_bytes::<32>());
        for leg in &self.legs {
            hasher.update(leg.asset.0.as_slice());
            hasher.update(leg.from.as_slice());
            hasher.update(leg.to.as_slice());
            hasher.update(leg.amount.to_be_bytes::<32>());
        }
        hasher.finalize().into()
    }

    /// Hex form of [`Self::digest`], for logs.
    #[must_use]
    pub fn digest_hex(&self) -> String {
        hex::encode(self.digest())
    }
}
