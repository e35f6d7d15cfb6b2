//! Supply conservation invariant checker.
//!
//! Invariant enforced after every settlement:
//! ```text
//! ∀ asset: Σ(balances) == Σ(deposits) - Σ(withdrawals)
//! ```
//!
//! Settlement legs only move balances between accounts, so a settlement
//! can never change the left-hand side. A mismatch means the ledger is
//! corrupt and the pool must stop.

use std::collections::{BTreeSet, HashMap};

use alloy_primitives::U256;
use aurum_types::{AssetId, AurumError, Result};

/// Per-asset inflow/outflow totals for one ledger.
#[derive(Debug, Clone, Default)]
pub struct SupplyConservation {
    deposits: HashMap<AssetId, U256>,
    withdrawals: HashMap<AssetId, U256>,
}

impl SupplyConservation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_deposit(&mut self, asset: AssetId, amount: U256) -> Result<()> {
        let total = self.deposits.entry(asset).or_insert(U256::ZERO);
        *total = total
            .checked_add(amount)
            .ok_or(AurumError::ArithmeticOverflow {
                context: "deposit total",
            })?;
        Ok(())
    }

    pub fn record_withdrawal(&mut self, asset: AssetId, amount: U256) -> Result<()> {
        let total = self.withdrawals.entry(asset).or_insert(U256::ZERO);
        *total = total
            .checked_add(amount)
            .ok_or(AurumError::ArithmeticOverflow {
                context: "withdrawal total",
            })?;
        Ok(())
    }

    #[must_use]
    pub fn total_deposits(&self, asset: &AssetId) -> U256 {
        self.deposits.get(asset).copied().unwrap_or(U256::ZERO)
    }

    #[must_use]
    pub fn total_withdrawals(&self, asset: &AssetId) -> U256 {
        self.withdrawals.get(asset).copied().unwrap_or(U256::ZERO)
    }

    /// Deposits minus withdrawals. Saturates at zero; a ledger never lets
    /// withdrawals exceed deposits.
    #[must_use]
    pub fn expected_supply(&self, asset: &AssetId) -> U256 {
        self.total_deposits(asset)
            .saturating_sub(self.total_withdrawals(asset))
    }

    /// # Errors
    /// `SupplyInvariantViolation` if `actual_supply` differs from the
    /// expected supply.
    pub fn verify(&self, asset: &AssetId, actual_supply: U256) -> Result<()> {
        let expected = self.expected_supply(asset);
        if actual_supply != expected {
            return Err(AurumError::SupplyInvariantViolation {
                reason: format!(
                    "{asset}: actual supply {actual_supply} != expected {expected} \
                     (deposits={}, withdrawals={})",
                    self.total_deposits(asset),
                    self.total_withdrawals(asset),
                ),
            });
        }
        Ok(())
    }

    /// Every asset that ever moved in or out, in address order.
    #[must_use]
    pub fn tracked_assets(&self) -> Vec<AssetId> {
        let assets: BTreeSet<AssetId> = self
            .deposits
            .keys()
            .chain(self.withdrawals.keys())
            .copied()
            .collect();
        assets.into_iter().collect()
    }
}
