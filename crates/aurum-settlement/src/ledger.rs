//! Asset ledger collaborator.
//!
//! The engine never touches balances directly. It hands the whole set of
//! [`TransferLeg`]s of one settlement to [`AssetLedger::apply_batch`], which
//! must apply all of them or none.
//!
//! [`InMemoryLedger`] tracks a single balance per `(account, asset)`:
//! 1. `deposit` → funds enter the ledger (supply grows)
//! 2. `apply_batch` → funds move between accounts (supply unchanged)
//! 3. `withdraw` → funds leave the ledger (supply shrinks)

use std::collections::{BTreeMap, HashMap};

use alloy_primitives::{Address, U256};
use aurum_types::{AssetId, AurumError, Result, TransferLeg};

use crate::supply_conservation::SupplyConservation;

/// Balances of every account the pools settle against.
pub trait AssetLedger {
    /// Current balance of `account` in `asset` (zero if never seen).
    fn balance(&self, account: Address, asset: AssetId) -> U256;

    /// Apply every leg or none.
    ///
    /// # Errors
    /// `InsufficientBalance` if any sender cannot cover the sum of its legs
    /// in an asset. The ledger is unchanged on error.
    fn apply_batch(&mut self, legs: &[TransferLeg]) -> Result<()>;

    /// Sum of all balances in `asset`.
    fn total_supply(&self, asset: AssetId) -> U256;
}

/// Sum of the legs' amounts per `(sender, asset)`.
///
/// # Errors
/// `ArithmeticOverflow` if a sum does not fit.
pub fn aggregate_debits(legs: &[TransferLeg]) -> Result<BTreeMap<(Address, AssetId), U256>> {
    let mut debits: BTreeMap<(Address, AssetId), U256> = BTreeMap::new();
    for leg in legs {
        let total = debits.entry((leg.from, leg.asset)).or_insert(U256::ZERO);
        *total = total
            .checked_add(leg.amount)
            .ok_or(AurumError::ArithmeticOverflow {
                context: "aggregate debits",
            })?;
    }
    Ok(debits)
}

/// In-memory ledger for all accounts and assets.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    /// `(account, asset) → balance`
    balances: HashMap<(Address, AssetId), U256>,
    supply: SupplyConservation,
}

impl InMemoryLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // =================================================================
    // Inflow / outflow
    // =================================================================

    /// Credit `amount` to `account`.
    ///
    /// # Errors
    /// `InvalidAmount` if `amount` is zero.
    pub fn deposit(&mut self, account: Address, asset: AssetId, amount: U256) -> Result<()> {
        if amount.is_zero() {
            return Err(AurumError::InvalidAmount {
                reason: "deposit amount must be positive".into(),
            });
        }
        let entry = self.balances.entry((account, asset)).or_insert(U256::ZERO);
        *entry = entry
            .checked_add(amount)
            .ok_or(AurumError::ArithmeticOverflow { context: "deposit" })?;
        self.supply.record_deposit(asset, amount)
    }

    /// Debit `amount` from `account`.
    ///
    /// # Errors
    /// `InsufficientBalance` if the account holds less than `amount`.
    pub fn withdraw(&mut self, account: Address, asset: AssetId, amount: U256) -> Result<()> {
        if amount.is_zero() {
            return Err(AurumError::InvalidAmount {
                reason: "withdraw amount must be positive".into(),
            });
        }
        let available = self.balance(account, asset);
        if available < amount {
            return Err(AurumError::InsufficientBalance {
                asset,
                needed: amount,
                available,
            });
        }
        self.balances.insert((account, asset), available - amount);
        self.supply.record_withdrawal(asset, amount)
    }

    // =================================================================
    // Invariants
    // =================================================================

    /// Check that balances of `asset` add up to deposits minus withdrawals.
    pub fn verify_supply(&self, asset: AssetId) -> Result<()> {
        self.supply.verify(&asset, self.total_supply(asset))
    }

    /// Check every asset that ever entered the ledger.
    pub fn verify_all_supply(&self) -> Result<()> {
        self.supply
            .tracked_assets()
            .into_iter()
            .try_for_each(|asset| self.verify_supply(asset))
    }

    /// Number of `(account, asset)` entries tracked.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.balances.len()
    }
}

impl AssetLedger for InMemoryLedger {
    fn balance(&self, account: Address, asset: AssetId) -> U256 {
        self.balances
            .get(&(account, asset))
            .copied()
            .unwrap_or(U256::ZERO)
    }

    fn apply_batch(&mut self, legs: &[TransferLeg]) -> Result<()> {
        // Check every sender against its aggregated debit first.
        for ((account, asset), needed) in aggregate_debits(legs)? {
            let available = self.balance(account, asset);
            if available < needed {
                return Err(AurumError::InsufficientBalance {
                    asset,
                    needed,
                    available,
                });
            }
        }

        // Stage the new balances so an overflow leaves the ledger untouched.
        let mut staged: HashMap<(Address, AssetId), U256> = HashMap::new();
        for leg in legs {
            let from = staged
                .get(&(leg.from, leg.asset))
                .copied()
                .unwrap_or_else(|| self.balance(leg.from, leg.asset));
            staged.insert((leg.from, leg.asset), from - leg.amount);

            let to = staged
                .get(&(leg.to, leg.asset))
                .copied()
                .unwrap_or_else(|| self.balance(leg.to, leg.asset));
            let credited = to
                .checked_add(leg.amount)
                .ok_or(AurumError::ArithmeticOverflow {
                    context: "ledger credit",
                })?;
            staged.insert((leg.to, leg.asset), credited);
        }

        self.balances.extend(staged);
        Ok(())
    }

    fn total_supply(&self, asset: AssetId) -> U256 {
        self.balances
            .iter()
            .filter(|((_, a), _)| *a == asset)
            .fold(U256::ZERO, |acc, (_, b)| acc.saturating_add(*b))
    }
}
