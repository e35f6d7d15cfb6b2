//! Mutable pool state owned by the settlement engine.

use serde::{Deserialize, Serialize};

use crate::Fixed18;

/// The only core-owned mutable value of a pool.
///
/// `last_accepted_price` always holds a price that passed both deviation
/// checks, or the configured initial price, or an administrative override.
/// It is replaced wholesale, never accumulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolState {
    last_accepted_price: Fixed18,
}

impl PoolState {
    /// Start from the configured initial price.
    #[must_use]
    pub fn new(initial_price: Fixed18) -> Self {
        Self {
            last_accepted_price: initial_price,
        }
    }

    #[must_use]
    pub fn last_accepted_price(&self) -> Fixed18 {
        self.last_accepted_price
    }

    /// Record the price of a fully settled request.
    pub fn commit(&mut self, price: Fixed18) {
        self.last_accepted_price = price;
    }
}
