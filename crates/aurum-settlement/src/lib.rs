//! # aurum-settlement
//!
//! **Finality plane** of an Aurum pool: takes a settlement request through
//! the guards, computes every transfer, moves assets, and commits the
//! accepted price.
//!
//! ## Operations
//!
//! - **buy**: quote asset in, settlement token out, plus utility rewards
//!   (and an inviter share when one is named)
//! - **sell**: settlement token in, quote asset out at the attested price
//! - **sell_offline**: settlement token in, default quote asset out at the
//!   last accepted price; no attestation, no price commit
//! - **swap**: utility token in, settlement token out of the sibling pool
//! - **get_price** / **get_amount_out** / **quote_price**: pure reads
//! - **set_latest_xau_price** and the other privileged setters in [`admin`]
//!
//! ## Atomicity
//!
//! A request either applies all of its legs and commits its price, or
//! leaves the ledger and pool state exactly as they were. After every
//! batch the engine checks that no asset's ledger total changed.

pub mod admin;
pub mod clock;
pub mod engine;
pub mod ledger;
pub mod supply_conservation;

pub use clock::{Clock, FixedClock, SystemClock};
pub use engine::{SettlementEngine, SettlementStage, SwapQuote};
pub use ledger::{AssetLedger, InMemoryLedger};
pub use supply_conservation::SupplyConservation;
