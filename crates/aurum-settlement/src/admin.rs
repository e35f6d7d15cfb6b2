//! Privileged pool operations.
//!
//! These replace configuration or override pool state outside the guarded
//! settlement path. Each config change is applied to a copy, validated, and
//! only then installed, so a rejected change leaves the pool as it was.
//! Access control belongs to the caller of this API.

use alloy_primitives::Address;
use aurum_pricing::OracleFeed;
use aurum_types::{AssetId, AurumError, FeedId, Fixed18, PoolConfig, Result, RewardPolicy};

use crate::engine::SettlementEngine;
use crate::ledger::AssetLedger;

impl<L: AssetLedger> SettlementEngine<L> {
    /// Override the last accepted XAU price.
    ///
    /// # Errors
    /// `Configuration` if `price` is zero.
    pub fn set_latest_xau_price(&mut self, price: Fixed18) -> Result<()> {
        if price.is_zero() {
            return Err(AurumError::Configuration(
                "latest XAU price must be positive".into(),
            ));
        }
        let previous = self.state.last_accepted_price();
        self.state.commit(price);
        tracing::info!(previous = %previous, price = %price, "Latest XAU price overridden");
        Ok(())
    }

    pub fn set_signer(&mut self, signer: Address) -> Result<()> {
        self.reconfigure("signer", |cfg| cfg.signer = signer)
    }

    pub fn set_deviation_bounds(
        &mut self,
        max_oracle_deviation_bp: u16,
        max_last_price_deviation_bp: u16,
    ) -> Result<()> {
        self.reconfigure("deviation bounds", |cfg| {
            cfg.max_oracle_deviation_bp = max_oracle_deviation_bp;
            cfg.max_last_price_deviation_bp = max_last_price_deviation_bp;
        })
    }

    /// Point the pool at a new XAU/USD feed.
    pub fn set_xau_feed(&mut self, feed: FeedId, source: Box<dyn OracleFeed>) -> Result<()> {
        self.reconfigure("xau feed", |cfg| cfg.xau_feed = feed)?;
        self.feeds.register(feed, source);
        Ok(())
    }

    /// Point a configured quote asset at a new USD feed.
    pub fn set_quote_feed(
        &mut self,
        asset: AssetId,
        feed: FeedId,
        source: Box<dyn OracleFeed>,
    ) -> Result<()> {
        self.config.quote_asset(&asset)?;
        self.reconfigure("quote feed", |cfg| {
            if let Some(q) = cfg.quote_assets.iter_mut().find(|q| q.asset == asset) {
                q.feed = feed;
            }
        })?;
        self.feeds.register(feed, source);
        Ok(())
    }

    /// Register or replace the source behind a feed id without touching
    /// the config.
    pub fn register_feed(&mut self, feed: FeedId, source: Box<dyn OracleFeed>) {
        self.feeds.register(feed, source);
        tracing::info!(feed = %feed, "Feed source registered");
    }

    pub fn set_rewards(&mut self, rewards: RewardPolicy) -> Result<()> {
        self.reconfigure("rewards", |cfg| cfg.rewards = rewards)
    }

    /// Forward buy payments to `treasury`, or back to the pool with `None`.
    pub fn set_treasury(&mut self, treasury: Option<Address>) -> Result<()> {
        self.reconfigure("treasury", |cfg| cfg.treasury = treasury)
    }

    pub fn set_sibling_pool(&mut self, sibling_pool: Address) -> Result<()> {
        self.reconfigure("sibling pool", |cfg| cfg.swap.sibling_pool = sibling_pool)
    }

    /// Pause (`true`) or resume (`false`) swaps.
    pub fn set_stop(&mut self, stopped: bool) -> Result<()> {
        self.reconfigure("swap stop", |cfg| cfg.swap.stopped = stopped)
    }

    /// Lift a supply-conservation halt once the ledger has been reconciled.
    /// Returns the reason the engine halted, if it had.
    pub fn resume(&mut self) -> Option<String> {
        let reason = self.halt_reason.take();
        if let Some(reason) = &reason {
            tracing::warn!(reason = %reason, "Pool resumed after halt");
        }
        reason
    }

    fn reconfigure(&mut self, what: &'static str, change: impl FnOnce(&mut PoolConfig)) -> Result<()> {
        let mut next = self.config.clone();
        change(&mut next);
        if let Err(err) = self.install_config(next) {
            tracing::warn!(setting = what, code = err.code(), error = %err, "Config change rejected");
            return Err(err);
        }
        tracing::info!(setting = what, "Config updated");
        Ok(())
    }
}
