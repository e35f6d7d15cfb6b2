//! Settlement engine: one pool, one request at a time.
//!
//! Every request walks the same stages and stops at the first failure:
//!
//! ```text
//! Start → VerifySignature → CheckDeviation → ComputeAmounts → TransferAssets → CommitPrice → Done
//! ```
//!
//! Nothing observable changes before `TransferAssets`, and the ledger
//! applies the legs of a request as one batch. The attested price is
//! committed only after that batch succeeds. Offline sells skip the
//! signature and oracle gates, settle at the last accepted price, and never
//! commit.
//!
//! All entry points take `&mut self`, so no request can observe another
//! request's intermediate state.
//!
//! If the ledger reports success but the batch changed an asset's total,
//! the legs cannot be taken back. The engine halts instead: that request
//! fails with `SupplyInvariantViolation` and every later one with
//! `PoolHalted` until [`SettlementEngine::resume`] is called.

use std::collections::BTreeSet;
use std::fmt;

use alloy_primitives::{Address, U256};
use aurum_guard::{AttestationVerifier, DeviationGuard};
use aurum_pricing::{FeedRegistry, PriceNormalizer, from_canonical, units_for_usd, usd_value};
use aurum_types::{
    AssetId, AurumError, Fixed18, PoolConfig, PoolState, PriceAttestation, QuoteAssetConfig,
    Result, SettlementId, SettlementKind, SettlementRequest, SettlementResult, TransferLeg,
    constants, fixed::mul_div,
};

use crate::clock::Clock;
use crate::ledger::{AssetLedger, aggregate_debits};

/// Where a request is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementStage {
    Start,
    VerifySignature,
    CheckDeviation,
    ComputeAmounts,
    TransferAssets,
    CommitPrice,
    Done,
}

impl fmt::Display for SettlementStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "START",
            Self::VerifySignature => "VERIFY_SIGNATURE",
            Self::CheckDeviation => "CHECK_DEVIATION",
            Self::ComputeAmounts => "COMPUTE_AMOUNTS",
            Self::TransferAssets => "TRANSFER_ASSETS",
            Self::CommitPrice => "COMMIT_PRICE",
            Self::Done => "DONE",
        };
        f.write_str(name)
    }
}

/// Amounts of a utility → settlement swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapQuote {
    /// USD value of the utility tokens paid in.
    pub usd_value: Fixed18,
    /// Settlement-token units paid out of the sibling pool.
    pub settlement_out: U256,
    /// Routing quote-asset units sent from this pool to the sibling pool.
    pub routing_amount: U256,
}

/// Orchestrates buy / sell / offline sell / swap against one pool.
pub struct SettlementEngine<L: AssetLedger> {
    pub(crate) config: PoolConfig,
    pub(crate) state: PoolState,
    pub(crate) feeds: FeedRegistry,
    pub(crate) ledger: L,
    pub(crate) clock: Box<dyn Clock>,
    pub(crate) normalizer: PriceNormalizer,
    pub(crate) verifier: AttestationVerifier,
    pub(crate) guard: DeviationGuard,
    pub(crate) halt_reason: Option<String>,
}

impl<L: AssetLedger> SettlementEngine<L> {
    /// Build an engine over a validated config. The last accepted price
    /// starts at `config.initial_xau_price`.
    ///
    /// # Errors
    /// `Configuration` if the config does not validate.
    pub fn new(
        config: PoolConfig,
        feeds: FeedRegistry,
        ledger: L,
        clock: Box<dyn Clock>,
    ) -> Result<Self> {
        config.validate()?;
        let normalizer = PriceNormalizer::from_config(&config)?;
        let state = PoolState::new(config.initial_xau_price);
        tracing::info!(
            pool = %config.pool_account,
            signer = %config.signer,
            initial_price = %config.initial_xau_price,
            max_oracle_bp = config.max_oracle_deviation_bp,
            max_last_bp = config.max_last_price_deviation_bp,
            "{} settlement engine v{} started",
            constants::ENGINE_NAME,
            constants::VERSION
        );
        Ok(Self {
            verifier: AttestationVerifier::from_config(&config),
            guard: DeviationGuard::from_config(&config),
            normalizer,
            config,
            state,
            feeds,
            ledger,
            clock,
            halt_reason: None,
        })
    }

    // =================================================================
    // Accessors
    // =================================================================

    #[must_use]
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    #[must_use]
    pub fn state(&self) -> &PoolState {
        &self.state
    }

    #[must_use]
    pub fn last_accepted_price(&self) -> Fixed18 {
        self.state.last_accepted_price()
    }

    #[must_use]
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    #[must_use]
    pub fn is_halted(&self) -> bool {
        self.halt_reason.is_some()
    }

    /// Why the engine stopped settling, if it did.
    #[must_use]
    pub fn halt_reason(&self) -> Option<&str> {
        self.halt_reason.as_deref()
    }

    /// The ledger collaborator, for funding and reconciliation outside
    /// the settlement path.
    pub fn ledger_mut(&mut self) -> &mut L {
        &mut self.ledger
    }

    // =================================================================
    // Entry points
    // =================================================================

    /// Pay `quote_asset` for `amount` settlement-token units.
    pub fn buy(
        &mut self,
        caller: Address,
        amount: U256,
        quote_asset: AssetId,
        inviter: Option<Address>,
        attestation: PriceAttestation,
    ) -> Result<SettlementResult> {
        self.settle(&SettlementRequest::buy(
            caller,
            amount,
            quote_asset,
            inviter,
            attestation,
        ))
    }

    /// Deliver `amount` settlement-token units for `quote_asset`.
    pub fn sell(
        &mut self,
        caller: Address,
        amount: U256,
        quote_asset: AssetId,
        attestation: PriceAttestation,
    ) -> Result<SettlementResult> {
        self.settle(&SettlementRequest::sell(caller, amount, quote_asset, attestation))
    }

    /// Sell at the last accepted price for the default quote asset.
    pub fn sell_offline(&mut self, caller: Address, amount: U256) -> Result<SettlementResult> {
        self.settle(&SettlementRequest::sell_offline(caller, amount))
    }

    /// Swap `amount` utility-token units for settlement tokens.
    pub fn swap(
        &mut self,
        caller: Address,
        amount: U256,
        attestation: PriceAttestation,
    ) -> Result<SettlementResult> {
        self.settle(&SettlementRequest::swap(caller, amount, attestation))
    }

    /// Run one request to completion or reject it with no effect.
    pub fn settle(&mut self, request: &SettlementRequest) -> Result<SettlementResult> {
        match self.execute(request) {
            Ok(result) => {
                tracing::info!(
                    settlement_id = %result.id,
                    kind = %result.kind,
                    caller = %result.caller,
                    amount = %request.amount,
                    price = %result.accepted_price,
                    gram_price = %result.gram_price,
                    legs = result.legs.len(),
                    digest = %result.digest_hex(),
                    "Settlement committed"
                );
                Ok(result)
            }
            Err(err) => {
                tracing::warn!(
                    code = err.code(),
                    kind = %request.kind,
                    caller = %request.caller,
                    amount = %request.amount,
                    error = %err,
                    "Settlement rejected"
                );
                Err(err)
            }
        }
    }

    // =================================================================
    // Pure reads
    // =================================================================

    /// Per-gram price for an XAU/oz price.
    pub fn get_price(&self, xau_price: Fixed18) -> Result<Fixed18> {
        self.normalizer.gram_price(xau_price)
    }

    /// Settlement-token units a swap of `amount` utility units would pay
    /// out at `xau_price`.
    pub fn get_amount_out(&self, amount: U256, xau_price: Fixed18) -> Result<U256> {
        let gram_price = self.normalizer.gram_price(xau_price)?;
        let usd = self.utility_usd_value(amount)?;
        units_for_usd(usd, gram_price, self.config.settlement_token.decimals)
    }

    /// Canonical USD price of a configured quote asset.
    pub fn quote_price(&self, asset: AssetId) -> Result<Fixed18> {
        let quote = self.config.quote_asset(&asset)?;
        self.feeds.read_canonical(quote.feed)
    }

    /// Full swap breakdown of `amount` utility units at `gram_price`.
    pub fn swap_quote(&self, amount: U256, gram_price: Fixed18) -> Result<SwapQuote> {
        let swap = &self.config.swap;
        let usd = self.utility_usd_value(amount)?;
        let settlement_out = units_for_usd(usd, gram_price, self.config.settlement_token.decimals)?;

        let route = self.config.quote_asset(&swap.routing_quote_asset)?;
        let route_price = self.feeds.read_canonical(route.feed)?;
        let routing_amount = units_for_usd(usd, route_price, route.decimals)?;

        Ok(SwapQuote {
            usd_value: usd,
            settlement_out,
            routing_amount,
        })
    }

    fn utility_usd_value(&self, amount: U256) -> Result<Fixed18> {
        usd_value(
            amount,
            self.config.utility_token.decimals,
            self.config.swap.utility_price,
        )
    }

    // =================================================================
    // Pipeline
    // =================================================================

    fn execute(&mut self, request: &SettlementRequest) -> Result<SettlementResult> {
        let id = SettlementId::new();
        stage(id, SettlementStage::Start);

        if let Some(reason) = &self.halt_reason {
            return Err(AurumError::PoolHalted {
                reason: reason.clone(),
            });
        }
        if request.amount.is_zero() {
            return Err(AurumError::InvalidAmount {
                reason: format!("{} amount must be positive", request.kind),
            });
        }
        if request.kind == SettlementKind::Swap && self.config.swap.stopped {
            return Err(AurumError::SwapStopped);
        }

        let price = if request.kind.requires_attestation() {
            let attestation = request.require_attestation()?;

            stage(id, SettlementStage::VerifySignature);
            let price = self
                .verifier
                .verify(attestation, request.caller, self.clock.now())?;

            stage(id, SettlementStage::CheckDeviation);
            self.guard
                .check(price, &self.feeds, self.config.xau_feed, &self.state)?;
            price
        } else {
            stage(id, SettlementStage::CheckDeviation);
            self.state.last_accepted_price()
        };

        stage(id, SettlementStage::ComputeAmounts);
        let gram_price = self.normalizer.gram_price(price)?;
        let legs = match request.kind {
            SettlementKind::Buy => self.buy_legs(request, gram_price)?,
            SettlementKind::Sell => {
                let quote = self.config.quote_asset(&request.require_quote_asset()?)?;
                self.sell_legs(request, quote, gram_price)?
            }
            SettlementKind::SellOffline => {
                let quote = self.config.quote_asset(&self.config.default_quote_asset)?;
                self.sell_legs(request, quote, gram_price)?
            }
            SettlementKind::Swap => self.swap_legs(request, gram_price)?,
        };
        self.check_funds(&legs)?;

        stage(id, SettlementStage::TransferAssets);
        self.transfer(&legs)?;

        if request.kind.requires_attestation() {
            stage(id, SettlementStage::CommitPrice);
            self.state.commit(price);
        }

        stage(id, SettlementStage::Done);
        Ok(SettlementResult {
            id,
            kind: request.kind,
            caller: request.caller,
            accepted_price: price,
            gram_price,
            legs,
            settled_at: self.clock.now_utc(),
        })
    }

    fn buy_legs(&self, request: &SettlementRequest, gram_price: Fixed18) -> Result<Vec<TransferLeg>> {
        let quote = self.config.quote_asset(&request.require_quote_asset()?)?;
        let settlement = &self.config.settlement_token;
        let utility = &self.config.utility_token;
        let pool = self.config.pool_account;

        let usd = usd_value(request.amount, settlement.decimals, gram_price)?;
        let quote_price = self.feeds.read_canonical(quote.feed)?;
        let quote_in = nonzero(
            units_for_usd(usd, quote_price, quote.decimals)?,
            "buy amount rounds to zero quote units",
        )?;

        let mut legs = vec![
            TransferLeg::new(
                quote.asset,
                request.caller,
                self.config.payment_recipient(),
                quote_in,
            ),
            TransferLeg::new(settlement.asset, pool, request.caller, request.amount),
        ];

        let rewards = &self.config.rewards;
        let reward = from_canonical(
            usd_value(request.amount, settlement.decimals, rewards.utility_per_token)?,
            utility.decimals,
        )?;
        if !reward.is_zero() {
            legs.push(TransferLeg::new(utility.asset, pool, request.caller, reward));
        }

        if rewards.inviter_enabled {
            if let Some(inviter) = request.effective_inviter() {
                let inviter_reward = mul_div(
                    reward,
                    U256::from(rewards.inviter_bp),
                    U256::from(constants::BPS_DENOMINATOR),
                    "inviter reward",
                )?;
                if !inviter_reward.is_zero() {
                    legs.push(TransferLeg::new(utility.asset, pool, inviter, inviter_reward));
                }
            }
        }
        Ok(legs)
    }

    fn sell_legs(
        &self,
        request: &SettlementRequest,
        quote: &QuoteAssetConfig,
        gram_price: Fixed18,
    ) -> Result<Vec<TransferLeg>> {
        let settlement = &self.config.settlement_token;
        let pool = self.config.pool_account;

        let usd = usd_value(request.amount, settlement.decimals, gram_price)?;
        let quote_price = self.feeds.read_canonical(quote.feed)?;
        let quote_out = nonzero(
            units_for_usd(usd, quote_price, quote.decimals)?,
            "sell amount rounds to zero quote units",
        )?;

        Ok(vec![
            TransferLeg::new(settlement.asset, request.caller, pool, request.amount),
            TransferLeg::new(quote.asset, pool, request.caller, quote_out),
        ])
    }

    fn swap_legs(&self, request: &SettlementRequest, gram_price: Fixed18) -> Result<Vec<TransferLeg>> {
        let quote = self.swap_quote(request.amount, gram_price)?;
        let settlement_out = nonzero(
            quote.settlement_out,
            "swap amount rounds to zero settlement units",
        )?;
        let pool = self.config.pool_account;
        let sibling = self.config.swap.sibling_pool;

        let mut legs = vec![TransferLeg::new(
            self.config.utility_token.asset,
            request.caller,
            pool,
            request.amount,
        )];
        if !quote.routing_amount.is_zero() {
            legs.push(TransferLeg::new(
                self.config.swap.routing_quote_asset,
                pool,
                sibling,
                quote.routing_amount,
            ));
        }
        legs.push(TransferLeg::new(
            self.config.settlement_token.asset,
            sibling,
            request.caller,
            settlement_out,
        ));
        Ok(legs)
    }

    /// Reject before any transfer if a sender cannot cover its legs. A pool
    /// reserve's shortfall is a liquidity error, anyone else's a balance
    /// error.
    fn check_funds(&self, legs: &[TransferLeg]) -> Result<()> {
        let reserves = [self.config.pool_account, self.config.swap.sibling_pool];
        for ((account, asset), needed) in aggregate_debits(legs)? {
            let available = self.ledger.balance(account, asset);
            if available >= needed {
                continue;
            }
            return Err(if reserves.contains(&account) {
                AurumError::InsufficientLiquidity {
                    asset,
                    needed,
                    available,
                }
            } else {
                AurumError::InsufficientBalance {
                    asset,
                    needed,
                    available,
                }
            });
        }
        Ok(())
    }

    /// Apply the legs and confirm no asset's total changed. A changed total
    /// halts the engine, since the applied legs stay applied.
    fn transfer(&mut self, legs: &[TransferLeg]) -> Result<()> {
        let assets: BTreeSet<AssetId> = legs.iter().map(|l| l.asset).collect();
        let before: Vec<(AssetId, U256)> = assets
            .iter()
            .map(|a| (*a, self.ledger.total_supply(*a)))
            .collect();

        self.ledger.apply_batch(legs)?;

        for (asset, expected) in before {
            let actual = self.ledger.total_supply(asset);
            if actual != expected {
                let reason = format!("{asset}: total {expected} became {actual}");
                tracing::error!(
                    asset = %asset,
                    expected = %expected,
                    actual = %actual,
                    "Ledger did not conserve supply, halting pool"
                );
                self.halt_reason = Some(reason.clone());
                return Err(AurumError::SupplyInvariantViolation { reason });
            }
        }
        Ok(())
    }

    pub(crate) fn install_config(&mut self, config: PoolConfig) -> Result<()> {
        config.validate()?;
        self.normalizer = PriceNormalizer::from_config(&config)?;
        self.verifier = AttestationVerifier::from_config(&config);
        self.guard = DeviationGuard::from_config(&config);
        self.config = config;
        Ok(())
    }
}

fn stage(id: SettlementId, stage: SettlementStage) {
    tracing::debug!(settlement_id = %id, stage = %stage, "Settlement stage");
}

fn nonzero(amount: U256, reason: &str) -> Result<U256> {
    if amount.is_zero() {
        return Err(AurumError::InvalidAmount {
            reason: reason.to_string(),
        });
    }
    Ok(amount)
}
