//! End-to-end tests across the whole settlement path.
//!
//! Guard (signature, expiry, deviation) → pricing → ledger → price commit.
//!
//! They drive a pool funded the way a deployment would be and check both
//! the rejection messages callers see and that a rejected request leaves
//! no trace.

use std::sync::Once;

use alloy_primitives::{Address, U256};
use aurum_guard::TestSigner;
use aurum_pricing::{FeedRegistry, StaticFeed, from_canonical, to_canonical};
use aurum_settlement::{AssetLedger, FixedClock, InMemoryLedger, SettlementEngine};
use aurum_types::{
    AssetId, AurumError, Fixed18, PoolConfig, PriceAttestation, SettlementKind, constants,
};
use rand::Rng;

const NOW: u64 = 1_765_336_624;
/// A deadline long past relative to `NOW`.
const PAST_DEADLINE: u64 = 1_733_831_583;

const POOL: Address = PoolConfig::DUMMY_POOL;
const SIBLING: Address = PoolConfig::DUMMY_SIBLING_POOL;
const GHK: AssetId = PoolConfig::DUMMY_SETTLEMENT_TOKEN;
const GHKE: AssetId = PoolConfig::DUMMY_UTILITY_TOKEN;
const USDT: AssetId = PoolConfig::DUMMY_USDT;
const USDC: AssetId = PoolConfig::DUMMY_USDC;

static TRACING: Once = Once::new();

fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

fn fx(s: &str) -> Fixed18 {
    s.parse().unwrap()
}

/// `n` whole tokens at 18 decimals.
fn tokens(n: u64) -> U256 {
    U256::from(n) * U256::from(constants::CANONICAL_ONE)
}

/// Off-chain price the operator signs in the happy path.
fn attested_price() -> Fixed18 {
    fx("4212.608861052538")
}

/// Helper: one funded pool plus its oracle operator.
struct PoolHarness {
    engine: SettlementEngine<InMemoryLedger>,
    signer: TestSigner,
    clock: FixedClock,
    alice: Address,
    bob: Address,
}

impl PoolHarness {
    fn new() -> Self {
        Self::with_config(|_| {})
    }

    fn with_config(tweak: impl FnOnce(&mut PoolConfig)) -> Self {
        init_tracing();
        let signer = TestSigner::from_seed(1);
        let clock = FixedClock::at(NOW);

        let mut config = PoolConfig::dummy(signer.address());
        tweak(&mut config);

        let mut feeds = FeedRegistry::new();
        // XAU/USD 4212.60, USDT 1.00, USDC 0.9998, all 8-decimal feeds.
        feeds.register(
            PoolConfig::DUMMY_XAU_FEED,
            Box::new(StaticFeed::new(PoolConfig::DUMMY_XAU_FEED, 421_260_000_000, 8)),
        );
        feeds.register(
            PoolConfig::DUMMY_USDT_FEED,
            Box::new(StaticFeed::new(PoolConfig::DUMMY_USDT_FEED, 100_000_000, 8)),
        );
        feeds.register(
            PoolConfig::DUMMY_USDC_FEED,
            Box::new(StaticFeed::new(PoolConfig::DUMMY_USDC_FEED, 99_980_000, 8)),
        );

        let mut ledger = InMemoryLedger::new();
        let alice = Address::repeat_byte(0xa0);
        let bob = Address::repeat_byte(0xb0);

        // Pool reserves
        ledger.deposit(POOL, GHK, tokens(1_000)).unwrap();
        ledger.deposit(POOL, GHKE, tokens(1_000_000)).unwrap();
        ledger.deposit(POOL, USDT, tokens(100_000)).unwrap();
        ledger
            .deposit(POOL, USDC, U256::from(100_000_000_000u64))
            .unwrap();
        ledger.deposit(SIBLING, GHK, tokens(1_000)).unwrap();

        // Users
        ledger.deposit(alice, USDT, tokens(10_000)).unwrap();
        ledger
            .deposit(alice, USDC, U256::from(10_000_000_000u64))
            .unwrap();
        ledger.deposit(alice, GHK, tokens(10)).unwrap();
        ledger.deposit(alice, GHKE, tokens(10_000)).unwrap();

        let engine =
            SettlementEngine::new(config, feeds, ledger, Box::new(clock.clone())).unwrap();
        Self {
            engine,
            signer,
            clock,
            alice,
            bob,
        }
    }

    fn attest(&self, price: Fixed18, caller: Address) -> PriceAttestation {
        self.signer.sign(price, U256::from(NOW + 30), caller)
    }

    fn balance(&self, account: Address, asset: AssetId) -> U256 {
        self.engine.ledger().balance(account, asset)
    }

    /// Every balance the pool can touch, plus the last accepted price.
    fn snapshot(&self) -> (Vec<U256>, Fixed18) {
        let accounts = [
            POOL,
            SIBLING,
            PoolConfig::DUMMY_TREASURY,
            self.alice,
            self.bob,
        ];
        let assets = [GHK, GHKE, USDT, USDC];
        let balances = accounts
            .iter()
            .flat_map(|a| assets.iter().map(move |s| (*a, *s)))
            .map(|(a, s)| self.balance(a, s))
            .collect();
        (balances, self.engine.last_accepted_price())
    }
}

// =============================================================================
// Scenario A: attestation signed by the wrong key
// =============================================================================
#[test]
fn scenario_a_wrong_signer_rejected() {
    let mut h = PoolHarness::new();
    let rogue = TestSigner::from_seed(2);
    let att = rogue.sign(attested_price(), U256::from(NOW + 30), h.alice);

    let err = h
        .engine
        .buy(h.alice, tokens(1), USDT, None, att)
        .unwrap_err();
    assert_eq!(err.to_string(), "Invalid signature");
}

// =============================================================================
// Scenario B: correctly signed but past its deadline
// =============================================================================
#[test]
fn scenario_b_expired_rejected() {
    let mut h = PoolHarness::new();
    let att = h
        .signer
        .sign(attested_price(), U256::from(PAST_DEADLINE), h.alice);

    let err = h
        .engine
        .buy(h.alice, tokens(1), USDT, None, att)
        .unwrap_err();
    assert_eq!(err.to_string(), "Signature expired");
}

// =============================================================================
// Scenario C: off-chain price 1000 USD below the oracle
// =============================================================================
#[test]
fn scenario_c_oracle_deviation_rejected() {
    let mut h = PoolHarness::new();
    let att = h.attest(fx("3212.608861052538"), h.alice);

    let err = h
        .engine
        .buy(h.alice, tokens(1), USDT, None, att)
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Offchain price deviates from oracle price too much"
    );
}

// =============================================================================
// Scenario D: oracle agrees, but the last accepted price is far away
// =============================================================================
#[test]
fn scenario_d_last_price_deviation_rejected() {
    let mut h = PoolHarness::new();
    h.engine.set_latest_xau_price(fx("5202.24")).unwrap();
    let att = h.attest(fx("4212.6"), h.alice);

    let err = h
        .engine
        .buy(h.alice, tokens(1), USDT, None, att)
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Offchain price deviates from latest price too much"
    );
}

// =============================================================================
// Scenario E: everything passes
// =============================================================================
#[test]
fn scenario_e_buy_one_token() {
    let mut h = PoolHarness::new();
    let att = h.attest(attested_price(), h.alice);

    let pool_ghk = h.balance(POOL, GHK);
    let alice_usdt = h.balance(h.alice, USDT);
    let alice_ghk = h.balance(h.alice, GHK);

    let result = h
        .engine
        .buy(h.alice, tokens(1), USDT, None, att)
        .unwrap();

    // 4212.608861052538 / 31.1034768 = 135.438519884456711283 USD per gram
    let gram_price = h.engine.get_price(attested_price()).unwrap();
    assert_eq!(gram_price.raw(), U256::from(135_438_519_884_456_711_283u128));
    assert_eq!(result.gram_price, gram_price);

    assert_eq!(h.balance(POOL, GHK), pool_ghk - tokens(1));
    assert_eq!(h.balance(h.alice, GHK), alice_ghk + tokens(1));
    assert_eq!(h.balance(h.alice, USDT), alice_usdt - gram_price.raw());
    assert_eq!(h.engine.last_accepted_price(), attested_price());

    // 100 utility tokens per settlement token
    assert_eq!(result.received(h.alice, GHKE), tokens(100));
    assert_eq!(result.kind, SettlementKind::Buy);
    h.engine.ledger().verify_all_supply().unwrap();
}

#[test]
fn buy_with_six_decimal_quote_floors() {
    let mut h = PoolHarness::new();
    let att = h.attest(attested_price(), h.alice);
    let before = h.balance(h.alice, USDC);

    h.engine
        .buy(h.alice, tokens(1), USDC, None, att)
        .unwrap();

    // 135.438519884456711283 / 0.9998 = 135.4656130... -> 135.465613 USDC
    assert_eq!(before - h.balance(h.alice, USDC), U256::from(135_465_613u64));
}

#[test]
fn buy_credits_inviter_share() {
    let mut h = PoolHarness::new();
    let att = h.attest(attested_price(), h.alice);

    let result = h
        .engine
        .buy(h.alice, tokens(2), USDT, Some(h.bob), att)
        .unwrap();

    assert_eq!(result.received(h.alice, GHKE), tokens(200));
    // 10% of the buyer's reward
    assert_eq!(h.balance(h.bob, GHKE), tokens(20));
}

#[test]
fn zero_address_inviter_gets_nothing() {
    let mut h = PoolHarness::new();
    let att = h.attest(attested_price(), h.alice);

    let result = h
        .engine
        .buy(h.alice, tokens(1), USDT, Some(Address::ZERO), att)
        .unwrap();

    assert_eq!(result.received(Address::ZERO, GHKE), U256::ZERO);
    assert_eq!(result.legs.len(), 3);
}

#[test]
fn buy_payment_forwarded_to_treasury() {
    let mut h = PoolHarness::with_config(|cfg| cfg.treasury = Some(PoolConfig::DUMMY_TREASURY));
    let att = h.attest(attested_price(), h.alice);
    let pool_usdt = h.balance(POOL, USDT);

    h.engine
        .buy(h.alice, tokens(1), USDT, None, att)
        .unwrap();

    let gram_price = h.engine.get_price(attested_price()).unwrap();
    assert_eq!(h.balance(PoolConfig::DUMMY_TREASURY, USDT), gram_price.raw());
    assert_eq!(h.balance(POOL, USDT), pool_usdt);
}

#[test]
fn sell_pays_quote_at_attested_price() {
    let mut h = PoolHarness::new();
    let att = h.attest(attested_price(), h.alice);
    let alice_usdt = h.balance(h.alice, USDT);

    h.engine
        .sell(h.alice, tokens(1), USDT, att)
        .unwrap();

    let gram_price = h.engine.get_price(attested_price()).unwrap();
    assert_eq!(h.balance(h.alice, USDT), alice_usdt + gram_price.raw());
    assert_eq!(h.balance(h.alice, GHK), tokens(9));
    assert_eq!(h.engine.last_accepted_price(), attested_price());
}

#[test]
fn sell_offline_uses_last_price_and_does_not_commit() {
    let mut h = PoolHarness::new();
    let last = h.engine.last_accepted_price();
    let alice_usdt = h.balance(h.alice, USDT);

    let result = h.engine.sell_offline(h.alice, tokens(1)).unwrap();

    // 4202.24275955921453056 / 31.1034768
    assert_eq!(result.gram_price.raw(), U256::from(135_105_241_982_440_192_363u128));
    assert_eq!(
        h.balance(h.alice, USDT),
        alice_usdt + U256::from(135_105_241_982_440_192_363u128)
    );
    assert_eq!(result.accepted_price, last);
    assert_eq!(h.engine.last_accepted_price(), last);
}

#[test]
fn sell_offline_capped_by_pool_liquidity() {
    let mut h = PoolHarness::new();
    h.engine
        .ledger_mut()
        .deposit(h.alice, GHK, tokens(1_000))
        .unwrap();
    let before = h.snapshot();

    // 1000 GHK is ~135k USDT, more than the pool holds.
    let err = h.engine.sell_offline(h.alice, tokens(1_000)).unwrap_err();
    assert!(matches!(err, AurumError::InsufficientLiquidity { asset, .. } if asset == USDT));
    assert_eq!(h.snapshot(), before);
}

#[test]
fn swap_draws_from_sibling_pool() {
    let mut h = PoolHarness::new();
    let att = h.attest(attested_price(), h.alice);
    let projected = h
        .engine
        .get_amount_out(tokens(1_000), attested_price())
        .unwrap();

    let result = h.engine.swap(h.alice, tokens(1_000), att).unwrap();

    // 1000 GHKE at 0.1 USD = 100 USD = 0.7383423865330964 grams
    assert_eq!(projected, U256::from(738_342_386_533_096_400u64));
    assert_eq!(result.received(h.alice, GHK), projected);
    assert_eq!(result.paid(SIBLING, GHK), projected);
    assert_eq!(h.balance(SIBLING, USDT), tokens(100));
    assert_eq!(h.balance(h.alice, GHKE), tokens(9_000));
    assert_eq!(h.engine.last_accepted_price(), attested_price());
}

#[test]
fn stopped_swap_rejected_without_effect() {
    let mut h = PoolHarness::new();
    h.engine.set_stop(true).unwrap();
    let before = h.snapshot();
    let att = h.attest(attested_price(), h.alice);

    let err = h.engine.swap(h.alice, tokens(1_000), att.clone()).unwrap_err();
    assert_eq!(err, AurumError::SwapStopped);
    assert_eq!(h.snapshot(), before);

    h.engine.set_stop(false).unwrap();
    h.engine.swap(h.alice, tokens(1_000), att).unwrap();
}

#[test]
fn attestation_reusable_until_deadline() {
    let mut h = PoolHarness::new();
    let att = h.attest(attested_price(), h.alice);

    h.engine
        .buy(h.alice, tokens(1), USDT, None, att.clone())
        .unwrap();
    h.clock.advance(30);
    h.engine
        .buy(h.alice, tokens(1), USDT, None, att.clone())
        .unwrap();
    h.clock.advance(1);
    let err = h
        .engine
        .buy(h.alice, tokens(1), USDT, None, att)
        .unwrap_err();
    assert!(matches!(err, AurumError::SignatureExpired { .. }));
}

#[test]
fn attestation_bound_to_caller() {
    let mut h = PoolHarness::new();
    h.engine
        .ledger_mut()
        .deposit(h.bob, USDT, tokens(1_000))
        .unwrap();
    let att = h.attest(attested_price(), h.alice);

    let err = h
        .engine
        .buy(h.bob, tokens(1), USDT, None, att)
        .unwrap_err();
    assert_eq!(err, AurumError::SignatureInvalid);
}

#[test]
fn unknown_quote_asset_rejected() {
    let mut h = PoolHarness::new();
    let att = h.attest(attested_price(), h.alice);
    let err = h
        .engine
        .buy(h.alice, tokens(1), AssetId(Address::repeat_byte(0xee)), None, att)
        .unwrap_err();
    assert!(matches!(err, AurumError::UnknownQuoteAsset(_)));
}

// =============================================================================
// P1: signature gating, across every attested kind
// =============================================================================
#[test]
fn p1_foreign_keys_never_settle() {
    let mut h = PoolHarness::new();
    for _ in 0..5 {
        let rogue = TestSigner::random();
        let deadline = U256::from(NOW + 30);
        let att = rogue.sign(attested_price(), deadline, h.alice);

        let results = [
            h.engine.buy(h.alice, tokens(1), USDT, None, att.clone()),
            h.engine.sell(h.alice, tokens(1), USDC, att.clone()),
            h.engine.swap(h.alice, tokens(1_000), att),
        ];
        for r in results {
            assert_eq!(r.unwrap_err(), AurumError::SignatureInvalid);
        }
    }
}

// =============================================================================
// P2: expiry gating
// =============================================================================
#[test]
fn p2_past_deadlines_never_settle() {
    let mut h = PoolHarness::new();
    let mut rng = rand::thread_rng();
    for _ in 0..10 {
        let deadline = U256::from(rng.gen_range(0..NOW));
        let att = h.signer.sign(attested_price(), deadline, h.alice);
        let err = h
            .engine
            .sell(h.alice, tokens(1), USDT, att)
            .unwrap_err();
        assert!(matches!(err, AurumError::SignatureExpired { .. }));
    }
}

// =============================================================================
// P3: oracle bound, independent of the last price
// =============================================================================
#[test]
fn p3_oracle_bound_ignores_last_price() {
    let mut h = PoolHarness::new();
    // 4212.6 * 1.06 and 4212.6 * 0.94
    for price in ["4465.356", "3959.844"] {
        // Make the last-price check pass trivially.
        h.engine.set_latest_xau_price(fx(price)).unwrap();
        let att = h.attest(fx(price), h.alice);
        let err = h
            .engine
            .buy(h.alice, tokens(1), USDT, None, att)
            .unwrap_err();
        assert!(matches!(err, AurumError::OracleDeviationExceeded { max_bp: 500, .. }));
    }
}

// =============================================================================
// P4: last-price bound
// =============================================================================
#[test]
fn p4_last_price_bound() {
    let mut h = PoolHarness::new();
    // 4212.6 is exactly the oracle; 3800 puts it ~10.86% above the last price.
    h.engine.set_latest_xau_price(fx("3800")).unwrap();
    let att = h.attest(fx("4212.6"), h.alice);
    let err = h
        .engine
        .swap(h.alice, tokens(1_000), att)
        .unwrap_err();
    assert!(matches!(err, AurumError::LastPriceDeviationExceeded { max_bp: 1000, .. }));

    // 3830 puts it within 10%.
    h.engine.set_latest_xau_price(fx("3830")).unwrap();
    let att = h.attest(fx("4212.6"), h.alice);
    h.engine.swap(h.alice, tokens(1_000), att).unwrap();
}

// =============================================================================
// P5: atomicity
// =============================================================================
#[test]
fn p5_failed_requests_leave_no_trace() {
    let mut h = PoolHarness::new();
    let before = h.snapshot();

    // Guard failure
    let rogue = TestSigner::from_seed(9);
    let att = rogue.sign(attested_price(), U256::from(NOW + 30), h.alice);
    assert!(h.engine.buy(h.alice, tokens(1), USDT, None, att).is_err());
    assert_eq!(h.snapshot(), before);

    // Caller cannot pay: 100 GHK costs ~13.5k USDT, Alice has 10k.
    let att = h.attest(attested_price(), h.alice);
    let err = h
        .engine
        .buy(h.alice, tokens(100), USDT, None, att.clone())
        .unwrap_err();
    assert!(matches!(err, AurumError::InsufficientBalance { asset, .. } if asset == USDT));
    assert_eq!(h.snapshot(), before);

    // Pool cannot pay the settlement leg.
    h.engine
        .ledger_mut()
        .deposit(h.alice, USDT, tokens(1_000_000))
        .unwrap();
    let before = h.snapshot();
    let err = h
        .engine
        .buy(h.alice, tokens(2_000), USDT, None, att.clone())
        .unwrap_err();
    assert!(matches!(err, AurumError::InsufficientLiquidity { asset, .. } if asset == GHK));
    assert_eq!(h.snapshot(), before);

    // Sibling pool cannot cover a swap.
    h.engine
        .ledger_mut()
        .deposit(h.alice, GHKE, tokens(100_000_000))
        .unwrap();
    let before = h.snapshot();
    let err = h
        .engine
        .swap(h.alice, tokens(100_000_000), att)
        .unwrap_err();
    assert!(matches!(err, AurumError::InsufficientLiquidity { .. }));
    assert_eq!(h.snapshot(), before);
}

#[test]
fn p5_unavailable_feed_aborts() {
    let mut h = PoolHarness::new();
    h.engine.register_feed(
        PoolConfig::DUMMY_XAU_FEED,
        Box::new(StaticFeed::unavailable(PoolConfig::DUMMY_XAU_FEED)),
    );
    let before = h.snapshot();
    let att = h.attest(attested_price(), h.alice);
    let err = h
        .engine
        .buy(h.alice, tokens(1), USDT, None, att)
        .unwrap_err();
    assert!(matches!(err, AurumError::FeedUnavailable { .. }));
    assert_eq!(h.snapshot(), before);
}

// =============================================================================
// P6: committed price is exactly the attested one
// =============================================================================
#[test]
fn p6_commit_equals_attested_price() {
    let mut h = PoolHarness::new();
    let prices = ["4212.608861052538", "4250.1", "4199.000000000000000001"];
    for p in prices {
        let att = h.attest(fx(p), h.alice);
        let result = h
            .engine
            .buy(h.alice, tokens(1), USDT, None, att)
            .unwrap();
        assert_eq!(result.accepted_price, fx(p));
        assert_eq!(h.engine.last_accepted_price(), fx(p));
    }
    h.engine.ledger().verify_all_supply().unwrap();
}

// =============================================================================
// P7: decimal round trip
// =============================================================================
#[test]
fn p7_quote_amounts_round_trip() {
    let mut rng = rand::thread_rng();
    let h = PoolHarness::new();
    for quote in &h.engine.config().quote_assets {
        for _ in 0..100 {
            let amount = U256::from(rng.r#gen::<u64>());
            let canonical = to_canonical(amount, quote.decimals).unwrap();
            assert_eq!(from_canonical(canonical, quote.decimals).unwrap(), amount);
        }
    }
}

#[test]
fn receipts_are_unique_and_stamped() {
    let mut h = PoolHarness::new();
    let att = h.attest(attested_price(), h.alice);
    let a = h
        .engine
        .buy(h.alice, tokens(1), USDT, None, att.clone())
        .unwrap();
    let b = h
        .engine
        .buy(h.alice, tokens(1), USDT, None, att)
        .unwrap();
    assert_ne!(a.id, b.id);
    assert_ne!(a.digest(), b.digest());
    assert_eq!(a.settled_at.timestamp(), i64::try_from(NOW).unwrap());

    let json = serde_json::to_string(&a).unwrap();
    assert!(json.contains("\"Buy\""));
}
