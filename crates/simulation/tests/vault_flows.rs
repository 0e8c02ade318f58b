use tick_vault_core::config::VaultConfig;
use tick_vault_core::engine::{EngineContext, EngineError, UnlockCallback};
use tick_vault_core::settlement::PendingSettlement;
use tick_vault_core::{Vault, VaultError};
use tick_vault_domain::math::get_sqrt_ratio_at_tick;
use tick_vault_domain::{Address, Currency, PoolId, PoolKey, TickRange, TokenAmounts};
use tick_vault_simulation::SimulatedEngine;

const FUNDS: u128 = 1_000_000_000_000_000;

fn engine_address() -> Address {
    Address::from_low_u64_be(0xe0)
}

fn vault_address() -> Address {
    Address::from_low_u64_be(0x7a)
}

fn trader() -> Address {
    Address::from_low_u64_be(0x22)
}

fn alice() -> Address {
    Address::from_low_u64_be(0xa1)
}

fn bob() -> Address {
    Address::from_low_u64_be(0xb0)
}

fn key() -> PoolKey {
    PoolKey::new(
        Currency::from_low_u64(0xc0),
        Currency::from_low_u64(0xc1),
        3000,
        60,
        vault_address(),
    )
    .unwrap()
}

struct Fixture {
    engine: SimulatedEngine,
    vault: Vault,
    pool: PoolId,
}

impl Fixture {
    fn new() -> Self {
        Self::with_vault_funds(FUNDS)
    }

    fn with_vault_funds(vault_funds: u128) -> Self {
        let mut engine = SimulatedEngine::new(engine_address());
        let mut vault =
            Vault::new(vault_address(), engine_address(), VaultConfig::default()).unwrap();
        let pool = engine
            .initialize(key(), get_sqrt_ratio_at_tick(0).unwrap(), &mut vault)
            .unwrap();
        for account in [trader(), alice(), bob()] {
            engine.mint(account, key().currency0, FUNDS).unwrap();
            engine.mint(account, key().currency1, FUNDS).unwrap();
        }
        if vault_funds > 0 {
            engine.mint(vault_address(), key().currency0, vault_funds).unwrap();
            engine.mint(vault_address(), key().currency1, vault_funds).unwrap();
        }
        Self {
            engine,
            vault,
            pool,
        }
    }

    fn deposit(&mut self, actor: Address, amount: u128) -> Result<u128, VaultError> {
        self.vault
            .deposit(
                &mut self.engine,
                actor,
                &self.pool,
                TokenAmounts::new(amount, amount),
                TokenAmounts::zero(),
            )
            .map(|outcome| outcome.shares)
    }

    fn withdraw(&mut self, actor: Address, shares: u128) -> Result<u128, VaultError> {
        self.vault
            .withdraw(
                &mut self.engine,
                actor,
                &self.pool,
                shares,
                TokenAmounts::zero(),
            )
            .map(|outcome| outcome.liquidity)
    }

    fn range(&self) -> TickRange {
        self.vault.position(&self.pool).unwrap().range
    }

    fn engine_liquidity(&self, range: TickRange) -> u128 {
        self.engine
            .position_liquidity(&self.pool, vault_address(), range)
            .unwrap()
    }

    fn assert_in_sync(&self) {
        let report = self.vault.reconcile(&self.engine).unwrap();
        assert!(report.is_in_sync(), "{report:?}");
        assert_eq!(
            self.engine.pool_liquidity(&self.pool),
            self.vault.vault_state(&self.pool).unwrap().total_liquidity
        );
    }
}

#[test]
fn registration_centers_range_on_initial_tick() {
    let fixture = Fixture::new();
    assert_eq!(fixture.range(), TickRange::new(-6000, 6000));
    assert_eq!(fixture.vault.position(&fixture.pool).unwrap().liquidity, 0);
}

#[test]
fn two_depositors_then_first_exits() {
    let mut fixture = Fixture::new();

    let a_shares = fixture.deposit(alice(), 1_000_000).unwrap();
    let a_liquidity = fixture.vault.vault_state(&fixture.pool).unwrap().total_liquidity;
    assert_eq!(a_shares, a_liquidity);

    let b_shares = fixture.deposit(bob(), 500_000).unwrap();
    let state = fixture.vault.vault_state(&fixture.pool).unwrap();
    let b_liquidity = state.total_liquidity - a_liquidity;
    // One share per unit of liquidity as long as nothing else changed.
    assert_eq!(b_shares, b_liquidity);
    assert_eq!(state.total_shares, state.total_liquidity);
    fixture.assert_in_sync();

    let redeemed = fixture.withdraw(alice(), a_shares).unwrap();
    assert_eq!(redeemed, a_liquidity);
    let state = fixture.vault.vault_state(&fixture.pool).unwrap();
    assert_eq!(state.total_liquidity, b_liquidity);
    assert_eq!(state.total_shares, b_shares);
    assert_eq!(
        fixture.vault.liquidity_of(&fixture.pool, &bob()).unwrap(),
        b_liquidity
    );
    fixture.assert_in_sync();
}

#[test]
fn depositor_pays_exactly_what_was_settled() {
    let mut fixture = Fixture::new();
    let c0 = key().currency0;
    let c1 = key().currency1;
    let preview = fixture
        .vault
        .preview_deposit(&fixture.engine, &fixture.pool, TokenAmounts::new(10_000, 10_000))
        .unwrap();

    let outcome = fixture
        .vault
        .deposit(
            &mut fixture.engine,
            alice(),
            &fixture.pool,
            TokenAmounts::new(10_000, 10_000),
            TokenAmounts::zero(),
        )
        .unwrap();

    assert_eq!(outcome.amounts, preview.amounts);
    assert!(outcome.amounts.amount0 <= 10_000 && outcome.amounts.amount1 <= 10_000);
    assert_eq!(
        fixture.engine.balance_of(alice(), c0),
        FUNDS - outcome.amounts.amount0
    );
    assert_eq!(
        fixture.engine.balance_of(alice(), c1),
        FUNDS - outcome.amounts.amount1
    );
}

#[test]
fn sole_holder_exit_leaves_nothing_behind() {
    let mut fixture = Fixture::new();
    let shares = fixture.deposit(alice(), 777_777).unwrap();
    fixture.withdraw(alice(), shares / 3).unwrap();
    let rest = fixture.vault.shares_of(&fixture.pool, &alice()).unwrap();
    fixture.withdraw(alice(), rest).unwrap();

    let state = fixture.vault.vault_state(&fixture.pool).unwrap();
    assert_eq!(state.total_liquidity, 0);
    assert_eq!(state.total_shares, 0);
    assert_eq!(fixture.engine_liquidity(fixture.range()), 0);
    fixture.assert_in_sync();
}

#[test]
fn deposit_slippage_rolls_back_engine_and_books() {
    let mut fixture = Fixture::new();
    let c0 = key().currency0;

    let result = fixture.vault.deposit(
        &mut fixture.engine,
        alice(),
        &fixture.pool,
        TokenAmounts::new(10_000, 10_000),
        TokenAmounts::new(10_001, 0),
    );

    assert!(matches!(result, Err(VaultError::SlippageExceeded { .. })));
    assert_eq!(fixture.engine.pool_liquidity(&fixture.pool), 0);
    assert_eq!(fixture.engine.balance_of(alice(), c0), FUNDS);
    assert!(fixture.vault.vault_state(&fixture.pool).unwrap().is_empty());
    assert_eq!(fixture.vault.events().count("deposited"), 0);

    // The settlement slot was released.
    fixture.deposit(alice(), 10_000).unwrap();
}

#[test]
fn withdraw_slippage_keeps_shares() {
    let mut fixture = Fixture::new();
    let shares = fixture.deposit(alice(), 10_000).unwrap();

    let result = fixture.vault.withdraw(
        &mut fixture.engine,
        alice(),
        &fixture.pool,
        shares,
        TokenAmounts::new(u128::MAX, u128::MAX),
    );
    assert!(matches!(result, Err(VaultError::SlippageExceeded { .. })));
    assert_eq!(
        fixture.vault.shares_of(&fixture.pool, &alice()).unwrap(),
        shares
    );
    fixture.assert_in_sync();
}

#[test]
fn unfunded_depositor_changes_nothing() {
    let mut fixture = Fixture::new();
    let pauper = Address::from_low_u64_be(0xdead);
    let result = fixture.deposit(pauper, 10_000);
    assert!(matches!(
        result,
        Err(VaultError::Engine(EngineError::InsufficientBalance { .. }))
    ));
    assert_eq!(fixture.engine.pool_liquidity(&fixture.pool), 0);
    fixture.assert_in_sync();
}

#[test]
fn swap_out_of_range_rebalances_atomically() {
    let mut fixture = Fixture::new();
    fixture.deposit(alice(), 1_000_000).unwrap();
    let liquidity = fixture.vault.position(&fixture.pool).unwrap().liquidity;

    fixture
        .engine
        .swap_to_tick(trader(), &fixture.pool, 3000, &mut fixture.vault)
        .unwrap();
    assert_eq!(fixture.range(), TickRange::new(-6000, 6000));

    fixture
        .engine
        .swap_to_tick(trader(), &fixture.pool, 7000, &mut fixture.vault)
        .unwrap();
    assert_eq!(fixture.range(), TickRange::new(960, 12960));
    assert_eq!(fixture.engine_liquidity(TickRange::new(-6000, 6000)), 0);
    assert_eq!(fixture.engine_liquidity(TickRange::new(960, 12960)), liquidity);
    assert_eq!(fixture.vault.events().count("rebalanced"), 1);
    fixture.assert_in_sync();

    // Holders keep their claim on the moved liquidity.
    let shares = fixture.vault.shares_of(&fixture.pool, &alice()).unwrap();
    assert_eq!(fixture.withdraw(alice(), shares).unwrap(), liquidity);
}

#[test]
fn negative_ticks_rebalance_with_truncated_center() {
    let mut fixture = Fixture::new();
    fixture.deposit(alice(), 1_000_000).unwrap();

    fixture
        .engine
        .swap_to_tick(trader(), &fixture.pool, -6001, &mut fixture.vault)
        .unwrap();
    // -6001 / 60 truncates to -100.
    assert_eq!(fixture.range(), TickRange::new(-12000, 0));
    fixture.assert_in_sync();
}

#[test]
fn failed_rebalance_aborts_the_swap() {
    let mut fixture = Fixture::new();
    fixture.deposit(alice(), 1_000_000).unwrap();
    let liquidity = fixture.vault.position(&fixture.pool).unwrap().liquidity;
    fixture.engine.set_paused(true);

    // In range: no liquidity change needed, the swap goes through.
    fixture
        .engine
        .swap_to_tick(trader(), &fixture.pool, 100, &mut fixture.vault)
        .unwrap();

    let result = fixture
        .engine
        .swap_to_tick(trader(), &fixture.pool, 7000, &mut fixture.vault);
    assert!(matches!(
        result,
        Err(VaultError::Engine(EngineError::Paused))
    ));
    assert_eq!(fixture.engine.slot0(&fixture.pool).unwrap().tick, 100);
    assert_eq!(fixture.range(), TickRange::new(-6000, 6000));
    assert_eq!(fixture.engine_liquidity(TickRange::new(-6000, 6000)), liquidity);
    assert_eq!(fixture.vault.events().count("rebalanced"), 0);
    fixture.assert_in_sync();
}

#[test]
fn unfunded_vault_cannot_rebalance() {
    let mut fixture = Fixture::with_vault_funds(0);
    fixture.deposit(alice(), 1_000_000_000).unwrap();
    let liquidity = fixture.vault.position(&fixture.pool).unwrap().liquidity;

    fixture
        .engine
        .swap_to_tick(trader(), &fixture.pool, 3000, &mut fixture.vault)
        .unwrap();

    // Re-centering at 7000 needs token0 the old range no longer holds.
    let result = fixture
        .engine
        .swap_to_tick(trader(), &fixture.pool, 7000, &mut fixture.vault);
    match result {
        Err(VaultError::Engine(EngineError::InsufficientBalance {
            account, required, ..
        })) => {
            assert_eq!(account, vault_address());
            assert!(required > 1_000);
        }
        other => panic!("unexpected swap result: {other:?}"),
    }
    assert_eq!(fixture.engine.slot0(&fixture.pool).unwrap().tick, 3000);
    assert_eq!(fixture.range(), TickRange::new(-6000, 6000));
    assert_eq!(fixture.engine_liquidity(TickRange::new(-6000, 6000)), liquidity);
    assert_eq!(fixture.vault.events().count("rebalanced"), 0);
    fixture.assert_in_sync();
}

#[test]
fn tick_width_change_applies_on_next_rebalance() {
    let mut fixture = Fixture::new();
    fixture.deposit(alice(), 1_000_000).unwrap();
    assert_eq!(fixture.vault.set_tick_width(&fixture.pool, 10).unwrap(), 100);
    assert_eq!(fixture.range(), TickRange::new(-6000, 6000));

    fixture
        .engine
        .swap_to_tick(trader(), &fixture.pool, 7000, &mut fixture.vault)
        .unwrap();
    assert_eq!(fixture.range(), TickRange::new(6360, 7560));
    fixture.assert_in_sync();
}

#[test]
fn foreign_engine_cannot_drive_the_vault() {
    let mut fixture = Fixture::new();
    let mut impostor = SimulatedEngine::new(Address::from_low_u64_be(0xbad));
    let other_key = PoolKey::new(
        Currency::from_low_u64(0xc0),
        Currency::from_low_u64(0xc1),
        500,
        10,
        vault_address(),
    )
    .unwrap();

    let result = impostor.initialize(
        other_key.clone(),
        get_sqrt_ratio_at_tick(0).unwrap(),
        &mut fixture.vault,
    );
    assert!(matches!(result, Err(VaultError::NotPoolManager { .. })));
    assert!(impostor.pools().next().is_none());
    assert!(fixture.vault.position(&other_key.id()).is_err());
}

#[test]
fn callback_outside_a_request_is_rejected() {
    let mut fixture = Fixture::new();
    let payload = PendingSettlement::Add {
        pool: fixture.pool.clone(),
        actor: alice(),
        range: TickRange::new(-6000, 6000),
        liquidity: 1_000,
        requested_amounts: TokenAmounts::new(1_000, 1_000),
        min_amounts: TokenAmounts::zero(),
    }
    .encode()
    .unwrap();

    let result = fixture
        .vault
        .unlock_callback(engine_address(), &mut fixture.engine, &payload);
    assert!(matches!(result, Err(VaultError::UnsolicitedCallback)));
    assert_eq!(fixture.engine.pool_liquidity(&fixture.pool), 0);
}

#[test]
fn many_holders_stay_reconciled() {
    let mut fixture = Fixture::new();
    let holders: Vec<Address> = (1..=6).map(|i| Address::from_low_u64_be(0x1000 + i)).collect();
    for holder in &holders {
        fixture.engine.mint(*holder, key().currency0, FUNDS).unwrap();
        fixture.engine.mint(*holder, key().currency1, FUNDS).unwrap();
    }

    for (i, holder) in holders.iter().enumerate() {
        fixture.deposit(*holder, 50_000 + 12_345 * i as u128).unwrap();
    }
    fixture
        .engine
        .swap_to_tick(trader(), &fixture.pool, 6500, &mut fixture.vault)
        .unwrap();
    for holder in holders.iter().step_by(2) {
        let shares = fixture.vault.shares_of(&fixture.pool, holder).unwrap();
        fixture.withdraw(*holder, shares / 2).unwrap();
    }
    fixture
        .engine
        .swap_to_tick(trader(), &fixture.pool, -1000, &mut fixture.vault)
        .unwrap();
    fixture.assert_in_sync();

    for holder in &holders {
        let shares = fixture.vault.shares_of(&fixture.pool, holder).unwrap();
        fixture.withdraw(*holder, shares).unwrap();
    }
    let state = fixture.vault.vault_state(&fixture.pool).unwrap();
    assert_eq!(state.total_liquidity, 0);
    assert_eq!(state.total_shares, 0);
    fixture.assert_in_sync();
}
