use super::Setup;
use crate::storage::Storage;
use crate::{Error, INITIAL_SHARES, SCALE};
use soroban_sdk::Address;

/// Seeded router with one usdc strategy and a deployed 3 usdc receipt
fn deployed_receipt<'a>() -> (Setup<'a>, super::MockStrategyClient<'a>, Address, u64) {
    let (setup, strategy) = Setup::with_strategy();
    setup.seed();

    let user = setup.user();
    let id = setup.router.deposit_to_batch(&user, &setup.usdc, &(3 * SCALE));
    setup.deploy();

    (setup, strategy, user, id)
}

#[test]
fn test_withdraw_full_receipt_from_strategies() {
    let (setup, strategy, user, id) = deployed_receipt();
    assert_eq!(setup.router.receipt_to_shares(&id), 3 * INITIAL_SHARES);

    let payout = setup.router.withdraw_from_strategies(
        &user,
        &id,
        &setup.usdc,
        &(3 * INITIAL_SHARES),
        &(3 * SCALE),
    );

    assert_eq!(payout, 3 * SCALE);
    assert_eq!(setup.balance(&setup.usdc, &user), 1_000 * SCALE);
    assert_eq!(setup.shares.total_supply(), INITIAL_SHARES);
    assert_eq!(strategy.balance(), SCALE);
    assert!(setup.receipts.get_receipt(&id).resolved);
}

#[test]
fn test_partial_withdraw_credits_remaining_shares() {
    let (setup, _strategy, user, id) = deployed_receipt();

    let payout = setup
        .router
        .withdraw_from_strategies(&user, &id, &setup.usdc, &INITIAL_SHARES, &0);
    assert_eq!(payout, SCALE);
    assert_eq!(setup.shares.balance_of(&user), 2 * INITIAL_SHARES);

    let rest = setup.router.withdraw_shares_from_strategies(
        &user,
        &setup.usdc,
        &(2 * INITIAL_SHARES),
        &0,
    );
    assert_eq!(rest, 2 * SCALE);
    assert_eq!(setup.shares.balance_of(&user), 0);
    assert_eq!(setup.shares.total_supply(), INITIAL_SHARES);

    let overdrawn =
        setup
            .router
            .try_withdraw_shares_from_strategies(&user, &setup.usdc, &1, &0);
    assert_eq!(overdrawn, Err(Ok(Error::InsufficientShares)));
}

#[test]
fn test_strategies_exit_requires_deployment() {
    let (setup, _strategy) = Setup::with_strategy();
    setup.seed();

    let user = setup.user();
    let id = setup.router.deposit_to_batch(&user, &setup.usdc, &SCALE);

    let result = setup
        .router
        .try_withdraw_from_strategies(&user, &id, &setup.usdc, &1, &0);
    assert_eq!(result, Err(Ok(Error::ReceiptNotDeployed)));
}

#[test]
fn test_strategies_exit_limited_to_receipt() {
    let (setup, _strategy, user, id) = deployed_receipt();

    let result = setup.router.try_withdraw_from_strategies(
        &user,
        &id,
        &setup.usdc,
        &(3 * INITIAL_SHARES + 1),
        &0,
    );
    assert_eq!(result, Err(Ok(Error::ExceedsReceiptClaim)));

    let seed = setup
        .router
        .try_withdraw_from_strategies(&setup.admin, &0, &setup.usdc, &1, &0);
    assert_eq!(seed, Err(Ok(Error::SeedReceiptLocked)));
}

#[test]
fn test_short_strategy_aborts_whole_withdrawal() {
    let setup = Setup::new();
    let first = setup.add_strategy(&setup.usdc, 5_000);
    let second = setup.add_strategy(&setup.usdc, 5_000);
    setup.seed();

    let user = setup.user();
    let id = setup.router.deposit_to_batch(&user, &setup.usdc, &(9 * SCALE));
    setup.deploy();
    assert_eq!(first.balance(), 5 * SCALE);
    assert_eq!(second.balance(), 5 * SCALE);

    second.set_withdraw_limit(&0);
    let result = setup.router.try_withdraw_from_strategies(
        &user,
        &id,
        &setup.usdc,
        &(9 * INITIAL_SHARES),
        &0,
    );

    assert_eq!(result, Err(Ok(Error::InsufficientStrategyLiquidity)));
    assert_eq!(first.balance(), 5 * SCALE);
    assert_eq!(second.balance(), 5 * SCALE);
    assert_eq!(setup.balance(&setup.usdc, &user), 991 * SCALE);
    assert!(!setup.receipts.get_receipt(&id).resolved);
    assert_eq!(setup.shares.total_supply(), 10 * INITIAL_SHARES);
}

#[test]
fn test_slippage_aborts_withdrawal() {
    let (setup, strategy, user, id) = deployed_receipt();
    setup
        .exchange
        .set_rate(&setup.usdc, &setup.usdt, &98, &100);

    let result = setup.router.try_withdraw_from_strategies(
        &user,
        &id,
        &setup.usdt,
        &(3 * INITIAL_SHARES),
        &(3 * SCALE),
    );

    assert_eq!(result, Err(Ok(Error::OutputBelowMinimum)));
    assert_eq!(strategy.balance(), 4 * SCALE);
    assert_eq!(setup.balance(&setup.usdt, &user), 1_000 * SCALE);
    assert!(!setup.receipts.get_receipt(&id).resolved);

    let payout = setup.router.withdraw_from_strategies(
        &user,
        &id,
        &setup.usdt,
        &(3 * INITIAL_SHARES),
        &(29 * SCALE / 10),
    );
    assert_eq!(payout, 294 * SCALE / 100);
}

#[test]
fn test_reentrant_strategy_is_rejected() {
    let (setup, strategy, user, id) = deployed_receipt();
    strategy.set_reenter(&true);

    let result = setup.router.try_withdraw_from_strategies(
        &user,
        &id,
        &setup.usdc,
        &(3 * INITIAL_SHARES),
        &0,
    );

    assert!(result.is_err());
    assert_eq!(strategy.balance(), 4 * SCALE);
    assert!(!setup.receipts.get_receipt(&id).resolved);
}

#[test]
fn test_router_lock() {
    let setup = Setup::new();

    setup.env.as_contract(&setup.router.address, || {
        assert_eq!(Storage::lock(&setup.env), Ok(()));
        assert_eq!(Storage::lock(&setup.env), Err(Error::Reentrancy));
        Storage::unlock(&setup.env);
        assert_eq!(Storage::lock(&setup.env), Ok(()));
    });
}

#[test]
fn test_redeem_receipt_into_shares() {
    let (setup, _strategy, user, id) = deployed_receipt();

    let shares = setup.router.redeem_receipt(&user, &id);
    assert_eq!(shares, 3 * INITIAL_SHARES);
    assert_eq!(setup.shares.balance_of(&user), 3 * INITIAL_SHARES);
    assert_eq!(setup.shares.balance_of(&setup.router.address), INITIAL_SHARES);

    let again = setup.router.try_redeem_receipt(&user, &id);
    assert_eq!(again, Err(Ok(Error::ReceiptAlreadyResolved)));
}

#[test]
fn test_deployed_receipt_exits_through_batch() {
    let (setup, strategy, user, id) = deployed_receipt();

    let newcomer = setup.user();
    setup
        .router
        .deposit_to_batch(&newcomer, &setup.usdc, &(5 * SCALE));

    let payout = setup.router.withdraw_from_batching(
        &user,
        &id,
        &setup.usdc,
        &(2 * INITIAL_SHARES),
        &(2 * SCALE),
    );

    assert_eq!(payout, 2 * SCALE);
    assert_eq!(setup.shares.balance_of(&user), INITIAL_SHARES);
    assert_eq!(strategy.balance(), 4 * SCALE);
    assert_eq!(setup.router.view_batching_balance().total, 3 * SCALE);

    let cycle = setup.router.get_cycle(&setup.router.current_cycle_id());
    assert_eq!(cycle.recycled_shares, 2 * INITIAL_SHARES);

    let too_much = setup.router.try_withdraw_shares_from_batching(
        &user,
        &setup.usdc,
        &(4 * INITIAL_SHARES),
        &0,
    );
    assert_eq!(too_much, Err(Ok(Error::InsufficientShares)));

    let drained = setup.router.withdraw_shares_from_batching(
        &user,
        &setup.usdc,
        &INITIAL_SHARES,
        &0,
    );
    assert_eq!(drained, SCALE);
    assert_eq!(setup.shares.balance_of(&user), 0);
    assert_eq!(
        setup.shares.balance_of(&setup.router.address),
        4 * INITIAL_SHARES
    );
}

#[test]
fn test_batch_exit_needs_pending_liquidity() {
    let (setup, _strategy, user, id) = deployed_receipt();

    let result = setup.router.try_withdraw_from_batching(
        &user,
        &id,
        &setup.usdc,
        &INITIAL_SHARES,
        &0,
    );
    assert_eq!(result, Err(Ok(Error::InsufficientBatchLiquidity)));
}
