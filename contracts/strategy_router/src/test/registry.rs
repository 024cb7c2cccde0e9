use super::{MockStrategy, MockStrategyClient, Setup};
use crate::{Error, SCALE, WEIGHT_TOTAL};

#[test]
fn test_add_strategy_validates() {
    let setup = Setup::new();
    let strategy = setup.add_strategy(&setup.usdc, 7_000);

    let registered = setup.router.get_strategies();
    assert_eq!(registered.len(), 1);
    let info = registered.get(0).unwrap();
    assert_eq!(info.strategy, strategy.address);
    assert_eq!(info.deposit_token, setup.usdc);
    assert_eq!(info.weight, 7_000);
    assert!(info.enabled);

    let duplicate = setup.router.try_add_strategy(&strategy.address, &3_000);
    assert_eq!(duplicate, Err(Ok(Error::StrategyExists)));

    let other = MockStrategyClient::new(
        &setup.env,
        &setup.env.register_contract(None, MockStrategy),
    );
    other.init(&setup.router.address, &setup.usdt);
    let zero = setup.router.try_add_strategy(&other.address, &0);
    assert_eq!(zero, Err(Ok(Error::InvalidWeight)));
    let over = setup
        .router
        .try_add_strategy(&other.address, &(WEIGHT_TOTAL + 1));
    assert_eq!(over, Err(Ok(Error::InvalidWeight)));

    let foreign = setup
        .env
        .register_stellar_asset_contract_v2(setup.admin.clone())
        .address();
    let unlisted = MockStrategyClient::new(
        &setup.env,
        &setup.env.register_contract(None, MockStrategy),
    );
    unlisted.init(&setup.router.address, &foreign);
    let unsupported = setup.router.try_add_strategy(&unlisted.address, &3_000);
    assert_eq!(unsupported, Err(Ok(Error::UnsupportedAsset)));

    let missing = setup.router.try_update_strategy_weight(&5, &1_000);
    assert_eq!(missing, Err(Ok(Error::StrategyNotFound)));
}

#[test]
fn test_weight_change_affects_next_deployment_then_rebalance() {
    let setup = Setup::new();
    let first = setup.add_strategy(&setup.usdc, 5_000);
    let second = setup.add_strategy(&setup.usdc, 5_000);
    setup.seed();

    let user = setup.user();
    setup.router.deposit_to_batch(&user, &setup.usdc, &(9 * SCALE));
    setup.deploy();
    assert_eq!(first.balance(), 5 * SCALE);
    assert_eq!(second.balance(), 5 * SCALE);

    setup.router.update_strategy_weight(&0, &8_000);
    setup.router.update_strategy_weight(&1, &2_000);
    assert_eq!(first.balance(), 5 * SCALE);

    setup.router.deposit_to_batch(&user, &setup.usdc, &(10 * SCALE));
    setup.deploy();
    assert_eq!(first.balance(), 13 * SCALE);
    assert_eq!(second.balance(), 7 * SCALE);

    let pps = setup.router.price_per_share();
    setup.router.rebalance_strategies();
    assert_eq!(first.balance(), 16 * SCALE);
    assert_eq!(second.balance(), 4 * SCALE);
    assert_eq!(setup.router.price_per_share(), pps);
}

#[test]
fn test_disabled_strategy_is_skipped() {
    let setup = Setup::new();
    let first = setup.add_strategy(&setup.usdc, 5_000);
    let second = setup.add_strategy(&setup.usdc, 5_000);

    setup.router.set_strategy_enabled(&1, &false);
    setup.router.seed_deposit(&setup.usdc, &SCALE);
    setup.advance();
    let incomplete = setup.router.try_deposit_to_strategies();
    assert_eq!(incomplete, Err(Ok(Error::InvalidWeightTotal)));

    setup.router.update_strategy_weight(&0, &WEIGHT_TOTAL);
    setup.router.deposit_to_strategies();
    assert_eq!(first.balance(), SCALE);
    assert_eq!(second.balance(), 0);
    assert!(!setup.router.get_strategies().get(1).unwrap().enabled);
}

#[test]
fn test_remove_strategy_migrates_capital() {
    let setup = Setup::new();
    let first = setup.add_strategy(&setup.usdc, 5_000);
    let second = setup.add_strategy(&setup.usdc, 5_000);
    setup.seed();

    let user = setup.user();
    setup.router.deposit_to_batch(&user, &setup.usdc, &(9 * SCALE));
    setup.deploy();

    let pps = setup.router.price_per_share();
    setup.router.remove_strategy(&1);

    assert_eq!(second.balance(), 0);
    assert_eq!(first.balance(), 10 * SCALE);
    assert_eq!(setup.router.get_strategies().len(), 1);
    assert_eq!(setup.router.price_per_share(), pps);

    let missing = setup.router.try_remove_strategy(&1);
    assert_eq!(missing, Err(Ok(Error::StrategyNotFound)));
}

#[test]
fn test_remove_last_strategy_with_capital() {
    let (setup, _strategy) = Setup::with_strategy();
    setup.seed();

    let result = setup.router.try_remove_strategy(&0);
    assert_eq!(result, Err(Ok(Error::NoStrategies)));
}

#[test]
fn test_delisting_asset_in_use() {
    let setup = Setup::new();
    setup.add_strategy(&setup.usdc, WEIGHT_TOTAL);
    let user = setup.user();

    let backing = setup.router.try_set_supported_asset(&setup.usdc, &false);
    assert_eq!(backing, Err(Ok(Error::AssetInUse)));

    setup.router.deposit_to_batch(&user, &setup.usdt, &SCALE);
    let pending = setup.router.try_set_supported_asset(&setup.usdt, &false);
    assert_eq!(pending, Err(Ok(Error::AssetInUse)));

    setup
        .router
        .withdraw_from_batching(&user, &0, &setup.usdt, &SCALE, &0);
    setup.router.set_supported_asset(&setup.usdt, &false);
    assert_eq!(setup.router.supported_assets().len(), 1);
}
