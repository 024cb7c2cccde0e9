#![no_std]

mod batch;
mod cycle;
mod error;
mod events;
mod interfaces;
mod ledgers;
mod pricing;
mod storage;
mod strategies;
mod valuation;
mod withdrawal;

#[cfg(test)]
mod test;

pub use error::Error;
pub use interfaces::{
    ExchangeClient, ExchangeInterface, OracleClient, OracleInterface, StrategyClient,
    StrategyInterface,
};
pub use storage::{
    BatchView, Cycle, RouterConfig, StrategiesView, StrategyInfo, INITIAL_SHARES, PRECISION,
    SCALE, WEIGHT_TOTAL,
};

use batch::Batch;
use cycle::CycleController;
use events::ConfigUpdatedEvent;
use ledgers::Ledgers;
use storage::{DataKey, Storage, MAX_FEE_BPS};
use strategies::Strategies;
use withdrawal::WithdrawalEngine;

use soroban_sdk::{contract, contractimpl, token, Address, Env, Map, Symbol, Vec};

/// Capital allocation router.
///
/// Deposits of supported assets collect in a batch during a cycle. Closing
/// the cycle deploys the batch across weighted strategies and mints shares
/// for it; receipts of the cycle convert into those shares pro rata. Exits go
/// either through the strategies (burning shares) or through the next batch
/// (recycling shares to its depositors).
#[contract]
pub struct StrategyRouter;

#[contractimpl]
impl StrategyRouter {
    // ============================================
    // INITIALIZATION & ADMIN
    // ============================================

    /// Initialize the router and open cycle 0
    ///
    /// The router must be registered as operator on both ledgers before the
    /// first deposit.
    ///
    /// # Errors
    /// - `AlreadyInitialized`: Contract already initialized
    /// - `InvalidAmount`: Negative minimum batch value
    #[allow(clippy::too_many_arguments)]
    pub fn initialize(
        env: Env,
        admin: Address,
        shares_token: Address,
        receipt_nft: Address,
        oracle: Address,
        exchange: Address,
        cycle_duration: u64,
        min_usd_per_cycle: i128,
    ) -> Result<(), Error> {
        if env.storage().instance().has(&DataKey::Initialized) {
            return Err(Error::AlreadyInitialized);
        }

        admin.require_auth();

        if min_usd_per_cycle < 0 {
            return Err(Error::InvalidAmount);
        }

        env.storage().instance().set(&DataKey::Initialized, &true);
        env.storage().instance().set(&DataKey::Admin, &admin);
        env.storage()
            .instance()
            .set(&DataKey::SharesToken, &shares_token);
        env.storage()
            .instance()
            .set(&DataKey::ReceiptNft, &receipt_nft);
        env.storage().instance().set(&DataKey::Oracle, &oracle);
        env.storage().instance().set(&DataKey::Exchange, &exchange);
        env.storage().instance().set(&DataKey::Paused, &false);

        Storage::set_config(
            &env,
            &RouterConfig {
                cycle_duration,
                min_usd_per_cycle,
                fee_bps: 0,
                fee_address: None,
            },
        );
        CycleController::open(&env, 0);

        Ok(())
    }

    /// Pause deposits, deployments and withdrawals
    pub fn pause(env: Env) -> Result<(), Error> {
        Storage::require_admin(&env)?;
        env.storage().instance().set(&DataKey::Paused, &true);
        Ok(())
    }

    pub fn unpause(env: Env) -> Result<(), Error> {
        Storage::require_admin(&env)?;
        env.storage().instance().set(&DataKey::Paused, &false);
        Ok(())
    }

    pub fn set_cycle_duration(env: Env, cycle_duration: u64) -> Result<(), Error> {
        Self::update_config(&env, |config| {
            config.cycle_duration = cycle_duration;
            Ok(())
        })
    }

    /// # Errors
    /// - `InvalidAmount`: Negative value
    pub fn set_min_usd_per_cycle(env: Env, min_usd_per_cycle: i128) -> Result<(), Error> {
        Self::update_config(&env, |config| {
            if min_usd_per_cycle < 0 {
                return Err(Error::InvalidAmount);
            }
            config.min_usd_per_cycle = min_usd_per_cycle;
            Ok(())
        })
    }

    /// # Errors
    /// - `InvalidFeePercent`: Above MAX_FEE_BPS
    pub fn set_fee_percent(env: Env, fee_bps: u32) -> Result<(), Error> {
        Self::update_config(&env, |config| {
            if fee_bps > MAX_FEE_BPS {
                return Err(Error::InvalidFeePercent);
            }
            config.fee_bps = fee_bps;
            Ok(())
        })
    }

    pub fn set_fee_address(env: Env, fee_address: Address) -> Result<(), Error> {
        Self::update_config(&env, |config| {
            config.fee_address = Some(fee_address);
            Ok(())
        })
    }

    pub fn set_oracle(env: Env, oracle: Address) -> Result<(), Error> {
        Storage::require_admin(&env)?;
        env.storage().instance().set(&DataKey::Oracle, &oracle);
        Ok(())
    }

    pub fn set_exchange(env: Env, exchange: Address) -> Result<(), Error> {
        Storage::require_admin(&env)?;
        env.storage().instance().set(&DataKey::Exchange, &exchange);
        Ok(())
    }

    /// List or delist an asset for deposits and payouts
    ///
    /// # Errors
    /// - `AssetInUse`: Asset still has batch balance or backs a strategy
    pub fn set_supported_asset(env: Env, asset: Address, supported: bool) -> Result<(), Error> {
        Storage::require_admin(&env)?;

        let mut assets = Storage::supported_assets(&env);
        let position = assets.first_index_of(&asset);

        match (supported, position) {
            (true, None) => {
                let decimals = token::Client::new(&env, &asset).decimals();
                Storage::set_asset_decimals(&env, &asset, decimals);
                assets.push_back(asset);
            }
            (false, Some(index)) => {
                let entry = Storage::batch_entry(&env, &asset);
                let backs_strategy = Storage::strategies(&env)
                    .iter()
                    .any(|info| info.deposit_token == asset);
                if entry.pending != 0 || entry.claimed != 0 || backs_strategy {
                    return Err(Error::AssetInUse);
                }
                assets.remove(index);
            }
            _ => return Ok(()),
        }

        Storage::set_supported_assets(&env, &assets);
        Ok(())
    }

    // ============================================
    // STRATEGY REGISTRY
    // ============================================

    /// Register a strategy adapter, enabled, and return its index
    ///
    /// # Errors
    /// - `InvalidWeight`: Weight outside 1..=WEIGHT_TOTAL
    /// - `StrategyExists`: Adapter already registered
    /// - `UnsupportedAsset`: Adapter's deposit token is not supported
    pub fn add_strategy(env: Env, strategy: Address, weight: u32) -> Result<u32, Error> {
        Storage::require_admin(&env)?;
        Self::guarded(&env, false, || Strategies::add(&env, strategy, weight))
    }

    pub fn update_strategy_weight(env: Env, index: u32, weight: u32) -> Result<(), Error> {
        Storage::require_admin(&env)?;
        Self::guarded(&env, false, || Strategies::update_weight(&env, index, weight))
    }

    pub fn set_strategy_enabled(env: Env, index: u32, enabled: bool) -> Result<(), Error> {
        Storage::require_admin(&env)?;
        Self::guarded(&env, false, || Strategies::set_enabled(&env, index, enabled))
    }

    /// Withdraw a strategy's capital into the remaining enabled strategies
    /// and drop it from the registry. Later indexes shift down by one.
    pub fn remove_strategy(env: Env, index: u32) -> Result<(), Error> {
        Storage::require_admin(&env)?;
        Self::guarded(&env, false, || Strategies::remove(&env, index))
    }

    /// Migrate deployed capital to match the current weights
    pub fn rebalance_strategies(env: Env) -> Result<(), Error> {
        Storage::require_admin(&env)?;
        Self::guarded(&env, false, || Strategies::rebalance(&env))
    }

    // ============================================
    // BATCH & CYCLES
    // ============================================

    /// Deposit into the open batch. Returns the receipt id.
    ///
    /// # Errors
    /// - `ContractPaused`: Contract is paused
    /// - `InvalidAmount`: Amount <= 0
    /// - `UnsupportedAsset`: Asset not listed
    pub fn deposit_to_batch(
        env: Env,
        user: Address,
        asset: Address,
        amount: i128,
    ) -> Result<u64, Error> {
        user.require_auth();
        Self::guarded(&env, true, || {
            Batch::deposit(&env, &user, &user, &asset, amount)
        })
    }

    /// Admin deposit whose receipt the router keeps forever. The first
    /// deployment requires one in its batch.
    pub fn seed_deposit(env: Env, asset: Address, amount: i128) -> Result<u64, Error> {
        let admin = Storage::require_admin(&env)?;
        Self::guarded(&env, true, || {
            let router = env.current_contract_address();
            let receipt_id = Batch::deposit(&env, &router, &admin, &asset, amount)?;
            Storage::set_seed_in_batch(&env, true);
            Ok(receipt_id)
        })
    }

    /// Deploy the open batch and start the next cycle. Permissionless.
    ///
    /// # Errors
    /// - `CycleNotClosable`: Cycle duration has not elapsed
    /// - `BatchValueTooLow`: Claim below the minimum, or nothing received
    /// - `InvalidWeightTotal`: Enabled weights do not sum to WEIGHT_TOTAL
    /// - `SeedRequired`: First deployment without a seed receipt
    pub fn deposit_to_strategies(env: Env) -> Result<(), Error> {
        Self::guarded(&env, true, || CycleController::deposit_to_strategies(&env))
    }

    /// Harvest and reinvest rewards in every strategy. Permissionless.
    pub fn compound_all(env: Env) -> Result<(), Error> {
        Self::guarded(&env, true, || Strategies::compound_all(&env))
    }

    // ============================================
    // WITHDRAWALS
    // ============================================

    /// Exit a receipt through the batch; see `WithdrawalEngine`
    ///
    /// # Errors
    /// - `ExceedsReceiptClaim`: More than the receipt's amount or shares
    /// - `InsufficientBatchLiquidity`: Batch cannot cover the request
    /// - `OutputBelowMinimum`: Payout under `min_output`
    /// - `SeedReceiptLocked`: Seed receipts never exit
    pub fn withdraw_from_batching(
        env: Env,
        user: Address,
        receipt_id: u64,
        output_asset: Address,
        amount: i128,
        min_output: i128,
    ) -> Result<i128, Error> {
        user.require_auth();
        Self::guarded(&env, true, || {
            WithdrawalEngine::withdraw_from_batching(
                &env,
                &user,
                receipt_id,
                &output_asset,
                amount,
                min_output,
            )
        })
    }

    /// Exit a deployed receipt through the strategies
    ///
    /// # Errors
    /// - `ReceiptNotDeployed`: Receipt's cycle is still open
    /// - `ExceedsReceiptClaim`: More shares than the receipt converts into
    /// - `InsufficientStrategyLiquidity`: A strategy paid short
    /// - `OutputBelowMinimum`: Payout under `min_output`
    pub fn withdraw_from_strategies(
        env: Env,
        user: Address,
        receipt_id: u64,
        output_asset: Address,
        shares: i128,
        min_output: i128,
    ) -> Result<i128, Error> {
        user.require_auth();
        Self::guarded(&env, true, || {
            WithdrawalEngine::withdraw_from_strategies(
                &env,
                &user,
                receipt_id,
                &output_asset,
                shares,
                min_output,
            )
        })
    }

    /// Turn a deployed receipt into shares held by the user
    pub fn redeem_receipt(env: Env, user: Address, receipt_id: u64) -> Result<i128, Error> {
        user.require_auth();
        Self::guarded(&env, true, || {
            WithdrawalEngine::redeem_receipt(&env, &user, receipt_id)
        })
    }

    pub fn withdraw_shares_from_strategies(
        env: Env,
        user: Address,
        output_asset: Address,
        shares: i128,
        min_output: i128,
    ) -> Result<i128, Error> {
        user.require_auth();
        Self::guarded(&env, true, || {
            WithdrawalEngine::withdraw_shares_from_strategies(
                &env,
                &user,
                &output_asset,
                shares,
                min_output,
            )
        })
    }

    pub fn withdraw_shares_from_batching(
        env: Env,
        user: Address,
        output_asset: Address,
        shares: i128,
        min_output: i128,
    ) -> Result<i128, Error> {
        user.require_auth();
        Self::guarded(&env, true, || {
            WithdrawalEngine::withdraw_shares_from_batching(
                &env,
                &user,
                &output_asset,
                shares,
                min_output,
            )
        })
    }

    // ============================================
    // VIEW FUNCTIONS
    // ============================================

    pub fn view_batching_balance(env: Env) -> Result<BatchView, Error> {
        Batch::view(&env, &mut Map::new(&env))
    }

    pub fn view_strategies_balance(env: Env) -> Result<StrategiesView, Error> {
        Strategies::view(&env, &mut Map::new(&env))
    }

    pub fn receipt_to_shares(env: Env, receipt_id: u64) -> Result<i128, Error> {
        WithdrawalEngine::receipt_to_shares(&env, receipt_id)
    }

    /// USD value (SCALE) of `shares`
    pub fn shares_to_amount(env: Env, shares: i128) -> Result<i128, Error> {
        WithdrawalEngine::shares_to_amount(&env, shares)
    }

    /// Ids of `user`'s unresolved receipts
    pub fn receipts_of(env: Env, user: Address) -> Result<Vec<u64>, Error> {
        Ledgers::receipts_of(&env, &user)
    }

    pub fn price_per_share(env: Env) -> Result<i128, Error> {
        WithdrawalEngine::price_per_share(&env)
    }

    pub fn get_cycle(env: Env, cycle_id: u64) -> Result<Cycle, Error> {
        Storage::cycle(&env, cycle_id)
    }

    pub fn current_cycle_id(env: Env) -> u64 {
        Storage::current_cycle_id(&env)
    }

    pub fn get_config(env: Env) -> Result<RouterConfig, Error> {
        Storage::config(&env)
    }

    pub fn supported_assets(env: Env) -> Vec<Address> {
        Storage::supported_assets(&env)
    }

    pub fn get_strategies(env: Env) -> Vec<StrategyInfo> {
        Storage::strategies(&env)
    }

    pub fn is_paused(env: Env) -> bool {
        Storage::check_not_paused(&env).is_err()
    }
}

impl StrategyRouter {
    fn update_config(
        env: &Env,
        apply: impl FnOnce(&mut RouterConfig) -> Result<(), Error>,
    ) -> Result<(), Error> {
        Storage::require_admin(env)?;

        let mut config = Storage::config(env)?;
        apply(&mut config)?;
        Storage::set_config(env, &config);

        env.events().publish(
            (Symbol::new(env, "config_updated"),),
            ConfigUpdatedEvent {
                cycle_duration: config.cycle_duration,
                min_usd_per_cycle: config.min_usd_per_cycle,
                fee_bps: config.fee_bps,
            },
        );

        Ok(())
    }

    /// Run `op` under the router lock, optionally refusing while paused
    fn guarded<T>(
        env: &Env,
        pausable: bool,
        op: impl FnOnce() -> Result<T, Error>,
    ) -> Result<T, Error> {
        if pausable {
            Storage::check_not_paused(env)?;
        }
        Storage::lock(env)?;
        let result = op()?;
        Storage::unlock(env);
        Ok(result)
    }
}
