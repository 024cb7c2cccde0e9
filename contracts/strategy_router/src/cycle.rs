use crate::batch::Batch;
use crate::error::Error;
use crate::events::{CycleClosedEvent, FeesCollectedEvent};
use crate::ledgers::Ledgers;
use crate::pricing;
use crate::storage::{Cycle, RouterConfig, Storage, INITIAL_SHARES, WEIGHT_TOTAL};
use crate::strategies::Strategies;
use soroban_sdk::{log, Env, Map, Symbol};

/// Opens, closes and deploys cycles.
pub struct CycleController;

impl CycleController {
    pub fn open(env: &Env, cycle_id: u64) {
        Storage::set_cycle(
            env,
            &Cycle {
                id: cycle_id,
                start_at: env.ledger().timestamp(),
                total_deposited_value: 0,
                received_by_strategies: 0,
                recycled_shares: 0,
                shares_for_batch: 0,
                price_per_share: 0,
                closed: false,
            },
        );
        Storage::set_current_cycle_id(env, cycle_id);
    }

    pub fn current(env: &Env) -> Result<Cycle, Error> {
        Storage::cycle(env, Storage::current_cycle_id(env))
    }

    /// Record shares surrendered to the open batch by a cross-withdrawal
    pub fn recycle_shares(env: &Env, shares: i128) -> Result<(), Error> {
        let mut cycle = Self::current(env)?;
        cycle.recycled_shares = cycle
            .recycled_shares
            .checked_add(shares)
            .ok_or(Error::MathOverflow)?;
        Storage::set_cycle(env, &cycle);
        Ok(())
    }

    /// Close the open cycle: deploy its batch into the strategies, mint the
    /// batch's shares to the router and open the next cycle.
    pub fn deposit_to_strategies(env: &Env) -> Result<(), Error> {
        let config = Storage::config(env)?;
        let mut cycle = Self::current(env)?;

        let closable_at = cycle
            .start_at
            .checked_add(config.cycle_duration)
            .ok_or(Error::MathOverflow)?;
        if env.ledger().timestamp() < closable_at {
            return Err(Error::CycleNotClosable);
        }

        let mut cache = Map::new(env);
        let total_deposited_value = Batch::claimed_value(env, cycle.id, &mut cache)?;
        if total_deposited_value == 0 || total_deposited_value < config.min_usd_per_cycle {
            log!(env, "batch claim {} below floor", total_deposited_value);
            return Err(Error::BatchValueTooLow);
        }

        if Strategies::enabled_weight(env) != WEIGHT_TOTAL {
            return Err(Error::InvalidWeightTotal);
        }

        let total_supply = Ledgers::total_supply(env)?;
        let first_deployment = total_supply == 0;
        if first_deployment && !Storage::seed_in_batch(env) {
            return Err(Error::SeedRequired);
        }

        let value_before = Strategies::view(env, &mut cache)?.total;
        let fee_value = if first_deployment {
            0
        } else {
            Self::fee_value(env, &config, value_before)?
        };

        let holdings = Batch::drain(env);
        if !holdings.is_empty() {
            Strategies::allocate(
                env,
                holdings,
                &Strategies::deployment_targets(env),
                &mut cache,
            )?;
        }

        let value_after = Strategies::view(env, &mut cache)?.total;
        let received = (value_after - value_before).max(0);

        let (price_per_share, new_shares) = if first_deployment {
            if received == 0 {
                return Err(Error::BatchValueTooLow);
            }
            let pps = pricing::price_per_share(received, INITIAL_SHARES)
                .ok_or(Error::MathOverflow)?;
            (pps, INITIAL_SHARES)
        } else {
            let pps = pricing::price_per_share(value_before - fee_value, total_supply)
                .ok_or(Error::MathOverflow)?;
            if pps == 0 {
                return Err(Error::ZeroPricePerShare);
            }
            if fee_value > 0 {
                Self::mint_fee_shares(env, &config, value_before, fee_value, pps)?;
            }
            let shares = pricing::value_to_shares(received, pps).ok_or(Error::MathOverflow)?;
            (pps, shares)
        };

        Ledgers::mint_shares(env, &env.current_contract_address(), new_shares)?;

        cycle.total_deposited_value = total_deposited_value;
        cycle.received_by_strategies = received;
        cycle.shares_for_batch = new_shares
            .checked_add(cycle.recycled_shares)
            .ok_or(Error::MathOverflow)?;
        cycle.price_per_share = price_per_share;
        cycle.closed = true;
        Storage::set_cycle(env, &cycle);

        Storage::set_seed_in_batch(env, false);
        Storage::set_last_strategies_value(env, value_after);
        Self::open(env, cycle.id + 1);

        log!(
            env,
            "cycle {} deployed: value {} received {} shares {}",
            cycle.id,
            total_deposited_value,
            received,
            cycle.shares_for_batch
        );
        env.events().publish(
            (Symbol::new(env, "cycle_closed"), cycle.id),
            CycleClosedEvent {
                cycle_id: cycle.id,
                total_deposited_value,
                received_by_strategies: received,
                new_shares,
                recycled_shares: cycle.recycled_shares,
                price_per_share,
            },
        );

        Ok(())
    }

    /// Fee owed on strategy profit since the last deployment. Zero while no
    /// fee address is configured.
    pub fn fee_value(env: &Env, config: &RouterConfig, value_before: i128) -> Result<i128, Error> {
        if config.fee_address.is_none() {
            return Ok(0);
        }
        let profit = value_before
            .checked_sub(Storage::last_strategies_value(env))
            .ok_or(Error::MathOverflow)?;
        pricing::fee_on_profit(profit, config.fee_bps).ok_or(Error::MathOverflow)
    }

    fn mint_fee_shares(
        env: &Env,
        config: &RouterConfig,
        value_before: i128,
        fee_value: i128,
        pps: i128,
    ) -> Result<(), Error> {
        let fee_address = match &config.fee_address {
            Some(address) => address.clone(),
            None => return Ok(()),
        };

        let fee_shares = pricing::value_to_shares(fee_value, pps).ok_or(Error::MathOverflow)?;
        Ledgers::mint_shares(env, &fee_address, fee_shares)?;

        log!(env, "fee shares {} for value {}", fee_shares, fee_value);
        env.events().publish(
            (Symbol::new(env, "fees_collected"),),
            FeesCollectedEvent {
                fee_address,
                profit: value_before - Storage::last_strategies_value(env),
                fee_value,
                fee_shares,
            },
        );

        Ok(())
    }
}
