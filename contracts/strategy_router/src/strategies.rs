use crate::error::Error;
use crate::events::{
    CompoundEvent, RebalancedEvent, StrategyAddedEvent, StrategyRemovedEvent,
    StrategyUpdatedEvent,
};
use crate::interfaces::StrategyClient;
use crate::pricing;
use crate::storage::{
    Quote, StrategiesView, StrategyBalance, StrategyInfo, Storage, DUST_VALUE, WEIGHT_TOTAL,
};
use crate::valuation::Valuation;
use soroban_sdk::{log, token, Address, Env, Map, Symbol, Vec};

/// Strategy registry and every movement of capital in and out of adapters.
pub struct Strategies;

impl Strategies {
    // ============================================
    // REGISTRY
    // ============================================

    pub fn add(env: &Env, strategy: Address, weight: u32) -> Result<u32, Error> {
        Self::check_weight(weight)?;

        let mut strategies = Storage::strategies(env);
        if strategies.iter().any(|info| info.strategy == strategy) {
            return Err(Error::StrategyExists);
        }

        let deposit_token = match StrategyClient::new(env, &strategy).try_deposit_token() {
            Ok(Ok(token)) => token,
            _ => return Err(Error::StrategyCallFailed),
        };
        if !Storage::is_supported(env, &deposit_token) {
            return Err(Error::UnsupportedAsset);
        }

        let index = strategies.len();
        strategies.push_back(StrategyInfo {
            strategy: strategy.clone(),
            deposit_token: deposit_token.clone(),
            weight,
            enabled: true,
        });
        Storage::set_strategies(env, &strategies);

        env.events().publish(
            (Symbol::new(env, "strategy_added"), index),
            StrategyAddedEvent {
                index,
                strategy,
                deposit_token,
                weight,
            },
        );

        Ok(index)
    }

    /// Takes effect at the next deployment; deployed capital stays put
    /// until `rebalance`.
    pub fn update_weight(env: &Env, index: u32, weight: u32) -> Result<(), Error> {
        Self::check_weight(weight)?;

        let mut info = Self::get(env, index)?;
        info.weight = weight;
        Self::put(env, index, &info);

        Ok(())
    }

    pub fn set_enabled(env: &Env, index: u32, enabled: bool) -> Result<(), Error> {
        let mut info = Self::get(env, index)?;
        info.enabled = enabled;
        Self::put(env, index, &info);

        Ok(())
    }

    pub fn get(env: &Env, index: u32) -> Result<StrategyInfo, Error> {
        Storage::strategies(env)
            .get(index)
            .ok_or(Error::StrategyNotFound)
    }

    fn put(env: &Env, index: u32, info: &StrategyInfo) {
        let mut strategies = Storage::strategies(env);
        strategies.set(index, info.clone());
        Storage::set_strategies(env, &strategies);

        env.events().publish(
            (Symbol::new(env, "strategy_updated"), index),
            StrategyUpdatedEvent {
                index,
                weight: info.weight,
                enabled: info.enabled,
            },
        );
    }

    fn check_weight(weight: u32) -> Result<(), Error> {
        if weight == 0 || weight > WEIGHT_TOTAL {
            return Err(Error::InvalidWeight);
        }
        Ok(())
    }

    /// Sum of weights of enabled strategies
    pub fn enabled_weight(env: &Env) -> u32 {
        Storage::strategies(env)
            .iter()
            .filter(|info| info.enabled)
            .map(|info| info.weight)
            .sum()
    }

    /// (index, weight) of every enabled strategy, in registry order
    pub fn deployment_targets(env: &Env) -> Vec<(u32, i128)> {
        let mut targets = Vec::new(env);
        for (index, info) in Storage::strategies(env).iter().enumerate() {
            if info.enabled {
                targets.push_back((index as u32, info.weight as i128));
            }
        }
        targets
    }

    // ============================================
    // VALUATION
    // ============================================

    /// Position and USD value of every registered strategy, index-aligned
    /// with the registry
    pub fn view(env: &Env, cache: &mut Map<Address, Quote>) -> Result<StrategiesView, Error> {
        let mut total = 0i128;
        let mut balances = Vec::new(env);

        for info in Storage::strategies(env).iter() {
            let amount = Self::balance_of(env, &info)?;
            let value = if amount > 0 {
                let quote = Valuation::cached_quote(env, cache, &info.deposit_token)?;
                Valuation::to_value(amount, &quote)?
            } else {
                0
            };

            total = total.checked_add(value).ok_or(Error::MathOverflow)?;
            balances.push_back(StrategyBalance {
                strategy: info.strategy,
                token: info.deposit_token,
                amount,
                value,
            });
        }

        Ok(StrategiesView {
            total,
            strategies: balances,
        })
    }

    fn balance_of(env: &Env, info: &StrategyInfo) -> Result<i128, Error> {
        match StrategyClient::new(env, &info.strategy).try_balance() {
            Ok(Ok(amount)) if amount >= 0 => Ok(amount),
            _ => Err(Error::StrategyCallFailed),
        }
    }

    // ============================================
    // CAPITAL MOVEMENT
    // ============================================

    fn deposit(env: &Env, info: &StrategyInfo, amount: i128) -> Result<(), Error> {
        if amount == 0 {
            return Ok(());
        }

        token::Client::new(env, &info.deposit_token).transfer(
            &env.current_contract_address(),
            &info.strategy,
            &amount,
        );
        match StrategyClient::new(env, &info.strategy).try_deposit(&amount) {
            Ok(Ok(())) => Ok(()),
            _ => Err(Error::StrategyCallFailed),
        }
    }

    /// Pull exactly `amount` of the deposit token back from a strategy.
    ///
    /// Measured on the router's token balance; a short payment fails with
    /// `InsufficientStrategyLiquidity`.
    fn withdraw(env: &Env, info: &StrategyInfo, amount: i128) -> Result<i128, Error> {
        let router = env.current_contract_address();
        let token = token::Client::new(env, &info.deposit_token);
        let balance_before = token.balance(&router);

        match StrategyClient::new(env, &info.strategy).try_withdraw(&amount) {
            Ok(Ok(_)) => {}
            _ => return Err(Error::StrategyCallFailed),
        }

        let received = token
            .balance(&router)
            .checked_sub(balance_before)
            .ok_or(Error::MathOverflow)?;
        if received < amount {
            log!(env, "strategy paid {} of {}", received, amount);
            return Err(Error::InsufficientStrategyLiquidity);
        }

        Ok(received)
    }

    /// Distribute `holdings` (asset -> amount held by the router) across
    /// `targets` (index, weight).
    ///
    /// Each target is filled with its deposit token first, then with other
    /// assets converted through the exchange. The last target takes every
    /// remaining unit, except swaps worth `DUST_VALUE` or less, which stay
    /// with the router.
    pub fn allocate(
        env: &Env,
        holdings: Map<Address, i128>,
        targets: &Vec<(u32, i128)>,
        cache: &mut Map<Address, Quote>,
    ) -> Result<(), Error> {
        if targets.is_empty() {
            return Err(Error::NoStrategies);
        }

        let mut holdings = holdings;
        let strategies = Storage::strategies(env);

        let mut total_value = 0i128;
        for (asset, amount) in holdings.iter() {
            let quote = Valuation::cached_quote(env, cache, &asset)?;
            total_value = total_value
                .checked_add(Valuation::to_value(amount, &quote)?)
                .ok_or(Error::MathOverflow)?;
        }

        let mut weight_sum = 0i128;
        for (_, weight) in targets.iter() {
            weight_sum = weight_sum.checked_add(weight).ok_or(Error::MathOverflow)?;
        }
        if weight_sum <= 0 {
            return Err(Error::NoStrategies);
        }

        let last = targets.len() - 1;
        for (position, (index, weight)) in targets.iter().enumerate() {
            let info = strategies.get(index).ok_or(Error::StrategyNotFound)?;
            let is_last = position as u32 == last;
            let mut wanted =
                pricing::proportional(total_value, weight, weight_sum).ok_or(Error::MathOverflow)?;

            let mut order = Vec::new(env);
            order.push_back(info.deposit_token.clone());
            for asset in holdings.keys().iter() {
                if asset != info.deposit_token {
                    order.push_back(asset);
                }
            }

            let mut deposit_amount = 0i128;
            for asset in order.iter() {
                let held = holdings.get(asset.clone()).unwrap_or(0);
                if held <= 0 {
                    continue;
                }

                let take = if is_last {
                    held
                } else {
                    if wanted <= 0 {
                        break;
                    }
                    let quote = Valuation::cached_quote(env, cache, &asset)?;
                    let amount = Valuation::to_amount(wanted, &quote)?.min(held);
                    wanted = wanted
                        .checked_sub(Valuation::to_value(amount, &quote)?)
                        .ok_or(Error::MathOverflow)?;
                    amount
                };
                if take == 0 {
                    continue;
                }
                // a swap this small can round to nothing; the router keeps it
                if asset != info.deposit_token {
                    let quote = Valuation::cached_quote(env, cache, &asset)?;
                    if Valuation::to_value(take, &quote)? <= DUST_VALUE {
                        log!(env, "keeping dust {} instead of swapping", take);
                        continue;
                    }
                }

                holdings.set(asset.clone(), held - take);
                let converted = Valuation::convert(env, take, &asset, &info.deposit_token)?;
                deposit_amount = deposit_amount
                    .checked_add(converted)
                    .ok_or(Error::MathOverflow)?;
            }

            Self::deposit(env, &info, deposit_amount)?;
        }

        Ok(())
    }

    /// Pull `value` out of the strategies, each supplying its proportional
    /// part in its own token. Returns the tokens now held by the router.
    pub fn withdraw_value(
        env: &Env,
        value: i128,
        view: &StrategiesView,
    ) -> Result<Map<Address, i128>, Error> {
        if value > view.total {
            return Err(Error::InsufficientStrategyLiquidity);
        }

        let strategies = Storage::strategies(env);
        let mut holdings: Map<Address, i128> = Map::new(env);

        for (index, balance) in view.strategies.iter().enumerate() {
            if balance.value == 0 {
                continue;
            }
            let amount = pricing::proportional(balance.amount, value, view.total)
                .ok_or(Error::MathOverflow)?;
            if amount == 0 {
                continue;
            }

            let info = strategies
                .get(index as u32)
                .ok_or(Error::StrategyNotFound)?;
            let received = Self::withdraw(env, &info, amount)?;

            let held = holdings.get(info.deposit_token.clone()).unwrap_or(0);
            holdings.set(
                info.deposit_token,
                held.checked_add(received).ok_or(Error::MathOverflow)?,
            );
        }

        Ok(holdings)
    }

    pub fn compound_all(env: &Env) -> Result<(), Error> {
        let strategies = Storage::strategies(env);
        if strategies.is_empty() {
            return Err(Error::NoStrategies);
        }

        let mut cache = Map::new(env);
        let value_before = Self::view(env, &mut cache)?.total;

        for info in strategies.iter() {
            match StrategyClient::new(env, &info.strategy).try_harvest_and_compound() {
                Ok(Ok(())) => {}
                _ => return Err(Error::StrategyCallFailed),
            }
        }

        let value_after = Self::view(env, &mut cache)?.total;
        if value_after < value_before {
            log!(env, "compound lowered value: {} -> {}", value_before, value_after);
            return Err(Error::ValueDecreased);
        }

        log!(env, "compounded: {} -> {}", value_before, value_after);
        env.events().publish(
            (Symbol::new(env, "compound"),),
            CompoundEvent {
                value_before,
                value_after,
            },
        );

        Ok(())
    }

    /// Withdraw a strategy's whole position and spread it over the remaining
    /// enabled strategies by weight.
    pub fn remove(env: &Env, index: u32) -> Result<(), Error> {
        let info = Self::get(env, index)?;
        let mut cache = Map::new(env);
        let value_before = Self::view(env, &mut cache)?.total;

        let amount = Self::balance_of(env, &info)?;
        let received = if amount > 0 {
            Self::withdraw(env, &info, amount)?
        } else {
            0
        };

        let mut strategies = Storage::strategies(env);
        strategies.remove(index);
        Storage::set_strategies(env, &strategies);

        let mut migrated_value = 0i128;
        if received > 0 {
            let quote = Valuation::cached_quote(env, &mut cache, &info.deposit_token)?;
            migrated_value = Valuation::to_value(received, &quote)?;

            let mut holdings = Map::new(env);
            holdings.set(info.deposit_token.clone(), received);
            Self::allocate(env, holdings, &Self::deployment_targets(env), &mut cache)?;
        }

        let value_after = Self::view(env, &mut cache)?.total;
        Self::absorb_loss(env, value_before, value_after)?;

        log!(env, "strategy removed, migrated {}", migrated_value);
        env.events().publish(
            (Symbol::new(env, "strategy_removed"), index),
            StrategyRemovedEvent {
                strategy: info.strategy,
                migrated_value,
            },
        );

        Ok(())
    }

    /// Move deployed capital so each strategy's value matches its weight.
    ///
    /// Strategies above target give back their excess in their own token,
    /// which is then allocated over the strategies below target in
    /// proportion to their shortfall. Disabled strategies have a target of 0.
    pub fn rebalance(env: &Env) -> Result<(), Error> {
        let weight_total = Self::enabled_weight(env) as i128;
        if weight_total == 0 {
            return Err(Error::NoStrategies);
        }

        let strategies = Storage::strategies(env);
        let mut cache = Map::new(env);
        let view = Self::view(env, &mut cache)?;

        let mut holdings: Map<Address, i128> = Map::new(env);
        let mut shortfalls: Vec<(u32, i128)> = Vec::new(env);

        for (index, info) in strategies.iter().enumerate() {
            let balance = view
                .strategies
                .get(index as u32)
                .ok_or(Error::StrategyNotFound)?;
            let target = if info.enabled {
                pricing::proportional(view.total, info.weight as i128, weight_total)
                    .ok_or(Error::MathOverflow)?
            } else {
                0
            };

            if balance.value > target {
                let amount = if target == 0 {
                    balance.amount
                } else {
                    let quote = Valuation::cached_quote(env, &mut cache, &info.deposit_token)?;
                    Valuation::to_amount(balance.value - target, &quote)?.min(balance.amount)
                };
                if amount > 0 {
                    let received = Self::withdraw(env, &info, amount)?;
                    let held = holdings.get(info.deposit_token.clone()).unwrap_or(0);
                    holdings.set(
                        info.deposit_token,
                        held.checked_add(received).ok_or(Error::MathOverflow)?,
                    );
                }
            } else if target > balance.value {
                shortfalls.push_back((index as u32, target - balance.value));
            }
        }

        if !holdings.is_empty() {
            let targets = if shortfalls.is_empty() {
                Self::deployment_targets(env)
            } else {
                shortfalls
            };
            Self::allocate(env, holdings, &targets, &mut cache)?;
        }

        let value_after = Self::view(env, &mut cache)?.total;
        Self::absorb_loss(env, view.total, value_after)?;

        log!(env, "rebalanced: {} -> {}", view.total, value_after);
        env.events().publish(
            (Symbol::new(env, "rebalanced"),),
            RebalancedEvent {
                value_before: view.total,
                value_after,
            },
        );

        Ok(())
    }

    /// Conversion losses from migrating capital are not profit to recover:
    /// lower the fee baseline by the value lost.
    fn absorb_loss(env: &Env, value_before: i128, value_after: i128) -> Result<(), Error> {
        if value_after >= value_before {
            return Ok(());
        }
        let loss = value_before - value_after;
        let baseline = Storage::last_strategies_value(env)
            .checked_sub(loss)
            .ok_or(Error::MathOverflow)?;
        Storage::set_last_strategies_value(env, baseline.max(0));
        Ok(())
    }
}
