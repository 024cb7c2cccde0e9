use crate::batch::Batch;
use crate::cycle::CycleController;
use crate::error::Error;
use crate::events::{BatchWithdrawEvent, ReceiptRedeemedEvent, StrategyWithdrawEvent};
use crate::ledgers::Ledgers;
use crate::pricing;
use crate::storage::{Quote, Receipt, Storage};
use crate::strategies::Strategies;
use crate::valuation::Valuation;
use soroban_sdk::{log, token, Address, Env, Map, Symbol};

/// Exits from the batch and from the strategies, by receipt or by free
/// share balance.
pub struct WithdrawalEngine;

impl WithdrawalEngine {
    // ============================================
    // CONVERSIONS
    // ============================================

    /// Shares a deployed receipt converts into
    pub fn receipt_shares(env: &Env, receipt: &Receipt) -> Result<i128, Error> {
        let cycle = Storage::cycle(env, receipt.cycle_id)?;
        if !cycle.closed {
            return Err(Error::ReceiptNotDeployed);
        }
        if cycle.total_deposited_value == 0 {
            return Ok(0);
        }

        let quote = Storage::cycle_quote(env, cycle.id, &receipt.asset)?;
        let value = Valuation::to_value(receipt.amount, &quote)?;
        pricing::proportional(value, cycle.shares_for_batch, cycle.total_deposited_value)
            .ok_or(Error::MathOverflow)
    }

    pub fn receipt_to_shares(env: &Env, receipt_id: u64) -> Result<i128, Error> {
        let receipt = Ledgers::receipt(env, receipt_id)?;
        if receipt.resolved {
            return Err(Error::ReceiptAlreadyResolved);
        }
        Self::receipt_shares(env, &receipt)
    }

    pub fn price_per_share(env: &Env) -> Result<i128, Error> {
        Self::current_price(env, &mut Map::new(env))
    }

    /// USD value of `shares` at the current price-per-share
    pub fn shares_to_amount(env: &Env, shares: i128) -> Result<i128, Error> {
        let pps = Self::price_per_share(env)?;
        pricing::shares_to_value(shares, pps).ok_or(Error::MathOverflow)
    }

    fn current_price(env: &Env, cache: &mut Map<Address, Quote>) -> Result<i128, Error> {
        let value = Strategies::view(env, cache)?.total;
        let supply = Ledgers::total_supply(env)?;
        pricing::price_per_share(value, supply).ok_or(Error::MathOverflow)
    }

    // ============================================
    // RECEIPT EXITS
    // ============================================

    /// Exit through the batch.
    ///
    /// For a pending receipt `amount` is a token amount refunded from the
    /// batch; any remainder is re-issued as a change receipt. For a deployed
    /// receipt `amount` is a share amount paid out of the batch's pending
    /// assets, the shares going to the open cycle's depositors.
    pub fn withdraw_from_batching(
        env: &Env,
        user: &Address,
        receipt_id: u64,
        output_asset: &Address,
        amount: i128,
        min_output: i128,
    ) -> Result<i128, Error> {
        if amount <= 0 {
            return Err(Error::InvalidAmount);
        }
        if !Storage::is_supported(env, output_asset) {
            return Err(Error::UnsupportedAsset);
        }

        let receipt = Self::owned_receipt(env, user, receipt_id)?;
        let current_cycle = Storage::current_cycle_id(env);

        let (payout, shares) = if receipt.cycle_id == current_cycle {
            if amount > receipt.amount {
                return Err(Error::ExceedsReceiptClaim);
            }

            Batch::refund(env, &receipt.asset, amount)?;
            let payout = Valuation::convert(env, amount, &receipt.asset, output_asset)?;

            Ledgers::resolve_receipt(env, receipt_id)?;
            let remainder = receipt.amount - amount;
            if remainder > 0 {
                Batch::issue_receipt(env, user, &receipt.asset, remainder)?;
            }

            (payout, 0)
        } else {
            let receipt_shares = Self::receipt_shares(env, &receipt)?;
            if amount > receipt_shares {
                return Err(Error::ExceedsReceiptClaim);
            }

            let payout = Self::settle_from_batch(env, amount, output_asset)?;

            Ledgers::resolve_receipt(env, receipt_id)?;
            Ledgers::transfer_shares(
                env,
                &env.current_contract_address(),
                user,
                receipt_shares - amount,
            )?;

            (payout, amount)
        };

        Self::pay(env, user, output_asset, payout, min_output)?;

        env.events().publish(
            (Symbol::new(env, "withdraw_batching"), user.clone()),
            BatchWithdrawEvent {
                receipt_id: Some(receipt_id),
                user: user.clone(),
                output_asset: output_asset.clone(),
                shares,
                payout,
            },
        );

        Ok(payout)
    }

    /// Exit a deployed receipt through the strategies. Unused receipt
    /// shares are credited to the user.
    pub fn withdraw_from_strategies(
        env: &Env,
        user: &Address,
        receipt_id: u64,
        output_asset: &Address,
        shares: i128,
        min_output: i128,
    ) -> Result<i128, Error> {
        if shares <= 0 {
            return Err(Error::InvalidAmount);
        }
        if !Storage::is_supported(env, output_asset) {
            return Err(Error::UnsupportedAsset);
        }

        let receipt = Self::owned_receipt(env, user, receipt_id)?;
        let receipt_shares = Self::receipt_shares(env, &receipt)?;
        if shares > receipt_shares {
            return Err(Error::ExceedsReceiptClaim);
        }

        let router = env.current_contract_address();
        let (payout, value) = Self::settle_from_strategies(env, &router, shares, output_asset)?;
        Self::pay(env, user, output_asset, payout, min_output)?;

        Ledgers::resolve_receipt(env, receipt_id)?;
        Ledgers::transfer_shares(env, &router, user, receipt_shares - shares)?;

        env.events().publish(
            (Symbol::new(env, "withdraw_strategies"), user.clone()),
            StrategyWithdrawEvent {
                receipt_id: Some(receipt_id),
                user: user.clone(),
                output_asset: output_asset.clone(),
                shares,
                value,
                payout,
            },
        );

        Ok(payout)
    }

    /// Convert a deployed receipt into shares held by the user
    pub fn redeem_receipt(env: &Env, user: &Address, receipt_id: u64) -> Result<i128, Error> {
        let receipt = Self::owned_receipt(env, user, receipt_id)?;
        let shares = Self::receipt_shares(env, &receipt)?;

        Ledgers::resolve_receipt(env, receipt_id)?;
        Ledgers::transfer_shares(env, &env.current_contract_address(), user, shares)?;

        env.events().publish(
            (Symbol::new(env, "receipt_redeemed"), receipt_id),
            ReceiptRedeemedEvent {
                receipt_id,
                user: user.clone(),
                shares,
            },
        );

        Ok(shares)
    }

    // ============================================
    // SHARE EXITS
    // ============================================

    pub fn withdraw_shares_from_strategies(
        env: &Env,
        user: &Address,
        output_asset: &Address,
        shares: i128,
        min_output: i128,
    ) -> Result<i128, Error> {
        Self::check_share_exit(env, user, output_asset, shares)?;

        let (payout, value) = Self::settle_from_strategies(env, user, shares, output_asset)?;
        Self::pay(env, user, output_asset, payout, min_output)?;

        env.events().publish(
            (Symbol::new(env, "withdraw_strategies"), user.clone()),
            StrategyWithdrawEvent {
                receipt_id: None,
                user: user.clone(),
                output_asset: output_asset.clone(),
                shares,
                value,
                payout,
            },
        );

        Ok(payout)
    }

    pub fn withdraw_shares_from_batching(
        env: &Env,
        user: &Address,
        output_asset: &Address,
        shares: i128,
        min_output: i128,
    ) -> Result<i128, Error> {
        Self::check_share_exit(env, user, output_asset, shares)?;

        let payout = Self::settle_from_batch(env, shares, output_asset)?;
        Ledgers::transfer_shares(env, user, &env.current_contract_address(), shares)?;
        Self::pay(env, user, output_asset, payout, min_output)?;

        env.events().publish(
            (Symbol::new(env, "withdraw_batching"), user.clone()),
            BatchWithdrawEvent {
                receipt_id: None,
                user: user.clone(),
                output_asset: output_asset.clone(),
                shares,
                payout,
            },
        );

        Ok(payout)
    }

    // ============================================
    // INTERNAL HELPERS
    // ============================================

    /// Unresolved, user-owned receipt
    fn owned_receipt(env: &Env, user: &Address, receipt_id: u64) -> Result<Receipt, Error> {
        let receipt = Ledgers::receipt(env, receipt_id)?;
        if receipt.resolved {
            return Err(Error::ReceiptAlreadyResolved);
        }
        if receipt.owner == env.current_contract_address() {
            return Err(Error::SeedReceiptLocked);
        }
        if receipt.owner != *user {
            return Err(Error::ReceiptNotOwned);
        }
        Ok(receipt)
    }

    fn check_share_exit(
        env: &Env,
        user: &Address,
        output_asset: &Address,
        shares: i128,
    ) -> Result<(), Error> {
        if shares <= 0 {
            return Err(Error::InvalidAmount);
        }
        if !Storage::is_supported(env, output_asset) {
            return Err(Error::UnsupportedAsset);
        }
        if Ledgers::share_balance(env, user)? < shares {
            return Err(Error::InsufficientShares);
        }
        Ok(())
    }

    /// Pull the value of `shares` out of the strategies, convert it into
    /// `output` and burn the shares from `holder`. Returns (payout, value).
    fn settle_from_strategies(
        env: &Env,
        holder: &Address,
        shares: i128,
        output: &Address,
    ) -> Result<(i128, i128), Error> {
        let mut cache = Map::new(env);
        let view = Strategies::view(env, &mut cache)?;
        let supply = Ledgers::total_supply(env)?;
        let pps = pricing::price_per_share(view.total, supply).ok_or(Error::MathOverflow)?;
        if pps == 0 {
            return Err(Error::ZeroPricePerShare);
        }
        let value = pricing::shares_to_value(shares, pps).ok_or(Error::MathOverflow)?;

        let holdings = Strategies::withdraw_value(env, value, &view)?;
        let mut payout = 0i128;
        for (asset, amount) in holdings.iter() {
            let converted = Valuation::convert(env, amount, &asset, output)?;
            payout = payout.checked_add(converted).ok_or(Error::MathOverflow)?;
        }

        // fee baseline drops by the exiting shares' part of it
        let baseline = Storage::last_strategies_value(env);
        let basis = pricing::proportional(baseline, shares, supply).ok_or(Error::MathOverflow)?;
        Ledgers::burn_shares(env, holder, shares)?;
        Storage::set_last_strategies_value(env, (baseline - basis).max(0));

        log!(env, "strategies paid {} for {} shares", payout, shares);
        Ok((payout, value))
    }

    /// Pay the value of `shares` out of the pending batch in `output`. The
    /// caller moves the shares into router custody; they are recycled to the
    /// open cycle.
    ///
    /// Priced net of the fee accrued since the last deployment: the
    /// recycled shares are diluted by that fee when the cycle closes.
    fn settle_from_batch(env: &Env, shares: i128, output: &Address) -> Result<i128, Error> {
        let mut cache = Map::new(env);
        let total = Strategies::view(env, &mut cache)?.total;
        let accrued_fee = CycleController::fee_value(env, &Storage::config(env)?, total)?;
        let supply = Ledgers::total_supply(env)?;
        let pps = pricing::price_per_share(total - accrued_fee, supply).ok_or(Error::MathOverflow)?;
        if pps == 0 {
            return Err(Error::ZeroPricePerShare);
        }
        let value = pricing::shares_to_value(shares, pps).ok_or(Error::MathOverflow)?;

        let payout = Batch::pay_value(env, value, output, &mut cache)?;
        CycleController::recycle_shares(env, shares)?;

        log!(env, "batch paid {} for {} shares", payout, shares);
        Ok(payout)
    }

    fn pay(
        env: &Env,
        user: &Address,
        output: &Address,
        payout: i128,
        min_output: i128,
    ) -> Result<(), Error> {
        if payout < min_output {
            log!(env, "payout {} below minimum {}", payout, min_output);
            return Err(Error::OutputBelowMinimum);
        }
        if payout > 0 {
            token::Client::new(env, output).transfer(&env.current_contract_address(), user, &payout);
        }
        Ok(())
    }
}
