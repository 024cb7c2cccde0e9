use crate::error::Error;
use crate::events::DepositEvent;
use crate::ledgers::Ledgers;
use crate::storage::{AssetBalance, BatchView, Quote, Storage};
use crate::valuation::Valuation;
use soroban_sdk::{log, token, Address, Env, Map, Symbol, Vec};

/// Assets waiting in the open cycle.
///
/// `pending` is what the router actually holds for the batch, `claimed` is
/// what the cycle's live receipts are owed at deployment. They drift apart
/// when a deployed position is paid out of the batch.
pub struct Batch;

impl Batch {
    /// Take `amount` of `asset` from `payer` and mint a receipt to `owner`
    pub fn deposit(
        env: &Env,
        owner: &Address,
        payer: &Address,
        asset: &Address,
        amount: i128,
    ) -> Result<u64, Error> {
        if amount <= 0 {
            return Err(Error::InvalidAmount);
        }
        if !Storage::is_supported(env, asset) {
            return Err(Error::UnsupportedAsset);
        }

        let mut entry = Storage::batch_entry(env, asset);
        entry.pending = entry.pending.checked_add(amount).ok_or(Error::MathOverflow)?;
        entry.claimed = entry.claimed.checked_add(amount).ok_or(Error::MathOverflow)?;

        token::Client::new(env, asset).transfer(payer, &env.current_contract_address(), &amount);
        Storage::set_batch_entry(env, asset, &entry);

        let receipt_id = Self::issue_receipt(env, owner, asset, amount)?;
        log!(env, "batch deposit {} as receipt {}", amount, receipt_id);

        Ok(receipt_id)
    }

    /// Mint a receipt in the open cycle for tokens already in the batch
    pub fn issue_receipt(
        env: &Env,
        owner: &Address,
        asset: &Address,
        amount: i128,
    ) -> Result<u64, Error> {
        let cycle_id = Storage::current_cycle_id(env);
        let receipt_id = Ledgers::mint_receipt(env, owner, cycle_id, asset, amount)?;

        env.events().publish(
            (Symbol::new(env, "deposit"), receipt_id),
            DepositEvent {
                receipt_id,
                owner: owner.clone(),
                cycle_id,
                asset: asset.clone(),
                amount,
            },
        );

        Ok(receipt_id)
    }

    /// Pending amounts of every supported asset, valued at oracle prices
    pub fn view(env: &Env, cache: &mut Map<Address, Quote>) -> Result<BatchView, Error> {
        let mut total = 0i128;
        let mut assets = Vec::new(env);

        for asset in Storage::supported_assets(env).iter() {
            let amount = Storage::batch_entry(env, &asset).pending;
            let value = if amount > 0 {
                let quote = Valuation::cached_quote(env, cache, &asset)?;
                Valuation::to_value(amount, &quote)?
            } else {
                0
            };

            total = total.checked_add(value).ok_or(Error::MathOverflow)?;
            assets.push_back(AssetBalance {
                asset,
                amount,
                value,
            });
        }

        Ok(BatchView { total, assets })
    }

    /// USD value owed to the open cycle's receipts. Snapshots every quote it
    /// uses under `cycle_id`.
    pub fn claimed_value(
        env: &Env,
        cycle_id: u64,
        cache: &mut Map<Address, Quote>,
    ) -> Result<i128, Error> {
        let mut total = 0i128;

        for asset in Storage::supported_assets(env).iter() {
            let entry = Storage::batch_entry(env, &asset);
            if entry.claimed == 0 && entry.pending == 0 {
                continue;
            }

            let quote = Valuation::cached_quote(env, cache, &asset)?;
            Storage::set_cycle_quote(env, cycle_id, &asset, &quote);
            total = total
                .checked_add(Valuation::to_value(entry.claimed, &quote)?)
                .ok_or(Error::MathOverflow)?;
        }

        Ok(total)
    }

    /// Hand every pending token over for deployment and reset the batch
    pub fn drain(env: &Env) -> Map<Address, i128> {
        let mut holdings = Map::new(env);

        for asset in Storage::supported_assets(env).iter() {
            let entry = Storage::batch_entry(env, &asset);
            if entry.pending > 0 {
                holdings.set(asset.clone(), entry.pending);
            }
            Storage::set_batch_entry(env, &asset, &Default::default());
        }

        holdings
    }

    /// Give back `amount` of a pending receipt's asset from the batch
    pub fn refund(env: &Env, asset: &Address, amount: i128) -> Result<(), Error> {
        let mut entry = Storage::batch_entry(env, asset);
        if entry.pending < amount {
            log!(env, "batch holds {} of {} requested", entry.pending, amount);
            return Err(Error::InsufficientBatchLiquidity);
        }

        entry.pending -= amount;
        entry.claimed = entry.claimed.checked_sub(amount).ok_or(Error::MathOverflow)?;
        Storage::set_batch_entry(env, asset, &entry);

        Ok(())
    }

    /// Pay `value` out of pending assets, `output` first, converted into
    /// `output`. Claims are untouched: the batch depositors are compensated
    /// with the surrendered shares at deployment.
    pub fn pay_value(
        env: &Env,
        value: i128,
        output: &Address,
        cache: &mut Map<Address, Quote>,
    ) -> Result<i128, Error> {
        let mut order = Vec::new(env);
        order.push_back(output.clone());
        for asset in Storage::supported_assets(env).iter() {
            if asset != *output {
                order.push_back(asset);
            }
        }

        let mut remaining = value;
        let mut payout = 0i128;

        for asset in order.iter() {
            if remaining == 0 {
                break;
            }
            let mut entry = Storage::batch_entry(env, &asset);
            if entry.pending == 0 {
                continue;
            }

            let quote = Valuation::cached_quote(env, cache, &asset)?;
            let available = Valuation::to_value(entry.pending, &quote)?;
            let amount = if available <= remaining {
                remaining -= available;
                entry.pending
            } else {
                let partial = Valuation::to_amount(remaining, &quote)?.min(entry.pending);
                remaining = 0;
                partial
            };
            if amount == 0 {
                continue;
            }

            entry.pending -= amount;
            Storage::set_batch_entry(env, &asset, &entry);

            let converted = Valuation::convert(env, amount, &asset, output)?;
            payout = payout.checked_add(converted).ok_or(Error::MathOverflow)?;
        }

        if remaining > 0 {
            log!(env, "batch short by {} of {}", remaining, value);
            return Err(Error::InsufficientBatchLiquidity);
        }

        Ok(payout)
    }
}
