use crate::error::Error;
use soroban_sdk::{contracttype, Address, Env, Vec};

// Constants
pub const SCALE: i128 = 10_000_000; // USD values, 7 decimals
pub const PRECISION: i128 = 1_000_000_000_000_000_000; // price-per-share scale, 1e18
pub const INITIAL_SHARES: i128 = 1_000_000_000_000; // minted by the very first deployment
pub const WEIGHT_TOTAL: u32 = 10_000; // strategy weights, 100% = 10,000
pub const BASIS_POINTS: i128 = 10_000;
pub const MAX_FEE_BPS: u32 = 2_000; // fee on profit capped at 20%
pub const DUST_VALUE: i128 = 1_000; // holdings worth this or less are not swapped

/// Protocol parameters, mutated only through admin entry points
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RouterConfig {
    /// Minimum seconds a cycle stays open before its batch can be deployed
    pub cycle_duration: u64,
    /// Minimum USD value (7 decimals) a batch must claim to be deployed
    pub min_usd_per_cycle: i128,
    /// Share of strategy profit taken as protocol fee, in basis points
    pub fee_bps: u32,
    /// Receiver of fee shares; no fee is minted while unset
    pub fee_address: Option<Address>,
}

/// One deployment window
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Cycle {
    pub id: u64,
    /// Ledger timestamp the cycle opened at
    pub start_at: u64,
    /// USD value claimed by the cycle's receipts, at close-time prices
    pub total_deposited_value: i128,
    /// USD value the strategies actually gained from the batch
    pub received_by_strategies: i128,
    /// Shares surrendered by cross-withdrawals while the cycle was open
    pub recycled_shares: i128,
    /// Newly minted plus recycled shares owed to the cycle's receipts
    pub shares_for_batch: i128,
    /// Price-per-share the batch was minted at (PRECISION scaled)
    pub price_per_share: i128,
    pub closed: bool,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StrategyInfo {
    /// Adapter contract
    pub strategy: Address,
    /// Token the adapter accepts and reports its balance in
    pub deposit_token: Address,
    /// Share of each deployment out of WEIGHT_TOTAL
    pub weight: u32,
    /// Disabled strategies keep their capital but receive no new deployments
    pub enabled: bool,
}

/// Per-asset batch totals for the open cycle
#[contracttype]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct BatchEntry {
    /// Tokens held for the batch
    pub pending: i128,
    /// Sum of unresolved receipts of this asset in the open cycle
    pub claimed: i128,
}

/// Oracle price of an asset together with the decimals needed to value it
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Quote {
    pub price: i128,
    pub price_decimals: u32,
    pub token_decimals: u32,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AssetBalance {
    pub asset: Address,
    pub amount: i128,
    pub value: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BatchView {
    pub total: i128,
    pub assets: Vec<AssetBalance>,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StrategyBalance {
    pub strategy: Address,
    pub token: Address,
    pub amount: i128,
    pub value: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StrategiesView {
    pub total: i128,
    pub strategies: Vec<StrategyBalance>,
}

/// Mirror of the receipt ledger's record
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Receipt {
    pub id: u64,
    pub owner: Address,
    pub cycle_id: u64,
    pub asset: Address,
    pub amount: i128,
    pub resolved: bool,
}

#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    Admin,
    Initialized,
    Paused,
    Lock,
    SharesToken,
    ReceiptNft,
    Oracle,
    Exchange,
    Config,
    SupportedAssets,
    AssetDecimals(Address),
    Strategies,
    CurrentCycle,
    Cycle(u64),
    CycleQuote(u64, Address), // (cycle_id, asset) -> Quote at close
    Batch(Address),
    SeedInBatch,
    LastStrategiesValue,
}

pub struct Storage;

impl Storage {
    // Addresses
    pub fn admin(env: &Env) -> Result<Address, Error> {
        Self::address(env, DataKey::Admin)
    }

    pub fn shares_token(env: &Env) -> Result<Address, Error> {
        Self::address(env, DataKey::SharesToken)
    }

    pub fn receipt_nft(env: &Env) -> Result<Address, Error> {
        Self::address(env, DataKey::ReceiptNft)
    }

    pub fn oracle(env: &Env) -> Result<Address, Error> {
        Self::address(env, DataKey::Oracle)
    }

    pub fn exchange(env: &Env) -> Result<Address, Error> {
        Self::address(env, DataKey::Exchange)
    }

    fn address(env: &Env, key: DataKey) -> Result<Address, Error> {
        env.storage()
            .instance()
            .get(&key)
            .ok_or(Error::NotInitialized)
    }

    pub fn require_admin(env: &Env) -> Result<Address, Error> {
        let admin = Self::admin(env)?;
        admin.require_auth();
        Ok(admin)
    }

    // Pause and reentrancy
    pub fn check_not_paused(env: &Env) -> Result<(), Error> {
        let paused = env
            .storage()
            .instance()
            .get::<DataKey, bool>(&DataKey::Paused)
            .unwrap_or(false);

        if paused {
            return Err(Error::ContractPaused);
        }
        Ok(())
    }

    /// Take the router lock for the duration of a mutating call.
    ///
    /// A failed call reverts the lock write together with everything else,
    /// so only successful paths need to `unlock`.
    pub fn lock(env: &Env) -> Result<(), Error> {
        if env.storage().instance().has(&DataKey::Lock) {
            return Err(Error::Reentrancy);
        }
        env.storage().instance().set(&DataKey::Lock, &true);
        Ok(())
    }

    pub fn unlock(env: &Env) {
        env.storage().instance().remove(&DataKey::Lock);
    }

    // Config
    pub fn config(env: &Env) -> Result<RouterConfig, Error> {
        env.storage()
            .instance()
            .get(&DataKey::Config)
            .ok_or(Error::NotInitialized)
    }

    pub fn set_config(env: &Env, config: &RouterConfig) {
        env.storage().instance().set(&DataKey::Config, config);
    }

    // Assets
    pub fn supported_assets(env: &Env) -> Vec<Address> {
        env.storage()
            .instance()
            .get(&DataKey::SupportedAssets)
            .unwrap_or(Vec::new(env))
    }

    pub fn set_supported_assets(env: &Env, assets: &Vec<Address>) {
        env.storage()
            .instance()
            .set(&DataKey::SupportedAssets, assets);
    }

    pub fn is_supported(env: &Env, asset: &Address) -> bool {
        Self::supported_assets(env).contains(asset)
    }

    pub fn asset_decimals(env: &Env, asset: &Address) -> Result<u32, Error> {
        env.storage()
            .instance()
            .get(&DataKey::AssetDecimals(asset.clone()))
            .ok_or(Error::UnsupportedAsset)
    }

    pub fn set_asset_decimals(env: &Env, asset: &Address, decimals: u32) {
        env.storage()
            .instance()
            .set(&DataKey::AssetDecimals(asset.clone()), &decimals);
    }

    // Strategies
    pub fn strategies(env: &Env) -> Vec<StrategyInfo> {
        env.storage()
            .instance()
            .get(&DataKey::Strategies)
            .unwrap_or(Vec::new(env))
    }

    pub fn set_strategies(env: &Env, strategies: &Vec<StrategyInfo>) {
        env.storage()
            .instance()
            .set(&DataKey::Strategies, strategies);
    }

    // Cycles
    pub fn current_cycle_id(env: &Env) -> u64 {
        env.storage()
            .instance()
            .get(&DataKey::CurrentCycle)
            .unwrap_or(0)
    }

    pub fn set_current_cycle_id(env: &Env, cycle_id: u64) {
        env.storage()
            .instance()
            .set(&DataKey::CurrentCycle, &cycle_id);
    }

    pub fn cycle(env: &Env, cycle_id: u64) -> Result<Cycle, Error> {
        env.storage()
            .persistent()
            .get(&DataKey::Cycle(cycle_id))
            .ok_or(Error::NotInitialized)
    }

    pub fn set_cycle(env: &Env, cycle: &Cycle) {
        env.storage()
            .persistent()
            .set(&DataKey::Cycle(cycle.id), cycle);
    }

    pub fn cycle_quote(env: &Env, cycle_id: u64, asset: &Address) -> Result<Quote, Error> {
        env.storage()
            .persistent()
            .get(&DataKey::CycleQuote(cycle_id, asset.clone()))
            .ok_or(Error::PriceUnavailable)
    }

    pub fn set_cycle_quote(env: &Env, cycle_id: u64, asset: &Address, quote: &Quote) {
        env.storage()
            .persistent()
            .set(&DataKey::CycleQuote(cycle_id, asset.clone()), quote);
    }

    // Batch
    pub fn batch_entry(env: &Env, asset: &Address) -> BatchEntry {
        env.storage()
            .instance()
            .get(&DataKey::Batch(asset.clone()))
            .unwrap_or_default()
    }

    pub fn set_batch_entry(env: &Env, asset: &Address, entry: &BatchEntry) {
        let key = DataKey::Batch(asset.clone());
        if entry.pending == 0 && entry.claimed == 0 {
            env.storage().instance().remove(&key);
        } else {
            env.storage().instance().set(&key, entry);
        }
    }

    pub fn seed_in_batch(env: &Env) -> bool {
        env.storage()
            .instance()
            .get(&DataKey::SeedInBatch)
            .unwrap_or(false)
    }

    pub fn set_seed_in_batch(env: &Env, value: bool) {
        env.storage().instance().set(&DataKey::SeedInBatch, &value);
    }

    // Fee accounting
    pub fn last_strategies_value(env: &Env) -> i128 {
        env.storage()
            .instance()
            .get(&DataKey::LastStrategiesValue)
            .unwrap_or(0)
    }

    pub fn set_last_strategies_value(env: &Env, value: i128) {
        env.storage()
            .instance()
            .set(&DataKey::LastStrategiesValue, &value);
    }
}
