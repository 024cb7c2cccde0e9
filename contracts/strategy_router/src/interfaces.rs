use crate::storage::Receipt;
use soroban_sdk::{contractclient, Address, Env, Vec};

/// Price feed for supported assets
#[contractclient(name = "OracleClient")]
pub trait OracleInterface {
    /// USD price of one whole unit of `asset` and the price's decimals
    fn get_price(env: Env, asset: Address) -> (i128, u32);
}

/// Token converter. The router transfers `amount_in` to the exchange before
/// calling `swap`; the output is paid to `recipient`.
#[contractclient(name = "ExchangeClient")]
pub trait ExchangeInterface {
    fn swap(
        env: Env,
        amount_in: i128,
        token_in: Address,
        token_out: Address,
        recipient: Address,
    ) -> i128;
}

/// Yield strategy adapter owned by the router
#[contractclient(name = "StrategyClient")]
pub trait StrategyInterface {
    /// Token the adapter accepts and reports `balance` in
    fn deposit_token(env: Env) -> Address;

    /// Invest `amount` the router has already transferred in
    fn deposit(env: Env, amount: i128);

    /// Pay up to `amount` of the deposit token back to the router
    fn withdraw(env: Env, amount: i128) -> i128;

    /// Current position in deposit-token units
    fn balance(env: Env) -> i128;

    /// Collect rewards and reinvest them into the position
    fn harvest_and_compound(env: Env);
}

#[contractclient(name = "SharesLedgerClient")]
pub trait SharesLedgerInterface {
    fn mint(env: Env, operator: Address, to: Address, amount: i128);
    fn burn(env: Env, operator: Address, from: Address, amount: i128);
    fn transfer(env: Env, from: Address, to: Address, amount: i128);
    fn balance_of(env: Env, owner: Address) -> i128;
    fn total_supply(env: Env) -> i128;
}

#[contractclient(name = "ReceiptLedgerClient")]
pub trait ReceiptLedgerInterface {
    fn mint(
        env: Env,
        operator: Address,
        owner: Address,
        cycle_id: u64,
        asset: Address,
        amount: i128,
    ) -> u64;
    fn resolve(env: Env, operator: Address, receipt_id: u64);
    fn get_receipt(env: Env, receipt_id: u64) -> Receipt;
    fn receipts_of(env: Env, owner: Address) -> Vec<u64>;
}
