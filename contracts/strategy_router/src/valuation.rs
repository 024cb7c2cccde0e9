use crate::error::Error;
use crate::interfaces::{ExchangeClient, OracleClient};
use crate::pricing;
use crate::storage::{Quote, Storage};
use soroban_sdk::{log, token, Address, Env, Map};

/// Oracle pricing and exchange conversion.
pub struct Valuation;

impl Valuation {
    /// Live oracle quote for a supported asset
    pub fn quote(env: &Env, asset: &Address) -> Result<Quote, Error> {
        let token_decimals = Storage::asset_decimals(env, asset)?;
        let oracle = OracleClient::new(env, &Storage::oracle(env)?);

        let (price, price_decimals) = match oracle.try_get_price(asset) {
            Ok(Ok(reading)) => reading,
            _ => return Err(Error::PriceUnavailable),
        };
        if price <= 0 {
            log!(env, "oracle returned non-positive price: {}", price);
            return Err(Error::PriceUnavailable);
        }

        Ok(Quote {
            price,
            price_decimals,
            token_decimals,
        })
    }

    /// Quote from `cache`, fetching it once per asset
    pub fn cached_quote(
        env: &Env,
        cache: &mut Map<Address, Quote>,
        asset: &Address,
    ) -> Result<Quote, Error> {
        if let Some(quote) = cache.get(asset.clone()) {
            return Ok(quote);
        }
        let quote = Self::quote(env, asset)?;
        cache.set(asset.clone(), quote.clone());
        Ok(quote)
    }

    pub fn to_value(amount: i128, quote: &Quote) -> Result<i128, Error> {
        pricing::amount_to_value(amount, quote).ok_or(Error::MathOverflow)
    }

    pub fn to_amount(value: i128, quote: &Quote) -> Result<i128, Error> {
        pricing::value_to_amount(value, quote).ok_or(Error::MathOverflow)
    }

    /// Swap `amount` of `from` held by the router into `to`.
    ///
    /// Returns the amount of `to` the router actually received.
    pub fn convert(env: &Env, amount: i128, from: &Address, to: &Address) -> Result<i128, Error> {
        if from == to || amount == 0 {
            return Ok(amount);
        }

        let router = env.current_contract_address();
        let exchange = Storage::exchange(env)?;
        let output = token::Client::new(env, to);
        let balance_before = output.balance(&router);

        token::Client::new(env, from).transfer(&router, &exchange, &amount);
        match ExchangeClient::new(env, &exchange).try_swap(&amount, from, to, &router) {
            Ok(Ok(_)) => {}
            _ => return Err(Error::ConversionFailed),
        }

        let received = output
            .balance(&router)
            .checked_sub(balance_before)
            .ok_or(Error::MathOverflow)?;
        if received <= 0 {
            log!(env, "swap produced nothing for {}", amount);
            return Err(Error::ConversionFailed);
        }

        Ok(received)
    }
}
