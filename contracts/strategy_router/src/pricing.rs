use crate::storage::{Quote, BASIS_POINTS, PRECISION};

/// Decimals of every USD value the router produces (SCALE)
const VALUE_DECIMALS: u32 = 7;

/// USD value (SCALE) of a token amount
///
/// Formula: value = amount × price / 10^price_decimals, rescaled from
/// token_decimals to 7 decimals
///
/// Example:
/// - 3 tokens of a 7-decimal asset priced 0.99 (price 9_900_000, 7 decimals)
/// - value: 30_000_000 × 9_900_000 / 10^7 = 29_700_000 (2.97 USD)
pub fn amount_to_value(amount: i128, quote: &Quote) -> Option<i128> {
    let raw = amount
        .checked_mul(quote.price)?
        .checked_div(pow10(quote.price_decimals)?)?;
    rescale(raw, quote.token_decimals, VALUE_DECIMALS)
}

/// Token amount worth `value` (SCALE), rounded down
pub fn value_to_amount(value: i128, quote: &Quote) -> Option<i128> {
    if quote.price <= 0 {
        return None;
    }
    rescale(value, VALUE_DECIMALS, quote.token_decimals)?
        .checked_mul(pow10(quote.price_decimals)?)?
        .checked_div(quote.price)
}

/// Price of one share in USD value, PRECISION scaled
///
/// Formula: pps = total_value × PRECISION / total_supply
pub fn price_per_share(total_value: i128, total_supply: i128) -> Option<i128> {
    if total_supply <= 0 {
        return Some(0);
    }
    total_value
        .checked_mul(PRECISION)?
        .checked_div(total_supply)
}

/// USD value of `shares` at `pps`
pub fn shares_to_value(shares: i128, pps: i128) -> Option<i128> {
    shares.checked_mul(pps)?.checked_div(PRECISION)
}

/// Shares bought by `value` at `pps`
pub fn value_to_shares(value: i128, pps: i128) -> Option<i128> {
    value.checked_mul(PRECISION)?.checked_div(pps)
}

/// `amount × part / whole`, rounded down
pub fn proportional(amount: i128, part: i128, whole: i128) -> Option<i128> {
    amount.checked_mul(part)?.checked_div(whole)
}

/// Protocol fee on `profit` at `fee_bps`
pub fn fee_on_profit(profit: i128, fee_bps: u32) -> Option<i128> {
    if profit <= 0 {
        return Some(0);
    }
    proportional(profit, fee_bps as i128, BASIS_POINTS)
}

fn pow10(exp: u32) -> Option<i128> {
    10i128.checked_pow(exp)
}

fn rescale(amount: i128, from: u32, to: u32) -> Option<i128> {
    if from > to {
        amount.checked_div(pow10(from - to)?)
    } else {
        amount.checked_mul(pow10(to - from)?)
    }
}
