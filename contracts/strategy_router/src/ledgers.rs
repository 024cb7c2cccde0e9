use crate::error::Error;
use crate::interfaces::{ReceiptLedgerClient, SharesLedgerClient};
use crate::storage::{Receipt, Storage};
use soroban_sdk::{Address, Env, Vec};

/// Receipt ledger error code for an already resolved receipt
const RECEIPT_RESOLVED: u32 = 11;

/// Calls into the share and receipt ledgers, with the router as operator.
pub struct Ledgers;

impl Ledgers {
    fn shares(env: &Env) -> Result<SharesLedgerClient<'_>, Error> {
        Ok(SharesLedgerClient::new(env, &Storage::shares_token(env)?))
    }

    fn receipts(env: &Env) -> Result<ReceiptLedgerClient<'_>, Error> {
        Ok(ReceiptLedgerClient::new(env, &Storage::receipt_nft(env)?))
    }

    pub fn total_supply(env: &Env) -> Result<i128, Error> {
        match Self::shares(env)?.try_total_supply() {
            Ok(Ok(supply)) => Ok(supply),
            _ => Err(Error::LedgerCallFailed),
        }
    }

    pub fn share_balance(env: &Env, owner: &Address) -> Result<i128, Error> {
        match Self::shares(env)?.try_balance_of(owner) {
            Ok(Ok(balance)) => Ok(balance),
            _ => Err(Error::LedgerCallFailed),
        }
    }

    pub fn mint_shares(env: &Env, to: &Address, amount: i128) -> Result<(), Error> {
        if amount == 0 {
            return Ok(());
        }
        let router = env.current_contract_address();
        match Self::shares(env)?.try_mint(&router, to, &amount) {
            Ok(Ok(())) => Ok(()),
            _ => Err(Error::LedgerCallFailed),
        }
    }

    pub fn burn_shares(env: &Env, from: &Address, amount: i128) -> Result<(), Error> {
        if amount == 0 {
            return Ok(());
        }
        let router = env.current_contract_address();
        match Self::shares(env)?.try_burn(&router, from, &amount) {
            Ok(Ok(())) => Ok(()),
            _ => Err(Error::LedgerCallFailed),
        }
    }

    pub fn transfer_shares(env: &Env, from: &Address, to: &Address, amount: i128) -> Result<(), Error> {
        if amount == 0 {
            return Ok(());
        }
        match Self::shares(env)?.try_transfer(from, to, &amount) {
            Ok(Ok(())) => Ok(()),
            _ => Err(Error::LedgerCallFailed),
        }
    }

    pub fn receipt(env: &Env, receipt_id: u64) -> Result<Receipt, Error> {
        match Self::receipts(env)?.try_get_receipt(&receipt_id) {
            Ok(Ok(receipt)) => Ok(receipt),
            _ => Err(Error::ReceiptNotFound),
        }
    }

    pub fn receipts_of(env: &Env, owner: &Address) -> Result<Vec<u64>, Error> {
        match Self::receipts(env)?.try_receipts_of(owner) {
            Ok(Ok(ids)) => Ok(ids),
            _ => Err(Error::LedgerCallFailed),
        }
    }

    pub fn mint_receipt(
        env: &Env,
        owner: &Address,
        cycle_id: u64,
        asset: &Address,
        amount: i128,
    ) -> Result<u64, Error> {
        let router = env.current_contract_address();
        match Self::receipts(env)?.try_mint(&router, owner, &cycle_id, asset, &amount) {
            Ok(Ok(receipt_id)) => Ok(receipt_id),
            _ => Err(Error::LedgerCallFailed),
        }
    }

    pub fn resolve_receipt(env: &Env, receipt_id: u64) -> Result<(), Error> {
        let router = env.current_contract_address();
        match Self::receipts(env)?.try_resolve(&router, &receipt_id) {
            Ok(Ok(())) => Ok(()),
            Err(Ok(err)) if err == soroban_sdk::Error::from_contract_error(RECEIPT_RESOLVED) => {
                Err(Error::ReceiptAlreadyResolved)
            }
            _ => Err(Error::LedgerCallFailed),
        }
    }
}
