#![no_std]

mod error;
mod events;
mod storage;

use error::Error;
use events::{ReceiptMintedEvent, ReceiptResolvedEvent, ReceiptTransferEvent};
use storage::DataKey;
pub use storage::Receipt;

use soroban_sdk::{contract, contractimpl, Address, Env, Symbol, Vec};

/// Non-fungible deposit receipts.
///
/// Each batch deposit gets one receipt recording who deposited what and in
/// which cycle. The router resolves a receipt exactly once; resolved receipts
/// stay readable but leave their owner's index.
#[contract]
pub struct ReceiptNft;

#[contractimpl]
impl ReceiptNft {
    /// Initialize the receipt ledger
    ///
    /// # Errors
    /// - `AlreadyInitialized`: Contract already initialized
    pub fn initialize(env: Env, admin: Address) -> Result<(), Error> {
        if env.storage().instance().has(&DataKey::Initialized) {
            return Err(Error::AlreadyInitialized);
        }

        admin.require_auth();

        env.storage().instance().set(&DataKey::Initialized, &true);
        env.storage().instance().set(&DataKey::Admin, &admin);
        env.storage().instance().set(&DataKey::NextReceiptId, &0u64);

        Ok(())
    }

    /// Add an operator (the strategy router)
    ///
    /// # Errors
    /// - `NotInitialized`: Contract not initialized
    pub fn add_operator(env: Env, operator: Address) -> Result<(), Error> {
        let admin: Address = env
            .storage()
            .instance()
            .get(&DataKey::Admin)
            .ok_or(Error::NotInitialized)?;
        admin.require_auth();

        env.storage()
            .instance()
            .set(&DataKey::Operators(operator), &true);

        Ok(())
    }

    /// Remove an operator
    ///
    /// # Errors
    /// - `NotInitialized`: Contract not initialized
    pub fn remove_operator(env: Env, operator: Address) -> Result<(), Error> {
        let admin: Address = env
            .storage()
            .instance()
            .get(&DataKey::Admin)
            .ok_or(Error::NotInitialized)?;
        admin.require_auth();

        env.storage()
            .instance()
            .remove(&DataKey::Operators(operator));

        Ok(())
    }

    /// Mint a receipt for a batch deposit (operators only)
    ///
    /// # Errors
    /// - `NotInitialized`: Contract not initialized
    /// - `NotOperator`: Caller is not a registered operator
    /// - `InvalidAmount`: Amount <= 0
    pub fn mint(
        env: Env,
        operator: Address,
        owner: Address,
        cycle_id: u64,
        asset: Address,
        amount: i128,
    ) -> Result<u64, Error> {
        Self::require_operator(&env, &operator)?;

        if amount <= 0 {
            return Err(Error::InvalidAmount);
        }

        let receipt_id: u64 = env
            .storage()
            .instance()
            .get(&DataKey::NextReceiptId)
            .unwrap_or(0);

        let receipt = Receipt {
            id: receipt_id,
            owner: owner.clone(),
            cycle_id,
            asset: asset.clone(),
            amount,
            resolved: false,
        };

        env.storage()
            .persistent()
            .set(&DataKey::Receipt(receipt_id), &receipt);
        env.storage()
            .instance()
            .set(&DataKey::NextReceiptId, &(receipt_id + 1));
        Self::index_add(&env, &owner, receipt_id);

        env.events().publish(
            (Symbol::new(&env, "receipt_minted"), receipt_id),
            ReceiptMintedEvent {
                receipt_id,
                owner,
                cycle_id,
                asset,
                amount,
            },
        );

        Ok(receipt_id)
    }

    /// Mark a receipt as resolved (operators only)
    ///
    /// # Errors
    /// - `NotInitialized`: Contract not initialized
    /// - `NotOperator`: Caller is not a registered operator
    /// - `ReceiptNotFound`: Unknown receipt id
    /// - `ReceiptResolved`: Receipt was already resolved
    pub fn resolve(env: Env, operator: Address, receipt_id: u64) -> Result<(), Error> {
        Self::require_operator(&env, &operator)?;

        let mut receipt = Self::get_receipt(env.clone(), receipt_id)?;
        if receipt.resolved {
            return Err(Error::ReceiptResolved);
        }

        receipt.resolved = true;
        env.storage()
            .persistent()
            .set(&DataKey::Receipt(receipt_id), &receipt);
        Self::index_remove(&env, &receipt.owner, receipt_id);

        env.events().publish(
            (Symbol::new(&env, "receipt_resolved"), receipt_id),
            ReceiptResolvedEvent {
                receipt_id,
                owner: receipt.owner,
            },
        );

        Ok(())
    }

    /// Transfer an unresolved receipt to a new owner
    ///
    /// # Errors
    /// - `ReceiptNotFound`: Unknown receipt id
    /// - `NotOwner`: `from` does not hold the receipt
    /// - `ReceiptResolved`: Receipt was already resolved
    pub fn transfer(env: Env, from: Address, to: Address, receipt_id: u64) -> Result<(), Error> {
        from.require_auth();

        let mut receipt = Self::get_receipt(env.clone(), receipt_id)?;
        if receipt.owner != from {
            return Err(Error::NotOwner);
        }
        if receipt.resolved {
            return Err(Error::ReceiptResolved);
        }

        receipt.owner = to.clone();
        env.storage()
            .persistent()
            .set(&DataKey::Receipt(receipt_id), &receipt);
        Self::index_remove(&env, &from, receipt_id);
        Self::index_add(&env, &to, receipt_id);

        env.events().publish(
            (Symbol::new(&env, "receipt_transfer"), receipt_id),
            ReceiptTransferEvent {
                receipt_id,
                from,
                to,
            },
        );

        Ok(())
    }

    // ============================================
    // VIEW FUNCTIONS
    // ============================================

    /// Get a receipt by id
    pub fn get_receipt(env: Env, receipt_id: u64) -> Result<Receipt, Error> {
        env.storage()
            .persistent()
            .get(&DataKey::Receipt(receipt_id))
            .ok_or(Error::ReceiptNotFound)
    }

    /// Unresolved receipt ids held by `owner`, in acquisition order
    pub fn receipts_of(env: Env, owner: Address) -> Vec<u64> {
        env.storage()
            .persistent()
            .get(&DataKey::OwnerReceipts(owner))
            .unwrap_or(Vec::new(&env))
    }

    /// Id the next minted receipt will get
    pub fn next_id(env: Env) -> u64 {
        env.storage()
            .instance()
            .get(&DataKey::NextReceiptId)
            .unwrap_or(0)
    }

    pub fn is_operator(env: Env, address: Address) -> bool {
        env.storage()
            .instance()
            .get::<DataKey, bool>(&DataKey::Operators(address))
            .unwrap_or(false)
    }

    // ============================================
    // INTERNAL HELPERS
    // ============================================

    fn require_operator(env: &Env, operator: &Address) -> Result<(), Error> {
        if !env.storage().instance().has(&DataKey::Initialized) {
            return Err(Error::NotInitialized);
        }
        if !Self::is_operator(env.clone(), operator.clone()) {
            return Err(Error::NotOperator);
        }
        operator.require_auth();
        Ok(())
    }

    fn index_add(env: &Env, owner: &Address, receipt_id: u64) {
        let mut ids = Self::receipts_of(env.clone(), owner.clone());
        ids.push_back(receipt_id);
        env.storage()
            .persistent()
            .set(&DataKey::OwnerReceipts(owner.clone()), &ids);
    }

    fn index_remove(env: &Env, owner: &Address, receipt_id: u64) {
        let mut ids = Self::receipts_of(env.clone(), owner.clone());
        if let Some(pos) = ids.first_index_of(receipt_id) {
            ids.remove(pos);
        }

        let key = DataKey::OwnerReceipts(owner.clone());
        if ids.is_empty() {
            env.storage().persistent().remove(&key);
        } else {
            env.storage().persistent().set(&key, &ids);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use soroban_sdk::{testutils::Address as _, vec, Address, Env};

    const SCALE: i128 = 10_000_000;

    fn setup(env: &Env) -> (ReceiptNftClient<'_>, Address) {
        let contract_id = env.register_contract(None, ReceiptNft);
        let client = ReceiptNftClient::new(env, &contract_id);

        let admin = Address::generate(env);
        let operator = Address::generate(env);
        client.initialize(&admin);
        client.add_operator(&operator);

        (client, operator)
    }

    #[test]
    fn test_ids_are_monotonic() {
        let env = Env::default();
        env.mock_all_auths();
        let (client, operator) = setup(&env);

        let user = Address::generate(&env);
        let asset = Address::generate(&env);

        let first = client.mint(&operator, &user, &0, &asset, &SCALE);
        let second = client.mint(&operator, &user, &0, &asset, &(3 * SCALE));
        let third = client.mint(&operator, &user, &1, &asset, &SCALE);

        assert_eq!((first, second, third), (0, 1, 2));
        assert_eq!(client.next_id(), 3);
        assert_eq!(client.receipts_of(&user), vec![&env, 0u64, 1, 2]);

        let receipt = client.get_receipt(&1);
        assert_eq!(receipt.amount, 3 * SCALE);
        assert_eq!(receipt.cycle_id, 0);
        assert!(!receipt.resolved);
    }

    #[test]
    fn test_resolve_is_one_shot() {
        let env = Env::default();
        env.mock_all_auths();
        let (client, operator) = setup(&env);

        let user = Address::generate(&env);
        let asset = Address::generate(&env);
        let id = client.mint(&operator, &user, &0, &asset, &SCALE);

        client.resolve(&operator, &id);
        assert!(client.get_receipt(&id).resolved);
        assert_eq!(client.receipts_of(&user).len(), 0);

        let result = client.try_resolve(&operator, &id);
        assert_eq!(result, Err(Ok(Error::ReceiptResolved)));
    }

    #[test]
    fn test_transfer_moves_index() {
        let env = Env::default();
        env.mock_all_auths();
        let (client, operator) = setup(&env);

        let user1 = Address::generate(&env);
        let user2 = Address::generate(&env);
        let asset = Address::generate(&env);

        let a = client.mint(&operator, &user1, &0, &asset, &SCALE);
        let b = client.mint(&operator, &user1, &0, &asset, &SCALE);

        client.transfer(&user1, &user2, &a);

        assert_eq!(client.receipts_of(&user1), vec![&env, b]);
        assert_eq!(client.receipts_of(&user2), vec![&env, a]);
        assert_eq!(client.get_receipt(&a).owner, user2);

        let result = client.try_transfer(&user1, &user2, &a);
        assert_eq!(result, Err(Ok(Error::NotOwner)));
    }

    #[test]
    fn test_mint_requires_operator() {
        let env = Env::default();
        env.mock_all_auths();
        let (client, _operator) = setup(&env);

        let stranger = Address::generate(&env);
        let asset = Address::generate(&env);
        let result = client.try_mint(&stranger, &stranger, &0, &asset, &SCALE);
        assert_eq!(result, Err(Ok(Error::NotOperator)));

        let missing = client.try_get_receipt(&7);
        assert_eq!(missing, Err(Ok(Error::ReceiptNotFound)));
    }

    #[test]
    fn test_removed_operator_cannot_resolve() {
        let env = Env::default();
        env.mock_all_auths();
        let (client, operator) = setup(&env);

        let user = Address::generate(&env);
        let asset = Address::generate(&env);
        let id = client.mint(&operator, &user, &0, &asset, &SCALE);

        client.remove_operator(&operator);
        assert!(!client.is_operator(&operator));

        let result = client.try_resolve(&operator, &id);
        assert_eq!(result, Err(Ok(Error::NotOperator)));
        assert!(!client.get_receipt(&id).resolved);
    }
}
