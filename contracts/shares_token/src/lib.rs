#![no_std]

mod error;
mod events;
mod storage;

use error::Error;
use events::{BurnEvent, MintEvent, TransferEvent};
use storage::DataKey;

use soroban_sdk::{contract, contractimpl, Address, Env, Symbol};

/// Fungible share ledger of the strategy router.
///
/// Shares are a proportional claim on the value deployed into strategies.
/// Supply only grows through operator mints at cycle close and only shrinks
/// through operator burns at withdrawal.
#[contract]
pub struct SharesToken;

#[contractimpl]
impl SharesToken {
    /// Initialize the share ledger
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
        env.storage().instance().set(&DataKey::TotalSupply, &0i128);

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

    /// Mint shares (operators only)
    ///
    /// # Errors
    /// - `NotInitialized`: Contract not initialized
    /// - `NotOperator`: Caller is not a registered operator
    /// - `InvalidAmount`: Amount <= 0 or supply overflow
    pub fn mint(env: Env, operator: Address, to: Address, amount: i128) -> Result<(), Error> {
        Self::require_operator(&env, &operator)?;

        if amount <= 0 {
            return Err(Error::InvalidAmount);
        }

        let new_balance = Self::read_balance(&env, &to)
            .checked_add(amount)
            .ok_or(Error::InvalidAmount)?;
        let total_supply = Self::total_supply(env.clone())
            .checked_add(amount)
            .ok_or(Error::InvalidAmount)?;

        Self::write_balance(&env, &to, new_balance);
        env.storage()
            .instance()
            .set(&DataKey::TotalSupply, &total_supply);

        env.events().publish(
            (Symbol::new(&env, "mint"), to.clone()),
            MintEvent {
                to,
                amount,
                total_supply,
            },
        );

        Ok(())
    }

    /// Burn shares (operators only)
    ///
    /// # Errors
    /// - `NotInitialized`: Contract not initialized
    /// - `NotOperator`: Caller is not a registered operator
    /// - `InvalidAmount`: Amount <= 0
    /// - `InsufficientBalance`: Not enough balance
    pub fn burn(env: Env, operator: Address, from: Address, amount: i128) -> Result<(), Error> {
        Self::require_operator(&env, &operator)?;

        if amount <= 0 {
            return Err(Error::InvalidAmount);
        }

        let balance = Self::read_balance(&env, &from);
        if balance < amount {
            return Err(Error::InsufficientBalance);
        }

        let total_supply = Self::total_supply(env.clone()) - amount;

        Self::write_balance(&env, &from, balance - amount);
        env.storage()
            .instance()
            .set(&DataKey::TotalSupply, &total_supply);

        env.events().publish(
            (Symbol::new(&env, "burn"), from.clone()),
            BurnEvent {
                from,
                amount,
                total_supply,
            },
        );

        Ok(())
    }

    /// Transfer shares between holders
    ///
    /// # Errors
    /// - `NotInitialized`: Contract not initialized
    /// - `InvalidAmount`: Amount <= 0
    /// - `InsufficientBalance`: Not enough balance
    pub fn transfer(env: Env, from: Address, to: Address, amount: i128) -> Result<(), Error> {
        if !env.storage().instance().has(&DataKey::Initialized) {
            return Err(Error::NotInitialized);
        }

        if amount <= 0 {
            return Err(Error::InvalidAmount);
        }

        from.require_auth();

        let from_balance = Self::read_balance(&env, &from);
        if from_balance < amount {
            return Err(Error::InsufficientBalance);
        }

        let new_to_balance = Self::read_balance(&env, &to)
            .checked_add(amount)
            .ok_or(Error::InvalidAmount)?;

        Self::write_balance(&env, &from, from_balance - amount);
        Self::write_balance(&env, &to, new_to_balance);

        env.events().publish(
            (Symbol::new(&env, "transfer"), from.clone(), to.clone()),
            TransferEvent { from, to, amount },
        );

        Ok(())
    }

    /// Get share balance of a holder
    pub fn balance_of(env: Env, owner: Address) -> i128 {
        Self::read_balance(&env, &owner)
    }

    /// Get total share supply
    pub fn total_supply(env: Env) -> i128 {
        env.storage()
            .instance()
            .get(&DataKey::TotalSupply)
            .unwrap_or(0)
    }

    /// Check if address is an operator
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

    fn read_balance(env: &Env, owner: &Address) -> i128 {
        env.storage()
            .persistent()
            .get(&DataKey::Balance(owner.clone()))
            .unwrap_or(0)
    }

    fn write_balance(env: &Env, owner: &Address, amount: i128) {
        let key = DataKey::Balance(owner.clone());
        if amount == 0 {
            env.storage().persistent().remove(&key);
        } else {
            env.storage().persistent().set(&key, &amount);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use soroban_sdk::{testutils::Address as _, Address, Env};

    const SHARES: i128 = 1_000_000_000_000;

    fn setup(env: &Env) -> (SharesTokenClient<'_>, Address) {
        let contract_id = env.register_contract(None, SharesToken);
        let client = SharesTokenClient::new(env, &contract_id);

        let admin = Address::generate(env);
        let operator = Address::generate(env);
        client.initialize(&admin);
        client.add_operator(&operator);

        (client, operator)
    }

    #[test]
    fn test_initialize() {
        let env = Env::default();
        env.mock_all_auths();

        let contract_id = env.register_contract(None, SharesToken);
        let client = SharesTokenClient::new(&env, &contract_id);

        let admin = Address::generate(&env);
        client.initialize(&admin);

        let result = client.try_initialize(&admin);
        assert_eq!(result, Err(Ok(Error::AlreadyInitialized)));
        assert_eq!(client.total_supply(), 0);
    }

    #[test]
    fn test_mint_tracks_supply() {
        let env = Env::default();
        env.mock_all_auths();
        let (client, operator) = setup(&env);

        let user1 = Address::generate(&env);
        let user2 = Address::generate(&env);

        client.mint(&operator, &user1, &SHARES);
        client.mint(&operator, &user2, &(3 * SHARES));

        assert_eq!(client.balance_of(&user1), SHARES);
        assert_eq!(client.balance_of(&user2), 3 * SHARES);
        assert_eq!(client.total_supply(), 4 * SHARES);
    }

    #[test]
    fn test_mint_requires_operator() {
        let env = Env::default();
        env.mock_all_auths();
        let (client, _operator) = setup(&env);

        let stranger = Address::generate(&env);
        let result = client.try_mint(&stranger, &stranger, &SHARES);
        assert_eq!(result, Err(Ok(Error::NotOperator)));
        assert_eq!(client.total_supply(), 0);
    }

    #[test]
    fn test_burn_reduces_supply() {
        let env = Env::default();
        env.mock_all_auths();
        let (client, operator) = setup(&env);

        let user = Address::generate(&env);
        client.mint(&operator, &user, &SHARES);
        client.burn(&operator, &user, &(SHARES / 4));

        assert_eq!(client.balance_of(&user), 3 * SHARES / 4);
        assert_eq!(client.total_supply(), 3 * SHARES / 4);

        let result = client.try_burn(&operator, &user, &SHARES);
        assert_eq!(result, Err(Ok(Error::InsufficientBalance)));
    }

    #[test]
    fn test_transfer_keeps_supply() {
        let env = Env::default();
        env.mock_all_auths();
        let (client, operator) = setup(&env);

        let user1 = Address::generate(&env);
        let user2 = Address::generate(&env);

        client.mint(&operator, &user1, &SHARES);
        client.transfer(&user1, &user2, &(SHARES / 2));

        assert_eq!(client.balance_of(&user1), SHARES / 2);
        assert_eq!(client.balance_of(&user2), SHARES / 2);
        assert_eq!(client.total_supply(), SHARES);

        let result = client.try_transfer(&user1, &user2, &SHARES);
        assert_eq!(result, Err(Ok(Error::InsufficientBalance)));
    }

    #[test]
    fn test_removed_operator_cannot_mint() {
        let env = Env::default();
        env.mock_all_auths();
        let (client, operator) = setup(&env);

        client.remove_operator(&operator);
        assert!(!client.is_operator(&operator));

        let user = Address::generate(&env);
        let result = client.try_mint(&operator, &user, &SHARES);
        assert_eq!(result, Err(Ok(Error::NotOperator)));
    }
}
