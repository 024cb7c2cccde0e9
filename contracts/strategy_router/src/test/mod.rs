mod registry;
mod withdrawals;

use crate::{StrategyRouter, StrategyRouterClient, SCALE, WEIGHT_TOTAL};
use mocks::{
    MockExchange, MockExchangeClient, MockOracle, MockOracleClient, MockStrategy,
    MockStrategyClient,
};
use receipt_nft::{ReceiptNft, ReceiptNftClient};
use shares_token::{SharesToken, SharesTokenClient};
use soroban_sdk::{
    testutils::{Address as _, Ledger},
    token, Address, Env,
};

pub const DURATION: u64 = 3_600;
pub const MIN_USD: i128 = SCALE;
pub const FUNDING: i128 = 1_000_000 * SCALE;

pub struct Setup<'a> {
    pub env: Env,
    pub admin: Address,
    pub router: StrategyRouterClient<'a>,
    pub shares: SharesTokenClient<'a>,
    pub receipts: ReceiptNftClient<'a>,
    pub oracle: MockOracleClient<'a>,
    pub exchange: MockExchangeClient<'a>,
    pub usdc: Address,
    pub usdt: Address,
}

impl<'a> Setup<'a> {
    /// Router with two supported 7-decimal stablecoins at 1.00, no
    /// strategies yet
    pub fn new() -> Self {
        let env = Env::default();
        env.mock_all_auths();
        env.ledger().with_mut(|li| {
            li.timestamp = 1_000;
        });

        let admin = Address::generate(&env);
        let usdc = env
            .register_stellar_asset_contract_v2(admin.clone())
            .address();
        let usdt = env
            .register_stellar_asset_contract_v2(admin.clone())
            .address();

        let shares = SharesTokenClient::new(&env, &env.register_contract(None, SharesToken));
        shares.initialize(&admin);
        let receipts = ReceiptNftClient::new(&env, &env.register_contract(None, ReceiptNft));
        receipts.initialize(&admin);

        let oracle = MockOracleClient::new(&env, &env.register_contract(None, MockOracle));
        oracle.set_price(&usdc, &SCALE, &7);
        oracle.set_price(&usdt, &SCALE, &7);

        let exchange = MockExchangeClient::new(&env, &env.register_contract(None, MockExchange));

        let router = StrategyRouterClient::new(&env, &env.register_contract(None, StrategyRouter));
        router.initialize(
            &admin,
            &shares.address,
            &receipts.address,
            &oracle.address,
            &exchange.address,
            &DURATION,
            &MIN_USD,
        );
        shares.add_operator(&router.address);
        receipts.add_operator(&router.address);
        router.set_supported_asset(&usdc, &true);
        router.set_supported_asset(&usdt, &true);

        let setup = Setup {
            env,
            admin,
            router,
            shares,
            receipts,
            oracle,
            exchange,
            usdc,
            usdt,
        };
        setup.mint(&setup.usdc, &setup.exchange.address, FUNDING);
        setup.mint(&setup.usdt, &setup.exchange.address, FUNDING);
        setup.mint(&setup.usdc, &setup.admin, FUNDING);
        setup
    }

    /// New setup with a single usdc strategy taking the whole weight
    pub fn with_strategy() -> (Self, MockStrategyClient<'a>) {
        let setup = Self::new();
        let strategy = setup.add_strategy(&setup.usdc, WEIGHT_TOTAL);
        (setup, strategy)
    }

    pub fn add_strategy(&self, token: &Address, weight: u32) -> MockStrategyClient<'a> {
        let strategy =
            MockStrategyClient::new(&self.env, &self.env.register_contract(None, MockStrategy));
        strategy.init(&self.router.address, token);
        self.router.add_strategy(&strategy.address, &weight);
        strategy
    }

    /// Fresh account holding 1,000 of each stablecoin
    pub fn user(&self) -> Address {
        let user = Address::generate(&self.env);
        self.mint(&self.usdc, &user, 1_000 * SCALE);
        self.mint(&self.usdt, &user, 1_000 * SCALE);
        user
    }

    pub fn mint(&self, asset: &Address, to: &Address, amount: i128) {
        token::StellarAssetClient::new(&self.env, asset).mint(to, &amount);
    }

    pub fn balance(&self, asset: &Address, owner: &Address) -> i128 {
        token::Client::new(&self.env, asset).balance(owner)
    }

    pub fn advance(&self) {
        self.env.ledger().with_mut(|li| {
            li.timestamp += DURATION;
        });
    }

    /// Let the cycle elapse and deploy it
    pub fn deploy(&self) {
        self.advance();
        self.router.deposit_to_strategies();
    }

    /// Seed 1 usdc and deploy cycle 0
    pub fn seed(&self) {
        self.router.seed_deposit(&self.usdc, &SCALE);
        self.deploy();
    }

    /// Value of every strategy, at oracle prices
    pub fn strategies_value(&self) -> i128 {
        self.router.view_strategies_balance().total
    }
}

#[test]
fn test_initialize_twice() {
    let setup = Setup::new();

    let result = setup.router.try_initialize(
        &setup.admin,
        &setup.shares.address,
        &setup.receipts.address,
        &setup.oracle.address,
        &setup.exchange.address,
        &DURATION,
        &MIN_USD,
    );
    assert_eq!(result, Err(Ok(crate::Error::AlreadyInitialized)));

    assert_eq!(setup.router.current_cycle_id(), 0);
    assert!(!setup.router.get_cycle(&0).closed);
    assert_eq!(
        setup.router.supported_assets(),
        soroban_sdk::vec![&setup.env, setup.usdc.clone(), setup.usdt.clone()]
    );
}
