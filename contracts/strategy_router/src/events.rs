use soroban_sdk::{contracttype, Address};

#[contracttype]
#[derive(Clone, Debug)]
pub struct DepositEvent {
    pub receipt_id: u64,
    pub owner: Address,
    pub cycle_id: u64,
    pub asset: Address,
    pub amount: i128,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct CycleClosedEvent {
    pub cycle_id: u64,
    pub total_deposited_value: i128,
    pub received_by_strategies: i128,
    pub new_shares: i128,
    pub recycled_shares: i128,
    pub price_per_share: i128,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct FeesCollectedEvent {
    pub fee_address: Address,
    pub profit: i128,
    pub fee_value: i128,
    pub fee_shares: i128,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct BatchWithdrawEvent {
    pub receipt_id: Option<u64>,
    pub user: Address,
    pub output_asset: Address,
    /// Shares surrendered to the batch; zero for a pending refund
    pub shares: i128,
    pub payout: i128,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct StrategyWithdrawEvent {
    pub receipt_id: Option<u64>,
    pub user: Address,
    pub output_asset: Address,
    pub shares: i128,
    pub value: i128,
    pub payout: i128,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct ReceiptRedeemedEvent {
    pub receipt_id: u64,
    pub user: Address,
    pub shares: i128,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct CompoundEvent {
    pub value_before: i128,
    pub value_after: i128,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct StrategyAddedEvent {
    pub index: u32,
    pub strategy: Address,
    pub deposit_token: Address,
    pub weight: u32,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct StrategyUpdatedEvent {
    pub index: u32,
    pub weight: u32,
    pub enabled: bool,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct StrategyRemovedEvent {
    pub strategy: Address,
    pub migrated_value: i128,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct RebalancedEvent {
    pub value_before: i128,
    pub value_after: i128,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct ConfigUpdatedEvent {
    pub cycle_duration: u64,
    pub min_usd_per_cycle: i128,
    pub fee_bps: u32,
}
