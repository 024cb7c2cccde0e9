use soroban_sdk::{contracttype, Address};

/// A single batch deposit, recorded before shares are assigned to it
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Receipt {
    /// Monotonic id, starting at 0
    pub id: u64,
    /// Current holder of the claim
    pub owner: Address,
    /// Cycle whose batch received the deposit
    pub cycle_id: u64,
    /// Deposited asset
    pub asset: Address,
    /// Deposited amount in the asset's own units
    pub amount: i128,
    /// Set once the claim has been withdrawn or converted to shares
    pub resolved: bool,
}

#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    Admin,
    Operators(Address),
    Receipt(u64),              // receipt_id -> Receipt
    OwnerReceipts(Address),    // owner -> Vec<receipt_id>
    NextReceiptId,
    Initialized,
}
