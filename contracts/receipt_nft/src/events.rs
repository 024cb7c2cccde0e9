use soroban_sdk::{contracttype, Address};

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReceiptMintedEvent {
    pub receipt_id: u64,
    pub owner: Address,
    pub cycle_id: u64,
    pub asset: Address,
    pub amount: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReceiptResolvedEvent {
    pub receipt_id: u64,
    pub owner: Address,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReceiptTransferEvent {
    pub receipt_id: u64,
    pub from: Address,
    pub to: Address,
}
