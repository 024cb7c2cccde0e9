use soroban_sdk::contracterror;

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    // Initialization errors
    AlreadyInitialized = 1,
    NotInitialized = 2,

    // Authorization errors
    NotOperator = 3,
    NotOwner = 4,

    // Receipt errors
    ReceiptNotFound = 10,
    ReceiptResolved = 11,
    InvalidAmount = 12,
}
