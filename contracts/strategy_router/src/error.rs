use soroban_sdk::contracterror;

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    // ============================================
    // LIFECYCLE ERRORS (1-9)
    // ============================================
    /// Contract already initialized
    AlreadyInitialized = 1,
    /// Contract not initialized
    NotInitialized = 2,
    /// Contract is paused
    ContractPaused = 3,
    /// A mutating call is already in progress
    Reentrancy = 4,

    // ============================================
    // INPUT ERRORS (10-29)
    // ============================================
    /// Amount must be positive
    InvalidAmount = 10,
    /// Asset is not accepted by the router
    UnsupportedAsset = 11,
    /// Asset still has batch balance and cannot be delisted
    AssetInUse = 12,
    /// Receipt does not exist
    ReceiptNotFound = 13,
    /// Caller does not own the receipt
    ReceiptNotOwned = 14,
    /// Receipt was already withdrawn or redeemed
    ReceiptAlreadyResolved = 15,
    /// Receipt's cycle has not been deployed yet
    ReceiptNotDeployed = 16,
    /// Request exceeds what the receipt entitles
    ExceedsReceiptClaim = 17,
    /// Seed receipts are never withdrawable
    SeedReceiptLocked = 18,
    /// No strategy at this index
    StrategyNotFound = 19,
    /// Weight must be within 1..=WEIGHT_TOTAL
    InvalidWeight = 20,
    /// Fee above MAX_FEE_BPS
    InvalidFeePercent = 21,
    /// Holder does not own enough shares
    InsufficientShares = 22,
    /// Adapter is already registered
    StrategyExists = 23,

    // ============================================
    // POLICY ERRORS (30-39)
    // ============================================
    /// Cycle duration has not elapsed
    CycleNotClosable = 30,
    /// Batch claim below min_usd_per_cycle
    BatchValueTooLow = 31,
    /// Enabled strategy weights do not sum to WEIGHT_TOTAL
    InvalidWeightTotal = 32,
    /// First deployment needs a seed receipt in the batch
    SeedRequired = 33,
    /// No enabled strategy to receive capital
    NoStrategies = 34,
    /// Outstanding shares are backed by no value
    ZeroPricePerShare = 35,
    /// Compounding reported a lower strategies value
    ValueDecreased = 36,

    // ============================================
    // SLIPPAGE ERRORS (40-49)
    // ============================================
    /// Payout below caller's min_output
    OutputBelowMinimum = 40,

    // ============================================
    // LIQUIDITY ERRORS (50-59)
    // ============================================
    /// A strategy could not supply its proportional amount
    InsufficientStrategyLiquidity = 50,
    /// Pending batch assets cannot cover the request
    InsufficientBatchLiquidity = 51,

    // ============================================
    // EXTERNAL ERRORS (60-69)
    // ============================================
    /// Oracle failed or returned a non-positive price
    PriceUnavailable = 60,
    /// Exchange swap failed or returned nothing
    ConversionFailed = 61,
    /// Strategy adapter call failed
    StrategyCallFailed = 62,
    /// Shares or receipt ledger call failed
    LedgerCallFailed = 63,

    // ============================================
    // ARITHMETIC ERRORS (70-79)
    // ============================================
    /// Checked arithmetic overflowed or divided by zero
    MathOverflow = 70,
}
