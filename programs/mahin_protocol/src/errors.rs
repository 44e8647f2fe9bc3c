use anchor_lang::prelude::*;

#[error_code]
pub enum MahinError {
    #[msg("Unauthorized")]
    Unauthorized,
    #[msg("Not enough funds")]
    NotEnoughFunds,
    #[msg("Sold out")]
    SoldOut,
    #[msg("Invalid token id")]
    InvalidTokenId,
    #[msg("Roll not ready: randomness has not matured")]
    RollNotReady,
    #[msg("No active roll cycle")]
    NoActiveCycle,

    #[msg("Math overflow")]
    MathOverflow,

    // -----------------
    // Registry
    // -----------------
    #[msg("Invalid content pointers")]
    InvalidContent,
    #[msg("Name too long")]
    NameTooLong,
    #[msg("Content host too long")]
    ContentHostTooLong,
    #[msg("Token already minted")]
    TokenAlreadyMinted,
    #[msg("Token registry is full")]
    RegistryFull,

    // -----------------
    // Doctor
    // -----------------
    #[msg("Invalid probability (must be <= 1.0 in 64.64)")]
    InvalidProbability,
    #[msg("Invalid reward parameters")]
    InvalidRewardParams,
    #[msg("Requester account does not match the open cycle")]
    RequesterMismatch,
    #[msg("Registry does not authorize this doctor")]
    DoctorMismatch,
    #[msg("Selected token account missing or mismatched")]
    SelectedTokenMismatch,
    #[msg("Roll cycle is not stuck yet")]
    CycleNotStuck,
    #[msg("A roll cycle is open")]
    CycleOpen,
    #[msg("Invalid slot hashes sysvar data")]
    InvalidSlotHashes,

    // -----------------
    // Oracle
    // -----------------
    #[msg("Oracle pubkey not set")]
    OracleNotSet,
    #[msg("Open cycle does not use the oracle")]
    NotOracleCycle,
    #[msg("Randomness request id mismatch")]
    RequestIdMismatch,
    #[msg("Randomness already fulfilled")]
    RandomnessAlreadyFulfilled,
    #[msg("Missing or invalid ed25519 verify instruction")]
    MissingOrInvalidEd25519Ix,
    #[msg("Ed25519 pubkey mismatch")]
    Ed25519PubkeyMismatch,
    #[msg("Ed25519 message mismatch")]
    Ed25519MessageMismatch,

    // -----------------
    // MintDateRegistry
    // -----------------
    #[msg("not writer")]
    NotWriter,
    #[msg("Writer set is full")]
    WriterSetFull,
    #[msg("Writer already exists")]
    WriterAlreadyExists,
    #[msg("Writer not found")]
    WriterNotFound,
    #[msg("Mint date registry is full")]
    MintDateRegistryFull,

    // -----------------
    // Seller
    // -----------------
    #[msg("Seller is disabled")]
    SellerDisabled,
    #[msg("Invalid allocation")]
    InvalidAllocation,
    #[msg("Treasury account mismatch")]
    TreasuryMismatch,
    #[msg("Beneficiary account missing or mismatched")]
    BeneficiaryMismatch,
}
