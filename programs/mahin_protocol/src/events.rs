use anchor_lang::prelude::*;

/// A roll was requested; `probability` is the frozen no-hit probability (64.64).
#[event]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RollInProgress {
    pub roll_id: u64,
    pub probability: u128,
    pub requested_at: i64,
    pub use_fallback: bool,
    pub requester: Pubkey,
}

#[event]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RollComplete {
    pub roll_id: u64,
    pub applied_at: i64,
    pub hit: bool,
    pub diagnosed: Option<u32>,
    pub reward: u64,
    pub recipient: Pubkey,
}

#[event]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RollAborted {
    pub roll_id: u64,
    pub aborted_at: i64,
}

#[event]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnosed {
    pub token_id: u32,
    // None for the admin override
    pub roll_id: Option<u64>,
}

/// Bulk content archival; payloads only live in the transaction log.
#[event]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenDataStorage {
    pub token_id: u32,
    pub state_index: u8,
    pub payload: String,
}

#[event]
pub struct RandomnessRequested {
    pub roll_id: u64,
    pub request_id: u64,
    pub seed: [u8; 32],
}

#[event]
pub struct RandomnessFulfilled {
    pub roll_id: u64,
    pub request_id: u64,
}

#[event]
pub struct TokenMinted {
    pub token_id: u32,
    pub owner: Pubkey,
    pub mint: Pubkey,
}

#[event]
pub struct DoctorFunded {
    pub funder: Pubkey,
    pub amount: u64,
}

#[event]
pub struct Purchased {
    pub token_id: u32,
    pub buyer: Pubkey,
    pub price: u64,
}
