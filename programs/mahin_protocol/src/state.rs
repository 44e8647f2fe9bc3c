use anchor_lang::prelude::*;

use crate::constants::*;

#[account]
#[derive(InitSpace)]
pub struct Registry {
    pub admin: Pubkey,
    pub bump: u8,

    /// Allowed to mint besides the admin (e.g. the seller PDA).
    pub minter: Pubkey,

    /// Doctor PDA allowed to diagnose through rolls.
    pub doctor: Pubkey,

    #[max_len(64)]
    pub content_host: String,

    pub token_count: u32,
    pub minted_count: u32,
    pub diagnosed_count: u32,

    /// Minted, not yet diagnosed token ids. Order is not stable (swap-remove).
    #[max_len(64)]
    pub eligible: Vec<u32>,

    pub version: u16,
}

impl Registry {
    pub fn can_mint(&self, key: &Pubkey) -> bool {
        *key == self.admin || (*key == self.minter && self.minter != Pubkey::default())
    }
}

#[account]
#[derive(InitSpace)]
pub struct TokenData {
    pub token_id: u32,
    pub bump: u8,

    #[max_len(32)]
    pub name: String,

    /// Content pointers: [pre-diagnosis, post-diagnosis, (post-operation)].
    #[max_len(3, 64)]
    pub content: Vec<String>,

    pub minted: bool,
    pub owner: Pubkey,
    pub mint: Pubkey,
    pub minted_at: i64,

    // one-way
    pub diagnosed: bool,
    pub diagnosed_at: i64,
}

impl TokenData {
    pub fn current_pointer(&self) -> &str {
        let idx = if self.diagnosed { 1 } else { 0 };
        self.content.get(idx).map(String::as_str).unwrap_or_default()
    }
}

/// Which randomness source serves a cycle. Frozen at request time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RandomnessSource {
    ExternalOracle,
    BlockHashFallback,
}

/// One in-flight request/apply pair. `requested_at == 0` means no cycle is open.
#[derive(AnchorSerialize, AnchorDeserialize, InitSpace, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RollCycle {
    pub roll_id: u64,
    pub requested_at: i64,
    pub requested_slot: u64,
    pub requester: Pubkey,

    /// No-hit probability (64.64) frozen at request time.
    pub roll_probability: u128,

    pub use_fallback: bool,

    // oracle path
    pub request_id: u64,
    pub seed: [u8; 32],
    pub randomness: [u8; 32],
    pub fulfilled: bool,
}

impl RollCycle {
    pub fn is_open(&self) -> bool {
        self.requested_at != 0
    }

    pub fn source(&self) -> RandomnessSource {
        if self.use_fallback {
            RandomnessSource::BlockHashFallback
        } else {
            RandomnessSource::ExternalOracle
        }
    }
}

#[account]
#[derive(InitSpace)]
pub struct Doctor {
    pub admin: Pubkey,
    pub bump: u8,

    pub registry: Pubkey,

    /// Per-second no-hit probability (64.64), <= FIXED_ONE.
    pub per_second_probability: u128,

    pub last_roll_requested_time: i64,
    pub last_roll_applied_time: i64,

    pub reward_per_year: u64,
    pub min_reward: u64,
    pub reward_lock_seconds: i64,

    // Pubkey::default() = not set
    pub oracle_pubkey: Pubkey,
    pub mint_date_registry: Pubkey,

    pub roll_count: u64,
    pub request_counter: u64,

    pub cycle: RollCycle,

    pub version: u16,
}

impl Doctor {
    pub fn is_rolling(&self) -> bool {
        self.cycle.is_open()
    }

    /// Time the probability curve is measured from.
    pub fn probability_base_time(&self) -> i64 {
        if self.is_rolling() {
            self.cycle.requested_at
        } else {
            self.last_roll_requested_time
        }
    }
}

#[derive(AnchorSerialize, AnchorDeserialize, InitSpace, Clone, Copy, Debug, PartialEq, Eq)]
pub struct MintDateEntry {
    pub token_id: u32,
    pub mint_date: i64,
}

#[account]
#[derive(InitSpace)]
pub struct MintDateRegistry {
    pub admin: Pubkey,
    pub bump: u8,

    pub default_mint_date: i64,

    #[max_len(8)]
    pub writers: Vec<Pubkey>,

    #[max_len(64)]
    pub entries: Vec<MintDateEntry>,

    pub version: u16,
}

impl MintDateRegistry {
    pub fn is_writer(&self, key: &Pubkey) -> bool {
        *key == self.admin || self.writers.contains(key)
    }

    pub fn mint_date_for(&self, token_id: u32) -> i64 {
        self.entries
            .iter()
            .find(|e| e.token_id == token_id)
            .map(|e| e.mint_date)
            .unwrap_or(self.default_mint_date)
    }

    pub fn upsert(&mut self, token_id: u32, mint_date: i64) {
        match self.entries.iter_mut().find(|e| e.token_id == token_id) {
            Some(entry) => entry.mint_date = mint_date,
            None => self.entries.push(MintDateEntry { token_id, mint_date }),
        }
    }
}

#[account]
#[derive(InitSpace)]
pub struct Seller {
    pub admin: Pubkey,
    pub bump: u8,

    pub enabled: bool,
    pub mint_price: u64,

    pub treasury: Pubkey,
    // Pubkey::default() = no beneficiary, treasury receives everything
    pub beneficiary: Pubkey,

    /// Token ids still for sale, sold front to back.
    #[max_len(64)]
    pub allocation: Vec<u32>,
    pub sold_count: u32,

    pub version: u16,
}

impl Seller {
    pub fn next_token_id(&self) -> Option<u32> {
        self.allocation.first().copied()
    }
}

/// Snapshot returned by the `roll_stats` view.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct RollStats {
    pub is_rolling: bool,
    pub roll_count: u64,
    pub last_roll_requested_time: i64,
    pub last_roll_applied_time: i64,
    pub probability: u128,
    pub reward_amount: u64,
    pub minted_count: u32,
    pub diagnosed_count: u32,
    pub eligible_count: u32,
}

// Sanity: the eligible index is sized by MAX_TOKENS.
const _: () = assert!(MAX_TOKENS as usize == 64);
