// Centralized Protocol Constants

// Fixed Point
// ===========

/// 1.0 in unsigned 64.64 fixed point. As a roll probability it means "no hit is certain".
pub const FIXED_ONE: u128 = 1 << 64;

/// Default per-second no-hit probability (64.64).
/// Equals 0.875^(1 / 5 years): a 12.5% chance of diagnosis over five 365-day years.
pub const DEFAULT_PER_SECOND_PROBABILITY: u128 = 18_446_744_058_087_916_504;

// Time Logic Constants
// ====================

pub const SECONDS_PER_YEAR: u64 = 365 * 24 * 3600;

/// Slots that must pass after a fallback request before the reveal hash may be used.
/// The hash of the slot after the request is unknown to the requester.
pub const FALLBACK_REVEAL_DELAY_SLOTS: u64 = 2;

/// Window after a request in which the reward is reserved for the requester.
pub const DEFAULT_REWARD_LOCK_SECONDS: i64 = 3600;

/// An open cycle older than this may be force-cleared by the admin.
pub const STUCK_CYCLE_TIMEOUT_SECONDS: i64 = 7 * 24 * 3600;

// Economics
// =========

/// Reward accrual per year of elapsed roll time (lamports). 0.8 SOL.
pub const DEFAULT_REWARD_PER_YEAR: u64 = 800_000_000;

/// Flat part of the apply reward (lamports).
pub const DEFAULT_MIN_REWARD: u64 = 0;

/// Default fixed mint price (lamports). 0.4 SOL.
pub const DEFAULT_MINT_PRICE: u64 = 400_000_000;

/// Share of each sale routed to the beneficiary when one is configured (basis points).
pub const BENEFICIARY_SHARE_BPS: u64 = 7_500;

// Collection
// ==========

/// Upper bound on token ids; also sizes the eligible index.
pub const MAX_TOKENS: u32 = 64;

pub const MIN_CONTENT_STATES: usize = 2;
pub const MAX_CONTENT_STATES: usize = 3;
pub const MAX_CONTENT_POINTER_LEN: usize = 64;
pub const MAX_CONTENT_HOST_LEN: usize = 64;
pub const MAX_TOKEN_NAME_LEN: usize = 32;

/// Mint date reported for tokens without an explicit entry (2021-03-25).
pub const DEFAULT_MINT_DATE: i64 = 1_616_634_003;

pub const MAX_WRITERS: usize = 8;

/// Initial version for account structures.
pub const INITIAL_VERSION: u16 = 1;
