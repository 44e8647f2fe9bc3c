use anchor_lang::prelude::*;

use crate::{constants::SECONDS_PER_YEAR, errors::MahinError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RewardParams {
    pub reward_per_year: u64,
    pub min_reward: u64,
}

/// Keeper reward for a roll whose curve started at `base_time`, measured at `reward_time`.
pub fn reward_amount(params: RewardParams, base_time: i64, reward_time: i64) -> Result<u64> {
    let elapsed = reward_time.saturating_sub(base_time).max(0) as u128;

    let accrued = (params.reward_per_year as u128)
        .checked_mul(elapsed)
        .ok_or(MahinError::MathOverflow)?
        / SECONDS_PER_YEAR as u128;

    let total = accrued
        .checked_add(params.min_reward as u128)
        .ok_or(MahinError::MathOverflow)?;

    u64::try_from(total).map_err(|_| error!(MahinError::MathOverflow))
}

/// Underfunding degrades the payout instead of failing the apply.
pub fn capped_payout(reward: u64, available: u64) -> u64 {
    reward.min(available)
}

/// Lamports above the rent-exempt floor.
pub fn available_balance(lamports: u64, rent_exempt_minimum: u64) -> u64 {
    lamports.saturating_sub(rent_exempt_minimum)
}
