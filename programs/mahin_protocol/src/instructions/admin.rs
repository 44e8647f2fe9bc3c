use anchor_lang::prelude::*;

use crate::constants::*;
use crate::errors::MahinError;
use crate::events::RollAborted;
use crate::probability::validate_per_second_probability;
use crate::roll::abort_cycle;
use crate::state::RollCycle;
use crate::{InitializeDoctor, UpdateDoctor};

pub fn initialize_doctor(ctx: Context<InitializeDoctor>) -> Result<()> {
    let reg = &ctx.accounts.registry;
    require_keys_eq!(reg.admin, ctx.accounts.admin.key(), MahinError::Unauthorized);

    let now = Clock::get()?.unix_timestamp;

    let doctor = &mut ctx.accounts.doctor;
    doctor.admin = ctx.accounts.admin.key();
    doctor.bump = ctx.bumps.doctor;
    doctor.registry = reg.key();

    doctor.per_second_probability = DEFAULT_PER_SECOND_PROBABILITY;
    // the curve starts at creation
    doctor.last_roll_requested_time = now;
    doctor.last_roll_applied_time = now;

    doctor.reward_per_year = DEFAULT_REWARD_PER_YEAR;
    doctor.min_reward = DEFAULT_MIN_REWARD;
    doctor.reward_lock_seconds = DEFAULT_REWARD_LOCK_SECONDS;

    doctor.oracle_pubkey = Pubkey::default();
    doctor.mint_date_registry = Pubkey::default();

    doctor.roll_count = 0;
    doctor.request_counter = 0;
    doctor.cycle = RollCycle::default();

    doctor.version = INITIAL_VERSION;

    Ok(())
}

pub fn set_per_second_probability(ctx: Context<UpdateDoctor>, per_second: u128) -> Result<()> {
    let doctor = &mut ctx.accounts.doctor;
    require_keys_eq!(doctor.admin, ctx.accounts.admin.key(), MahinError::Unauthorized);
    validate_per_second_probability(per_second)?;

    doctor.per_second_probability = per_second;
    Ok(())
}

/// Moves the start of the probability curve, for tuning deployments.
pub fn set_last_roll_time(ctx: Context<UpdateDoctor>, timestamp: i64) -> Result<()> {
    let doctor = &mut ctx.accounts.doctor;
    require_keys_eq!(doctor.admin, ctx.accounts.admin.key(), MahinError::Unauthorized);
    // the open cycle already froze its base
    require!(!doctor.is_rolling(), MahinError::CycleOpen);

    doctor.last_roll_requested_time = timestamp;
    doctor.last_roll_applied_time = timestamp;
    Ok(())
}

pub fn set_reward_params(
    ctx: Context<UpdateDoctor>,
    reward_per_year: u64,
    min_reward: u64,
    reward_lock_seconds: i64,
) -> Result<()> {
    let doctor = &mut ctx.accounts.doctor;
    require_keys_eq!(doctor.admin, ctx.accounts.admin.key(), MahinError::Unauthorized);
    require!(reward_lock_seconds >= 0, MahinError::InvalidRewardParams);

    doctor.reward_per_year = reward_per_year;
    doctor.min_reward = min_reward;
    doctor.reward_lock_seconds = reward_lock_seconds;
    Ok(())
}

pub fn set_oracle_pubkey(ctx: Context<UpdateDoctor>, oracle_pubkey: Pubkey) -> Result<()> {
    let doctor = &mut ctx.accounts.doctor;
    require_keys_eq!(doctor.admin, ctx.accounts.admin.key(), MahinError::Unauthorized);

    doctor.oracle_pubkey = oracle_pubkey;
    Ok(())
}

pub fn set_mint_date_registry(ctx: Context<UpdateDoctor>, mint_date_registry: Pubkey) -> Result<()> {
    let doctor = &mut ctx.accounts.doctor;
    require_keys_eq!(doctor.admin, ctx.accounts.admin.key(), MahinError::Unauthorized);

    doctor.mint_date_registry = mint_date_registry;
    Ok(())
}

pub fn force_clear_roll(ctx: Context<UpdateDoctor>) -> Result<()> {
    let doctor = &mut ctx.accounts.doctor;
    require_keys_eq!(doctor.admin, ctx.accounts.admin.key(), MahinError::Unauthorized);

    let now = Clock::get()?.unix_timestamp;
    let roll_id = abort_cycle(doctor, now)?;

    msg!("roll {} force-cleared", roll_id);
    emit!(RollAborted {
        roll_id,
        aborted_at: now,
    });
    Ok(())
}

#[cfg(feature = "mock-randomness")]
pub fn set_randomness_mock(ctx: Context<UpdateDoctor>, randomness: [u8; 32]) -> Result<()> {
    let doctor = &mut ctx.accounts.doctor;
    require_keys_eq!(doctor.admin, ctx.accounts.admin.key(), MahinError::Unauthorized);

    let request_id = doctor.cycle.request_id;
    crate::roll::fulfill_cycle(doctor, request_id, randomness)
}
