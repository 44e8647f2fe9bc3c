use anchor_lang::prelude::*;
use anchor_lang::solana_program::{program::invoke, system_instruction};

use crate::errors::MahinError;
use crate::events::{DoctorFunded, RandomnessRequested, RollInProgress};
use crate::probability::probability_at;
use crate::randomness::find_reveal_hash;
use crate::reward::{reward_amount, RewardParams};
use crate::roll::{ensure_ready, open_cycle, settle_cycle, Payee, RequestOutcome};
use crate::roll_log::RollLogEvent;
use crate::state::{RandomnessSource, RollStats};
use crate::utils::{move_lamports, spendable_lamports};
use crate::{ApplyRoll, FundDoctor, RequestRoll, ViewDoctor};

pub fn request_roll(ctx: Context<RequestRoll>, use_fallback: bool) -> Result<()> {
    let clock = Clock::get()?;
    let requester = ctx.accounts.requester.key();
    let doctor = &mut ctx.accounts.doctor;

    let cycle = match open_cycle(doctor, requester, use_fallback, clock.unix_timestamp, clock.slot)? {
        RequestOutcome::Opened(cycle) => cycle,
        RequestOutcome::AlreadyRolling => {
            msg!("roll {} already in progress, skipping", doctor.cycle.roll_id);
            return Ok(());
        }
    };

    if cycle.source() == RandomnessSource::ExternalOracle {
        emit!(RandomnessRequested {
            roll_id: cycle.roll_id,
            request_id: cycle.request_id,
            seed: cycle.seed,
        });
    }

    msg!(
        "roll {} requested, no-hit probability {} (64.64)",
        cycle.roll_id,
        cycle.roll_probability
    );
    emit_roll_event(&RollLogEvent::InProgress(RollInProgress {
        roll_id: cycle.roll_id,
        probability: cycle.roll_probability,
        requested_at: cycle.requested_at,
        use_fallback: cycle.use_fallback,
        requester,
    }));

    Ok(())
}

pub fn apply_roll(ctx: Context<ApplyRoll>) -> Result<()> {
    let clock = Clock::get()?;
    let cycle = ctx.accounts.doctor.cycle;

    ensure_ready(&cycle, clock.slot)?;

    let randomness = match cycle.source() {
        RandomnessSource::ExternalOracle => cycle.randomness,
        RandomnessSource::BlockHashFallback => {
            let data = ctx.accounts.slot_hashes.try_borrow_data()?;
            match find_reveal_hash(&data, cycle.requested_slot)? {
                Some((_, hash)) => hash,
                None => {
                    msg!("roll {} reveal slot no longer held", cycle.roll_id);
                    return err!(MahinError::RollNotReady);
                }
            }
        }
    };

    let available = spendable_lamports(&ctx.accounts.doctor.to_account_info())?;
    let doctor_key = ctx.accounts.doctor.key();
    let settlement = settle_cycle(
        &mut ctx.accounts.doctor,
        doctor_key,
        &mut ctx.accounts.registry,
        ctx.accounts.selected_token.as_deref_mut(),
        ctx.accounts.requester.key(),
        ctx.accounts.caller.key(),
        &randomness,
        clock.unix_timestamp,
        available,
    )?;

    let recipient_info = match settlement.payee {
        Payee::Caller => ctx.accounts.caller.to_account_info(),
        Payee::Requester => ctx.accounts.requester.to_account_info(),
    };
    move_lamports(
        &ctx.accounts.doctor.to_account_info(),
        &recipient_info,
        settlement.reward,
    )?;

    for event in &settlement.events {
        emit_roll_event(event);
    }

    Ok(())
}

fn emit_roll_event(event: &RollLogEvent) {
    match event {
        RollLogEvent::InProgress(e) => emit!(e.clone()),
        RollLogEvent::Complete(e) => emit!(e.clone()),
        RollLogEvent::Aborted(e) => emit!(e.clone()),
        RollLogEvent::Diagnosed(e) => emit!(e.clone()),
    }
}

pub fn fund_doctor(ctx: Context<FundDoctor>, amount: u64) -> Result<()> {
    if amount == 0 {
        return Ok(());
    }

    let ix = system_instruction::transfer(
        &ctx.accounts.funder.key(),
        &ctx.accounts.doctor.key(),
        amount,
    );

    invoke(
        &ix,
        &[
            ctx.accounts.funder.to_account_info(),
            ctx.accounts.doctor.to_account_info(),
            ctx.accounts.system_program.to_account_info(),
        ],
    )?;

    emit!(DoctorFunded {
        funder: ctx.accounts.funder.key(),
        amount,
    });
    Ok(())
}

// ----------------------------
// Views
// ----------------------------

pub fn is_rolling(ctx: Context<ViewDoctor>) -> Result<bool> {
    Ok(ctx.accounts.doctor.is_rolling())
}

pub fn get_probability(ctx: Context<ViewDoctor>, timestamp: i64) -> Result<u128> {
    let doctor = &ctx.accounts.doctor;
    Ok(probability_at(
        doctor.per_second_probability,
        doctor.probability_base_time(),
        timestamp,
    ))
}

pub fn get_reward_amount(ctx: Context<ViewDoctor>, timestamp: i64) -> Result<u64> {
    let doctor = &ctx.accounts.doctor;
    reward_amount(
        RewardParams {
            reward_per_year: doctor.reward_per_year,
            min_reward: doctor.min_reward,
        },
        doctor.last_roll_requested_time,
        timestamp,
    )
}

pub fn roll_stats(ctx: Context<ViewDoctor>) -> Result<RollStats> {
    let now = Clock::get()?.unix_timestamp;
    let doctor = &ctx.accounts.doctor;
    let reg = &ctx.accounts.registry;

    Ok(RollStats {
        is_rolling: doctor.is_rolling(),
        roll_count: doctor.roll_count,
        last_roll_requested_time: doctor.last_roll_requested_time,
        last_roll_applied_time: doctor.last_roll_applied_time,
        probability: probability_at(
            doctor.per_second_probability,
            doctor.probability_base_time(),
            now,
        ),
        reward_amount: reward_amount(
            RewardParams {
                reward_per_year: doctor.reward_per_year,
                min_reward: doctor.min_reward,
            },
            doctor.last_roll_requested_time,
            now,
        )?,
        minted_count: reg.minted_count,
        diagnosed_count: reg.diagnosed_count,
        eligible_count: reg.eligible.len() as u32,
    })
}
