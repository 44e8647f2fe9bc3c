//! Two-phase roll lifecycle: `open_cycle` (request) then `resolve_cycle` (apply).
//!
//! The single `RollCycle` slot in the Doctor is the lock. Requests against an
//! open cycle are accepted and ignored; applies need an open, matured cycle and
//! consume it, so each cycle resolves at most once.

use anchor_lang::prelude::*;

use crate::{
    constants::*,
    errors::MahinError,
    events::{Diagnosed, RollComplete},
    probability::probability_at,
    randomness::{request_seed, roll_draw},
    registry::diagnose_core,
    reward::{capped_payout, reward_amount, RewardParams},
    roll_log::RollLogEvent,
    state::{Doctor, RandomnessSource, Registry, RollCycle, TokenData},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestOutcome {
    Opened(RollCycle),
    AlreadyRolling,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RollResolution {
    pub roll_id: u64,
    pub probability: u128,
    pub hit: bool,
    /// Token chosen for diagnosis; `None` on a miss or when nothing is eligible.
    pub selected: Option<u32>,
    pub reward: u64,
    pub recipient: Pubkey,
}

/// Which `apply_roll` account receives the reward.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Payee {
    Requester,
    Caller,
}

/// Everything `apply_roll` still has to do after the state is settled.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settlement {
    pub payee: Payee,
    pub reward: u64,
    /// In emission order: `Diagnosed` (if any) before `RollComplete`.
    pub events: Vec<RollLogEvent>,
}

pub fn open_cycle(
    doctor: &mut Doctor,
    requester: Pubkey,
    use_fallback: bool,
    now: i64,
    slot: u64,
) -> Result<RequestOutcome> {
    if doctor.is_rolling() {
        return Ok(RequestOutcome::AlreadyRolling);
    }
    let roll_probability = probability_at(
        doctor.per_second_probability,
        doctor.last_roll_requested_time,
        now,
    );

    let roll_id = doctor.roll_count;
    doctor.roll_count = doctor.roll_count.checked_add(1).ok_or(MahinError::MathOverflow)?;

    let mut cycle = RollCycle {
        roll_id,
        requested_at: now,
        requested_slot: slot,
        requester,
        roll_probability,
        use_fallback,
        ..RollCycle::default()
    };

    if !use_fallback {
        doctor.request_counter = doctor
            .request_counter
            .checked_add(1)
            .ok_or(MahinError::MathOverflow)?;
        cycle.request_id = doctor.request_counter;
        cycle.seed = request_seed(cycle.request_id, slot, &requester);
    }

    doctor.cycle = cycle;
    Ok(RequestOutcome::Opened(cycle))
}

pub fn check_fulfillable(cycle: &RollCycle, request_id: u64) -> Result<()> {
    require!(cycle.is_open(), MahinError::NoActiveCycle);
    require!(
        cycle.source() == RandomnessSource::ExternalOracle,
        MahinError::NotOracleCycle
    );
    require!(cycle.request_id == request_id, MahinError::RequestIdMismatch);
    require!(!cycle.fulfilled, MahinError::RandomnessAlreadyFulfilled);
    Ok(())
}

/// Oracle callback: stores the delivered value on the open cycle.
pub fn fulfill_cycle(doctor: &mut Doctor, request_id: u64, randomness: [u8; 32]) -> Result<()> {
    check_fulfillable(&doctor.cycle, request_id)?;

    let cycle = &mut doctor.cycle;
    cycle.randomness = randomness;
    cycle.fulfilled = true;
    Ok(())
}

/// Checks the open cycle can be applied at `current_slot`.
pub fn ensure_ready(cycle: &RollCycle, current_slot: u64) -> Result<()> {
    require!(cycle.is_open(), MahinError::NoActiveCycle);
    match cycle.source() {
        RandomnessSource::BlockHashFallback => {
            let ready_slot = cycle
                .requested_slot
                .checked_add(FALLBACK_REVEAL_DELAY_SLOTS)
                .ok_or(MahinError::MathOverflow)?;
            require!(current_slot >= ready_slot, MahinError::RollNotReady);
        }
        RandomnessSource::ExternalOracle => {
            require!(cycle.fulfilled, MahinError::RollNotReady);
        }
    }
    Ok(())
}

/// Whether the reward is still reserved for the requester at `now`.
pub fn reward_locked(doctor: &Doctor, now: i64) -> bool {
    now < doctor
        .cycle
        .requested_at
        .saturating_add(doctor.reward_lock_seconds)
}

/// Decides the outcome of the open cycle, closes it and advances the roll timing.
/// `available` is the Doctor balance above rent; the payout is capped to it.
pub fn resolve_cycle(
    doctor: &mut Doctor,
    registry: &Registry,
    randomness: &[u8; 32],
    caller: Pubkey,
    now: i64,
    available: u64,
) -> Result<RollResolution> {
    require!(doctor.is_rolling(), MahinError::NoActiveCycle);
    let cycle = doctor.cycle;

    let draw = roll_draw(randomness, cycle.roll_id);
    let hit = draw.is_hit(cycle.roll_probability);
    let selected = if hit {
        draw.pick_index(registry.eligible.len())
            .map(|i| registry.eligible[i])
    } else {
        None
    };

    let (recipient, reward_time) = if reward_locked(doctor, now) {
        (cycle.requester, cycle.requested_at)
    } else {
        (caller, now)
    };
    let params = RewardParams {
        reward_per_year: doctor.reward_per_year,
        min_reward: doctor.min_reward,
    };
    let reward = capped_payout(
        reward_amount(params, doctor.last_roll_requested_time, reward_time)?,
        available,
    );

    doctor.last_roll_requested_time = cycle.requested_at;
    doctor.last_roll_applied_time = now;
    doctor.cycle = RollCycle::default();

    Ok(RollResolution {
        roll_id: cycle.roll_id,
        probability: cycle.roll_probability,
        hit,
        selected,
        reward,
        recipient,
    })
}

/// Applies the open cycle: resolves it, diagnoses the selected token and
/// decides who is paid. `doctor` is left untouched when any check fails.
#[allow(clippy::too_many_arguments)]
pub fn settle_cycle(
    doctor: &mut Doctor,
    doctor_key: Pubkey,
    registry: &mut Registry,
    selected_token: Option<&mut TokenData>,
    requester: Pubkey,
    caller: Pubkey,
    randomness: &[u8; 32],
    now: i64,
    available: u64,
) -> Result<Settlement> {
    require!(doctor.is_rolling(), MahinError::NoActiveCycle);
    require_keys_eq!(requester, doctor.cycle.requester, MahinError::RequesterMismatch);
    require_keys_eq!(registry.doctor, doctor_key, MahinError::DoctorMismatch);

    let mut next = doctor.clone();
    let res = resolve_cycle(&mut next, registry, randomness, caller, now, available)?;

    let mut events = Vec::with_capacity(2);
    if let Some(token_id) = res.selected {
        let token = selected_token.ok_or(MahinError::SelectedTokenMismatch)?;
        require!(token.token_id == token_id, MahinError::SelectedTokenMismatch);

        diagnose_core(registry, token, now)?;
        events.push(RollLogEvent::Diagnosed(Diagnosed {
            token_id,
            roll_id: Some(res.roll_id),
        }));
    }
    events.push(RollLogEvent::Complete(RollComplete {
        roll_id: res.roll_id,
        applied_at: now,
        hit: res.hit,
        diagnosed: res.selected,
        reward: res.reward,
        recipient: res.recipient,
    }));

    *doctor = next;
    Ok(Settlement {
        payee: if res.recipient == caller {
            Payee::Caller
        } else {
            Payee::Requester
        },
        reward: res.reward,
        events,
    })
}

/// Admin escape hatch for a cycle whose randomness never arrives.
/// Timing is left untouched, so the curve keeps accruing from the last roll.
pub fn abort_cycle(doctor: &mut Doctor, now: i64) -> Result<u64> {
    require!(doctor.is_rolling(), MahinError::NoActiveCycle);
    require!(
        now >= doctor
            .cycle
            .requested_at
            .saturating_add(STUCK_CYCLE_TIMEOUT_SECONDS),
        MahinError::CycleNotStuck
    );
    let roll_id = doctor.cycle.roll_id;
    doctor.cycle = RollCycle::default();
    Ok(roll_id)
}


#[cfg(test)]
mod tests {
    use super::test_support::doctor;
    use super::*;
    use crate::events::RollInProgress;
    use crate::registry::{diagnose_core, test_support as fixtures};
    use crate::roll_log::RollLog;
    use crate::state::TokenData;

    const CREATE: i64 = 1_650_000_000;
    const DAY: i64 = 86_400;
    const SLOT: u64 = 1_000;
    const ONE_SOL: u64 = 1_000_000_000;

    fn error_code(err: anchor_lang::error::Error) -> u32 {
        match err {
            anchor_lang::error::Error::AnchorError(e) => e.error_code_number,
            other => panic!("unexpected error: {other:?}"),
        }
    }

    fn code(e: MahinError) -> u32 {
        e.into()
    }

    fn bytes(d: &Doctor) -> Vec<u8> {
        let mut buf = Vec::new();
        d.serialize(&mut buf).unwrap();
        buf
    }

    fn opened(outcome: RequestOutcome) -> RollCycle {
        match outcome {
            RequestOutcome::Opened(c) => c,
            RequestOutcome::AlreadyRolling => panic!("expected a new cycle"),
        }
    }

    /// Finds randomness whose draw hits (or misses) against `probability`.
    fn randomness_with(roll_id: u64, probability: u128, want_hit: bool) -> [u8; 32] {
        (0u8..=255)
            .map(|b| [b; 32])
            .find(|r| roll_draw(r, roll_id).is_hit(probability) == want_hit)
            .expect("some byte pattern produces the wanted outcome")
    }

    #[test]
    fn request_freezes_probability_and_requester() {
        let mut d = doctor(CREATE);
        let alice = Pubkey::new_unique();
        let now = CREATE + 355 * DAY + 1;

        let c = opened(open_cycle(&mut d, alice, true, now, SLOT).unwrap());
        assert_eq!(c.roll_id, 0);
        assert_eq!(c.requested_at, now);
        assert_eq!(c.requester, alice);
        assert!(c.use_fallback);
        assert_eq!(c.roll_probability, 17_973_766_558_782_450_225);
        assert_eq!(d.cycle, c);
        assert!(d.is_rolling());

        // timing is only advanced on apply
        assert_eq!(d.last_roll_requested_time, CREATE);
        assert_eq!(d.last_roll_applied_time, CREATE);

        // the curve is now measured from the open request
        assert_eq!(d.probability_base_time(), now);
    }

    #[test]
    fn second_request_is_a_noop() {
        let mut d = doctor(CREATE);
        let alice = Pubkey::new_unique();
        let bob = Pubkey::new_unique();

        opened(open_cycle(&mut d, alice, true, CREATE + DAY, SLOT).unwrap());
        let before = bytes(&d);

        let again = open_cycle(&mut d, bob, false, CREATE + DAY + 5, SLOT + 3).unwrap();
        assert_eq!(again, RequestOutcome::AlreadyRolling);
        assert_eq!(bytes(&d), before, "state must be byte-for-byte unchanged");
    }

    #[test]
    fn oracle_request_assigns_request_id_and_seed() {
        let mut d = doctor(CREATE);
        let alice = Pubkey::new_unique();
        let c = opened(open_cycle(&mut d, alice, false, CREATE + DAY, SLOT).unwrap());
        assert_eq!(c.request_id, 1);
        assert_eq!(c.seed, request_seed(1, SLOT, &alice));
        assert!(!c.fulfilled);
        assert_eq!(d.request_counter, 1);
    }

    #[test]
    fn fallback_apply_waits_two_slots() {
        let mut d = doctor(CREATE);
        opened(open_cycle(&mut d, Pubkey::new_unique(), true, CREATE + DAY, SLOT).unwrap());

        let err = ensure_ready(&d.cycle, SLOT).unwrap_err();
        assert_eq!(error_code(err), code(MahinError::RollNotReady));
        let err = ensure_ready(&d.cycle, SLOT + 1).unwrap_err();
        assert_eq!(error_code(err), code(MahinError::RollNotReady));

        assert!(ensure_ready(&d.cycle, SLOT + 2).is_ok());
        assert!(d.is_rolling(), "a failed readiness check leaves the cycle open");
    }

    #[test]
    fn oracle_apply_waits_for_fulfillment() {
        let mut d = doctor(CREATE);
        let c = opened(open_cycle(&mut d, Pubkey::new_unique(), false, CREATE + DAY, SLOT).unwrap());

        // slots alone do not mature an oracle cycle
        let err = ensure_ready(&d.cycle, SLOT + 100).unwrap_err();
        assert_eq!(error_code(err), code(MahinError::RollNotReady));

        let err = fulfill_cycle(&mut d, c.request_id + 1, [1u8; 32]).unwrap_err();
        assert_eq!(error_code(err), code(MahinError::RequestIdMismatch));

        fulfill_cycle(&mut d, c.request_id, [1u8; 32]).unwrap();
        assert!(ensure_ready(&d.cycle, SLOT).is_ok());

        let err = fulfill_cycle(&mut d, c.request_id, [2u8; 32]).unwrap_err();
        assert_eq!(error_code(err), code(MahinError::RandomnessAlreadyFulfilled));
        assert_eq!(d.cycle.randomness, [1u8; 32]);
    }

    #[test]
    fn fulfill_rejects_fallback_and_idle() {
        let mut d = doctor(CREATE);
        let err = fulfill_cycle(&mut d, 1, [1u8; 32]).unwrap_err();
        assert_eq!(error_code(err), code(MahinError::NoActiveCycle));

        opened(open_cycle(&mut d, Pubkey::new_unique(), true, CREATE + DAY, SLOT).unwrap());
        let err = fulfill_cycle(&mut d, 0, [1u8; 32]).unwrap_err();
        assert_eq!(error_code(err), code(MahinError::NotOracleCycle));
    }

    #[test]
    fn apply_without_cycle_fails() {
        let mut d = doctor(CREATE);
        let reg = fixtures::registry();
        let err = ensure_ready(&d.cycle, SLOT).unwrap_err();
        assert_eq!(error_code(err), code(MahinError::NoActiveCycle));
        let err = resolve_cycle(&mut d, &reg, &[0u8; 32], Pubkey::new_unique(), CREATE, 0).unwrap_err();
        assert_eq!(error_code(err), code(MahinError::NoActiveCycle));
    }

    #[test]
    fn apply_happens_at_most_once() {
        let mut d = doctor(CREATE);
        let reg = fixtures::registry();
        let alice = Pubkey::new_unique();
        opened(open_cycle(&mut d, alice, true, CREATE + DAY, SLOT).unwrap());

        ensure_ready(&d.cycle, SLOT + 2).unwrap();
        resolve_cycle(&mut d, &reg, &[7u8; 32], alice, CREATE + DAY + 10, 0).unwrap();
        assert!(!d.is_rolling());

        let err = ensure_ready(&d.cycle, SLOT + 3).unwrap_err();
        assert_eq!(error_code(err), code(MahinError::NoActiveCycle));
        let err = resolve_cycle(&mut d, &reg, &[7u8; 32], alice, CREATE + DAY + 11, 0).unwrap_err();
        assert_eq!(error_code(err), code(MahinError::NoActiveCycle));
    }

    #[test]
    fn apply_advances_timing() {
        let mut d = doctor(CREATE);
        let reg = fixtures::registry();
        let alice = Pubkey::new_unique();
        let requested = CREATE + DAY;
        let applied = CREATE + DAY + 300;

        opened(open_cycle(&mut d, alice, true, requested, SLOT).unwrap());
        assert_eq!(d.last_roll_applied_time, CREATE);

        resolve_cycle(&mut d, &reg, &[3u8; 32], alice, applied, 0).unwrap();
        assert_eq!(d.last_roll_applied_time, applied);
        assert_eq!(d.last_roll_requested_time, requested);
        assert_eq!(d.cycle, RollCycle::default());
        assert_eq!(d.probability_base_time(), requested);
    }

    #[test]
    fn guaranteed_hit_diagnoses_exactly_one_token() {
        let mut d = doctor(CREATE);
        let mut registry = fixtures::registry();
        let mut tokens: Vec<TokenData> = (1..=4).map(|id| fixtures::minted(&mut registry, id, CREATE)).collect();

        d.per_second_probability = 0;
        let alice = Pubkey::new_unique();
        let c = opened(open_cycle(&mut d, alice, true, CREATE + 10, SLOT).unwrap());
        assert_eq!(c.roll_probability, 0);

        let res = resolve_cycle(&mut d, &registry, &[5u8; 32], alice, CREATE + 20, 0).unwrap();
        assert!(res.hit);
        let chosen = res.selected.expect("eligible set is not empty");

        let mut newly_diagnosed = 0;
        for t in tokens.iter_mut() {
            if t.token_id == chosen {
                assert!(diagnose_core(&mut registry, t, CREATE + 20).unwrap());
                newly_diagnosed += 1;
            }
        }
        assert_eq!(newly_diagnosed, 1);
        assert_eq!(tokens.iter().filter(|t| t.diagnosed).count(), 1);
        assert_eq!(registry.eligible.len(), 3);
        assert!(!registry.eligible.contains(&chosen));
    }

    #[test]
    fn hit_with_nothing_eligible_still_completes() {
        let mut d = doctor(CREATE);
        let registry = fixtures::registry();
        d.per_second_probability = 0;
        let alice = Pubkey::new_unique();
        opened(open_cycle(&mut d, alice, true, CREATE + 10, SLOT).unwrap());

        let res = resolve_cycle(&mut d, &registry, &[5u8; 32], alice, CREATE + 20, 0).unwrap();
        assert!(res.hit);
        assert_eq!(res.selected, None);
        assert!(!d.is_rolling());
    }

    #[test]
    fn miss_selects_nothing() {
        let mut d = doctor(CREATE);
        let mut registry = fixtures::registry();
        fixtures::minted(&mut registry, 1, CREATE);
        let alice = Pubkey::new_unique();
        let c = opened(open_cycle(&mut d, alice, true, CREATE + DAY, SLOT).unwrap());

        let r = randomness_with(c.roll_id, c.roll_probability, false);
        let res = resolve_cycle(&mut d, &registry, &r, alice, CREATE + DAY + 10, 0).unwrap();
        assert!(!res.hit);
        assert_eq!(res.selected, None);
    }

    #[test]
    fn probability_one_never_hits() {
        let mut d = doctor(CREATE);
        let mut registry = fixtures::registry();
        fixtures::minted(&mut registry, 1, CREATE);
        d.per_second_probability = FIXED_ONE;
        let alice = Pubkey::new_unique();
        opened(open_cycle(&mut d, alice, true, CREATE + 10 * 365 * DAY, SLOT).unwrap());

        for b in 0u8..32 {
            let mut attempt = d.clone();
            let res = resolve_cycle(&mut attempt, &registry, &[b; 32], alice, CREATE + 10 * 365 * DAY + 5, 0).unwrap();
            assert!(!res.hit);
        }
    }

    #[test]
    fn requester_paid_at_request_time_within_lock() {
        let mut d = doctor(CREATE);
        let reg = fixtures::registry();
        let alice = Pubkey::new_unique();
        let bob = Pubkey::new_unique();
        let requested = CREATE + 30 * DAY + 1;

        opened(open_cycle(&mut d, alice, true, requested, SLOT).unwrap());
        // bob applies inside the lock window: the roll goes through, alice is paid
        let res = resolve_cycle(&mut d, &reg, &[1u8; 32], bob, requested + 10, ONE_SOL).unwrap();
        assert_eq!(res.recipient, alice);
        assert_eq!(res.reward, 65_753_450);
    }

    #[test]
    fn requester_reward_does_not_grow_while_locked() {
        let alice = Pubkey::new_unique();
        let requested = CREATE + 4;
        let mut rewards = Vec::new();
        for delay in [2, 1_800, 3_599] {
            let mut d = doctor(CREATE);
            let reg = fixtures::registry();
            opened(open_cycle(&mut d, alice, true, requested, SLOT).unwrap());
            let res = resolve_cycle(&mut d, &reg, &[1u8; 32], alice, requested + delay, ONE_SOL).unwrap();
            assert_eq!(res.recipient, alice);
            rewards.push(res.reward);
        }
        assert_eq!(rewards, vec![101, 101, 101]);
    }

    #[test]
    fn anyone_claims_after_lock_expires() {
        let mut d = doctor(CREATE);
        let reg = fixtures::registry();
        let alice = Pubkey::new_unique();
        let bob = Pubkey::new_unique();
        let requested = CREATE + 30 * DAY + 1;

        opened(open_cycle(&mut d, alice, true, requested, SLOT).unwrap());
        let applied = requested + 2 * 3600;
        let res = resolve_cycle(&mut d, &reg, &[1u8; 32], bob, applied, ONE_SOL).unwrap();
        assert_eq!(res.recipient, bob);
        // accrued up to the apply time
        assert_eq!(res.reward, 65_936_098);
    }

    #[test]
    fn reward_capped_to_balance() {
        let mut d = doctor(CREATE);
        let reg = fixtures::registry();
        let alice = Pubkey::new_unique();
        let requested = CREATE + 2 * 365 * DAY;
        let balance = ONE_SOL / 10;

        opened(open_cycle(&mut d, alice, true, requested, SLOT).unwrap());
        let res = resolve_cycle(&mut d, &reg, &[1u8; 32], alice, requested + 5, balance).unwrap();
        assert_eq!(res.reward, balance);
        assert!(res.reward <= balance);
    }

    #[test]
    fn unfunded_doctor_pays_nothing() {
        let mut d = doctor(CREATE);
        let reg = fixtures::registry();
        let alice = Pubkey::new_unique();
        opened(open_cycle(&mut d, alice, true, CREATE + 30 * DAY, SLOT).unwrap());
        let res = resolve_cycle(&mut d, &reg, &[1u8; 32], alice, CREATE + 30 * DAY + 5, 0).unwrap();
        assert_eq!(res.reward, 0);
    }

    #[test]
    fn probability_restarts_from_last_request() {
        let mut d = doctor(CREATE);
        let reg = fixtures::registry();
        let alice = Pubkey::new_unique();
        let first = CREATE + 355 * DAY + 1;
        let five_years = CREATE + 5 * 365 * DAY;

        assert_eq!(
            probability_at(d.per_second_probability, d.probability_base_time(), five_years),
            16_140_901_064_467_357_924
        );

        opened(open_cycle(&mut d, alice, true, first, SLOT).unwrap());
        let during = probability_at(d.per_second_probability, d.probability_base_time(), five_years);

        resolve_cycle(&mut d, &reg, &[1u8; 32], alice, first + 30, 0).unwrap();
        let after = probability_at(d.per_second_probability, d.probability_base_time(), five_years);

        assert_eq!(during, after);
        assert!(after > 16_140_901_064_467_357_924);
    }

    #[test]
    fn abort_requires_timeout() {
        let mut d = doctor(CREATE);
        let requested = CREATE + DAY;
        opened(open_cycle(&mut d, Pubkey::new_unique(), false, requested, SLOT).unwrap());

        let err = abort_cycle(&mut d, requested + STUCK_CYCLE_TIMEOUT_SECONDS - 1).unwrap_err();
        assert_eq!(error_code(err), code(MahinError::CycleNotStuck));
        assert!(d.is_rolling());

        assert_eq!(abort_cycle(&mut d, requested + STUCK_CYCLE_TIMEOUT_SECONDS).unwrap(), 0);
        assert!(!d.is_rolling());
        assert_eq!(d.last_roll_requested_time, CREATE);
        assert_eq!(d.last_roll_applied_time, CREATE);

        let err = abort_cycle(&mut d, requested + 2 * STUCK_CYCLE_TIMEOUT_SECONDS).unwrap_err();
        assert_eq!(error_code(err), code(MahinError::NoActiveCycle));
    }

    #[test]
    fn diagnosed_tokens_stay_diagnosed_across_rolls() {
        let mut d = doctor(CREATE);
        let mut registry = fixtures::registry();
        let mut tokens: Vec<TokenData> = (1..=3).map(|id| fixtures::minted(&mut registry, id, CREATE)).collect();
        d.per_second_probability = 0;
        let alice = Pubkey::new_unique();

        let mut now = CREATE;
        for round in 0..6u8 {
            now += 100;
            opened(open_cycle(&mut d, alice, true, now, SLOT + round as u64 * 10).unwrap());
            let res = resolve_cycle(&mut d, &registry, &[round; 32], alice, now + 5, 0).unwrap();
            if let Some(id) = res.selected {
                let t = tokens.iter_mut().find(|t| t.token_id == id).unwrap();
                assert!(!t.diagnosed, "only undiagnosed tokens are selected");
                diagnose_core(&mut registry, t, now + 5).unwrap();
            }
            let flags: Vec<bool> = tokens.iter().map(|t| t.diagnosed).collect();
            assert_eq!(flags.iter().filter(|f| **f).count() as u32, registry.diagnosed_count);
        }
        assert!(tokens.iter().all(|t| t.diagnosed));
        assert!(registry.eligible.is_empty());
    }

    /// Doctor, its key, a registry that authorizes it, and `n` minted tokens.
    fn table(n: u32) -> (Doctor, Pubkey, Registry, Vec<TokenData>) {
        let d = doctor(CREATE);
        let key = Pubkey::new_unique();
        let mut registry = fixtures::registry();
        registry.doctor = key;
        let tokens = (1..=n).map(|id| fixtures::minted(&mut registry, id, CREATE)).collect();
        (d, key, registry, tokens)
    }

    fn diagnosed_events(events: &[RollLogEvent]) -> Vec<&Diagnosed> {
        events
            .iter()
            .filter_map(|e| match e {
                RollLogEvent::Diagnosed(d) => Some(d),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn settle_rejects_foreign_requester() {
        let (mut d, key, mut reg, _) = table(0);
        let alice = Pubkey::new_unique();
        let bob = Pubkey::new_unique();
        opened(open_cycle(&mut d, alice, true, CREATE + DAY, SLOT).unwrap());
        let before = bytes(&d);

        let err = settle_cycle(&mut d, key, &mut reg, None, bob, bob, &[1u8; 32], CREATE + DAY + 5, ONE_SOL)
            .unwrap_err();
        assert_eq!(error_code(err), code(MahinError::RequesterMismatch));
        assert_eq!(bytes(&d), before);
    }

    #[test]
    fn settle_rejects_registry_for_another_doctor() {
        let (mut d, _, mut reg, _) = table(0);
        let alice = Pubkey::new_unique();
        opened(open_cycle(&mut d, alice, true, CREATE + DAY, SLOT).unwrap());

        let err = settle_cycle(
            &mut d,
            Pubkey::new_unique(),
            &mut reg,
            None,
            alice,
            alice,
            &[1u8; 32],
            CREATE + DAY + 5,
            ONE_SOL,
        )
        .unwrap_err();
        assert_eq!(error_code(err), code(MahinError::DoctorMismatch));
        assert!(d.is_rolling());
    }

    #[test]
    fn settle_without_cycle_fails() {
        let (mut d, key, mut reg, _) = table(0);
        let alice = Pubkey::new_unique();
        let err = settle_cycle(&mut d, key, &mut reg, None, alice, alice, &[1u8; 32], CREATE, 0).unwrap_err();
        assert_eq!(error_code(err), code(MahinError::NoActiveCycle));
    }

    #[test]
    fn settle_requires_the_selected_token_account() {
        let (mut d, key, mut reg, mut tokens) = table(4);
        d.per_second_probability = 0;
        let alice = Pubkey::new_unique();
        let requested = CREATE + DAY;
        let c = opened(open_cycle(&mut d, alice, true, requested, SLOT).unwrap());

        let r = [9u8; 32];
        let idx = roll_draw(&r, c.roll_id).pick_index(reg.eligible.len()).unwrap();
        let chosen = reg.eligible[idx];
        let wrong = tokens.iter().position(|t| t.token_id != chosen).unwrap();
        let right = tokens.iter().position(|t| t.token_id == chosen).unwrap();

        let err = settle_cycle(&mut d, key, &mut reg, None, alice, alice, &r, requested + 5, ONE_SOL)
            .unwrap_err();
        assert_eq!(error_code(err), code(MahinError::SelectedTokenMismatch));

        let err = settle_cycle(
            &mut d,
            key,
            &mut reg,
            Some(&mut tokens[wrong]),
            alice,
            alice,
            &r,
            requested + 5,
            ONE_SOL,
        )
        .unwrap_err();
        assert_eq!(error_code(err), code(MahinError::SelectedTokenMismatch));

        assert!(d.is_rolling(), "a rejected apply leaves the cycle open");
        assert_eq!(reg.diagnosed_count, 0);
        assert!(tokens.iter().all(|t| !t.diagnosed));

        let s = settle_cycle(
            &mut d,
            key,
            &mut reg,
            Some(&mut tokens[right]),
            alice,
            alice,
            &r,
            requested + 5,
            ONE_SOL,
        )
        .unwrap();
        assert!(!d.is_rolling());
        assert!(tokens[right].diagnosed);
        assert_eq!(tokens.iter().filter(|t| t.diagnosed).count(), 1);
        assert_eq!(reg.diagnosed_count, 1);
        assert!(!reg.eligible.contains(&chosen));

        assert_eq!(
            diagnosed_events(&s.events),
            vec![&Diagnosed { token_id: chosen, roll_id: Some(c.roll_id) }]
        );
    }

    #[test]
    fn diagnosis_is_emitted_before_completion() {
        let (mut d, key, mut reg, mut tokens) = table(3);
        d.per_second_probability = 0;
        let alice = Pubkey::new_unique();
        let requested = CREATE + DAY;
        let c = opened(open_cycle(&mut d, alice, true, requested, SLOT).unwrap());

        let r = [4u8; 32];
        let idx = roll_draw(&r, c.roll_id).pick_index(reg.eligible.len()).unwrap();
        let chosen = reg.eligible[idx];
        let token = tokens.iter_mut().find(|t| t.token_id == chosen).unwrap();

        let s = settle_cycle(&mut d, key, &mut reg, Some(token), alice, alice, &r, requested + 5, 0).unwrap();
        assert_eq!(s.events.len(), 2);
        assert!(matches!(s.events[0], RollLogEvent::Diagnosed(_)));
        match &s.events[1] {
            RollLogEvent::Complete(done) => {
                assert_eq!(done.roll_id, c.roll_id);
                assert!(done.hit);
                assert_eq!(done.diagnosed, Some(chosen));
                assert_eq!(done.applied_at, requested + 5);
            }
            other => panic!("expected completion, got {other:?}"),
        }

        // the indexer's fold accepts the stream as emitted
        let request = RollLogEvent::InProgress(RollInProgress {
            roll_id: c.roll_id,
            probability: c.roll_probability,
            requested_at: c.requested_at,
            use_fallback: c.use_fallback,
            requester: alice,
        });
        let stream: Vec<(&RollLogEvent, &str)> = std::iter::once((&request, "tx-request"))
            .chain(s.events.iter().map(|e| (e, "tx-apply")))
            .collect();
        let log = RollLog::replay(stream).unwrap();
        assert_eq!(log.get(c.roll_id).unwrap().diagnoses, vec![chosen]);
        assert_eq!(log.diagnosed_count, 1);
    }

    #[test]
    fn miss_emits_only_completion() {
        let (mut d, key, mut reg, mut tokens) = table(2);
        let alice = Pubkey::new_unique();
        let c = opened(open_cycle(&mut d, alice, true, CREATE + DAY, SLOT).unwrap());
        let r = randomness_with(c.roll_id, c.roll_probability, false);

        // a token passed on a miss is left alone
        let s = settle_cycle(
            &mut d,
            key,
            &mut reg,
            Some(&mut tokens[0]),
            alice,
            alice,
            &r,
            CREATE + DAY + 5,
            0,
        )
        .unwrap();
        assert!(diagnosed_events(&s.events).is_empty());
        assert_eq!(s.events.len(), 1);
        assert!(!tokens[0].diagnosed);
        assert_eq!(reg.diagnosed_count, 0);
    }

    #[test]
    fn settle_pays_requester_inside_lock() {
        let (mut d, key, mut reg, _) = table(0);
        let alice = Pubkey::new_unique();
        let bob = Pubkey::new_unique();
        let requested = CREATE + 30 * DAY + 1;
        opened(open_cycle(&mut d, alice, true, requested, SLOT).unwrap());

        let s = settle_cycle(&mut d, key, &mut reg, None, alice, bob, &[1u8; 32], requested + 10, ONE_SOL).unwrap();
        assert_eq!(s.payee, Payee::Requester);
        assert_eq!(s.reward, 65_753_450);
        match s.events.last() {
            Some(RollLogEvent::Complete(done)) => {
                assert_eq!(done.recipient, alice);
                assert_eq!(done.reward, 65_753_450);
            }
            other => panic!("expected completion, got {other:?}"),
        }
    }

    #[test]
    fn settle_pays_caller_after_lock() {
        let (mut d, key, mut reg, _) = table(0);
        let alice = Pubkey::new_unique();
        let bob = Pubkey::new_unique();
        let requested = CREATE + 30 * DAY + 1;
        opened(open_cycle(&mut d, alice, true, requested, SLOT).unwrap());

        let s = settle_cycle(
            &mut d,
            key,
            &mut reg,
            None,
            alice,
            bob,
            &[1u8; 32],
            requested + 2 * 3600,
            ONE_SOL,
        )
        .unwrap();
        assert_eq!(s.payee, Payee::Caller);
        assert_eq!(s.reward, 65_936_098);
        match s.events.last() {
            Some(RollLogEvent::Complete(done)) => assert_eq!(done.recipient, bob),
            other => panic!("expected completion, got {other:?}"),
        }
    }
}
