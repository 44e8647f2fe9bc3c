use anchor_lang::prelude::*;
use anchor_lang::solana_program::sysvar::instructions::{
    load_current_index_checked, load_instruction_at_checked,
};

use crate::{
    errors::MahinError,
    events::RandomnessFulfilled,
    randomness::{assert_ed25519_ix_matches, expected_randomness_msg},
    roll::{check_fulfillable, fulfill_cycle},
    FulfillRandomness,
};

// Tx layout must be: [ ed25519_verify, fulfill_randomness ]
pub fn fulfill_randomness(
    ctx: Context<FulfillRandomness>,
    request_id: u64,
    randomness: [u8; 32],
) -> Result<()> {
    let doctor = &mut ctx.accounts.doctor;
    require!(doctor.oracle_pubkey != Pubkey::default(), MahinError::OracleNotSet);
    check_fulfillable(&doctor.cycle, request_id)?;

    // --- ed25519 introspection ---
    let ix_sys = ctx.accounts.instructions.to_account_info();
    let current_ix = load_current_index_checked(&ix_sys)? as usize;
    require!(current_ix >= 1, MahinError::MissingOrInvalidEd25519Ix);

    let ed_ix = load_instruction_at_checked(current_ix - 1, &ix_sys)
        .map_err(|_| error!(MahinError::MissingOrInvalidEd25519Ix))?;

    // signed over the seed of the open cycle
    let expected = expected_randomness_msg(
        ctx.program_id,
        request_id,
        &doctor.cycle.seed,
        &randomness,
    );
    assert_ed25519_ix_matches(&ed_ix, &doctor.oracle_pubkey, expected.as_slice())?;

    fulfill_cycle(doctor, request_id, randomness)?;

    emit!(RandomnessFulfilled {
        roll_id: doctor.cycle.roll_id,
        request_id,
    });
    Ok(())
}
