use anchor_lang::prelude::*;
use anchor_lang::solana_program::instruction::Instruction;
use solana_sha256_hasher::hashv;

use crate::errors::MahinError;

// Ed25519SigVerify111111111111111111111111111
pub fn ed25519_program_id() -> Pubkey {
    Pubkey::new_from_array([
        3, 125, 70, 214, 124, 147, 251, 190, 18, 249, 66, 143, 131, 141, 64, 255,
        5, 112, 116, 73, 39, 244, 138, 100, 252, 202, 112, 68, 128, 0, 0, 0,
    ])
}

// -------------------------
// Oracle request seed
// -------------------------
pub fn request_seed(request_id: u64, requested_slot: u64, requester: &Pubkey) -> [u8; 32] {
    hashv(&[
        b"mahin:request".as_ref(),
        request_id.to_le_bytes().as_ref(),
        requested_slot.to_le_bytes().as_ref(),
        requester.as_ref(),
    ])
    .to_bytes()
}

// -------------------------
// Expected oracle fulfillment msg
// -------------------------
pub fn expected_randomness_msg(
    program_id: &Pubkey,
    request_id: u64,
    seed: &[u8; 32],
    randomness: &[u8; 32],
) -> Vec<u8> {
    let tag = b"mahin-protocol:randomness_v1";
    let mut out = Vec::with_capacity(tag.len() + 32 + 8 + 32 + 32);
    out.extend_from_slice(tag);
    out.extend_from_slice(program_id.as_ref());
    out.extend_from_slice(&request_id.to_le_bytes());
    out.extend_from_slice(seed);
    out.extend_from_slice(randomness);
    out
}

pub fn parse_ed25519_ix_pubkey_and_msg(ix: &Instruction) -> Result<(Pubkey, Vec<u8>)> {
    require!(
        ix.program_id == ed25519_program_id(),
        MahinError::MissingOrInvalidEd25519Ix
    );

    let data = &ix.data;
    require!(data.len() >= 16, MahinError::MissingOrInvalidEd25519Ix);

    let num_sigs = data[0];
    require!(num_sigs == 1, MahinError::MissingOrInvalidEd25519Ix);

    // Offsets must point into this same instruction (instruction_index == u16::MAX)
    let sig_ix = u16::from_le_bytes([data[4], data[5]]);
    let pk_ix = u16::from_le_bytes([data[8], data[9]]);
    let msg_ix = u16::from_le_bytes([data[14], data[15]]);
    require!(sig_ix == u16::MAX, MahinError::MissingOrInvalidEd25519Ix);
    require!(pk_ix == u16::MAX, MahinError::MissingOrInvalidEd25519Ix);
    require!(msg_ix == u16::MAX, MahinError::MissingOrInvalidEd25519Ix);

    let pk_off = u16::from_le_bytes([data[6], data[7]]) as usize;
    let msg_off = u16::from_le_bytes([data[10], data[11]]) as usize;
    let msg_sz = u16::from_le_bytes([data[12], data[13]]) as usize;

    require!(pk_off + 32 <= data.len(), MahinError::MissingOrInvalidEd25519Ix);
    require!(msg_off + msg_sz <= data.len(), MahinError::MissingOrInvalidEd25519Ix);

    let pk_bytes: [u8; 32] = data[pk_off..pk_off + 32]
        .try_into()
        .map_err(|_| error!(MahinError::MissingOrInvalidEd25519Ix))?;
    let msg = data[msg_off..msg_off + msg_sz].to_vec();

    Ok((Pubkey::new_from_array(pk_bytes), msg))
}

pub fn assert_ed25519_ix_matches(
    ix: &Instruction,
    expected_pubkey: &Pubkey,
    expected_msg: &[u8],
) -> Result<()> {
    let (pk, msg) = parse_ed25519_ix_pubkey_and_msg(ix)?;

    require_keys_eq!(pk, *expected_pubkey, MahinError::Ed25519PubkeyMismatch);
    require!(msg.as_slice() == expected_msg, MahinError::Ed25519MessageMismatch);

    Ok(())
}

// -------------------------
// Fallback: SlotHashes sysvar
// -------------------------
const SLOT_HASH_ENTRY_LEN: usize = 8 + 32;

/// Hash of the earliest slot strictly after `after_slot` held by the SlotHashes
/// sysvar. Layout: `u64 len` then `(u64 slot, [u8; 32] hash)` entries, newest first.
///
/// `None` until a later slot exists, and again once the window no longer reaches
/// back to `after_slot`: past that point the first slot after it is gone and any
/// held hash would depend on when the apply lands.
pub fn find_reveal_hash(data: &[u8], after_slot: u64) -> Result<Option<(u64, [u8; 32])>> {
    require!(data.len() >= 8, MahinError::InvalidSlotHashes);
    let n = u64::from_le_bytes(
        data[0..8]
            .try_into()
            .map_err(|_| error!(MahinError::InvalidSlotHashes))?,
    ) as usize;
    let held = n.min((data.len() - 8) / SLOT_HASH_ENTRY_LEN);

    let mut found = None;
    for i in 0..held {
        let off = 8 + i * SLOT_HASH_ENTRY_LEN;
        let slot = u64::from_le_bytes(
            data[off..off + 8]
                .try_into()
                .map_err(|_| error!(MahinError::InvalidSlotHashes))?,
        );
        if slot <= after_slot {
            // newest first: `found` is the earliest slot after the request
            return Ok(found);
        }
        let hash: [u8; 32] = data[off + 8..off + SLOT_HASH_ENTRY_LEN]
            .try_into()
            .map_err(|_| error!(MahinError::InvalidSlotHashes))?;
        found = Some((slot, hash));
    }
    Ok(None)
}

// -------------------------
// Roll draw
// -------------------------
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RollDraw {
    /// Uniform in [0, 2^64), compared against the 64.64 no-hit probability.
    pub draw: u64,
    /// Used to pick among eligible tokens.
    pub pick: u64,
}

impl RollDraw {
    pub fn is_hit(&self, no_hit_probability: u128) -> bool {
        self.draw as u128 >= no_hit_probability
    }

    pub fn pick_index(&self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        Some((self.pick % len as u64) as usize)
    }
}

pub fn roll_draw(randomness: &[u8; 32], roll_id: u64) -> RollDraw {
    let h = hashv(&[
        b"mahin:roll".as_ref(),
        randomness.as_ref(),
        roll_id.to_le_bytes().as_ref(),
    ])
    .to_bytes();

    let mut draw = [0u8; 8];
    let mut pick = [0u8; 8];
    draw.copy_from_slice(&h[0..8]);
    pick.copy_from_slice(&h[8..16]);

    RollDraw {
        draw: u64::from_le_bytes(draw),
        pick: u64::from_le_bytes(pick),
    }
}
