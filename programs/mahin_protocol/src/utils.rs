use anchor_lang::prelude::*;

use crate::{constants::BENEFICIARY_SHARE_BPS, errors::MahinError, reward::available_balance};

// -----------------
// Seeds
// -----------------
pub const REGISTRY_SEED: &[u8] = b"registry_v1";
pub const TOKEN_SEED: &[u8] = b"token_v1";
pub const TOKEN_MINT_SEED: &[u8] = b"token_mint_v1";
pub const HOLDER_SEED: &[u8] = b"token_holder_v1";

pub const DOCTOR_SEED: &[u8] = b"doctor_v1";

pub const MINT_DATES_SEED: &[u8] = b"mint_dates_v1";
pub const SELLER_SEED: &[u8] = b"seller_v1";

// -------------------------
// Lamports
// -------------------------

/// Lamports a program-owned account can pay out without dropping below rent exemption.
pub fn spendable_lamports(info: &AccountInfo) -> Result<u64> {
    let rent_min = Rent::get()?.minimum_balance(info.data_len());
    Ok(available_balance(info.lamports(), rent_min))
}

/// Moves lamports out of an account owned by this program.
pub fn move_lamports(from: &AccountInfo, to: &AccountInfo, amount: u64) -> Result<()> {
    if amount == 0 {
        return Ok(());
    }
    let from_balance = from.lamports();
    let to_balance = to.lamports();
    **from.try_borrow_mut_lamports()? = from_balance
        .checked_sub(amount)
        .ok_or(MahinError::NotEnoughFunds)?;
    **to.try_borrow_mut_lamports()? = to_balance
        .checked_add(amount)
        .ok_or(MahinError::MathOverflow)?;
    Ok(())
}

// -------------------------
// Sales
// -------------------------

/// `(beneficiary_share, treasury_share)` of a sale. Without a beneficiary the
/// treasury receives everything.
pub fn split_sale(price: u64, has_beneficiary: bool) -> Result<(u64, u64)> {
    if !has_beneficiary {
        return Ok((0, price));
    }
    let beneficiary = (price as u128)
        .checked_mul(BENEFICIARY_SHARE_BPS as u128)
        .ok_or(MahinError::MathOverflow)?
        / 10_000;
    let beneficiary = u64::try_from(beneficiary).map_err(|_| error!(MahinError::MathOverflow))?;
    let treasury = price.checked_sub(beneficiary).ok_or(MahinError::MathOverflow)?;
    Ok((beneficiary, treasury))
}
