// programs/mahin_protocol/src/contexts.rs

use anchor_lang::prelude::*;
use anchor_lang::solana_program::sysvar::slot_hashes;
use anchor_spl::token::{Mint, Token, TokenAccount};

use crate::state::{Doctor, MintDateRegistry, Registry, Seller, TokenData};

// ----------------------------
// Registry
// ----------------------------

#[derive(Accounts)]
pub struct InitializeRegistry<'info> {
    #[account(
        init,
        payer = admin,
        space = 8 + Registry::INIT_SPACE,
        seeds = [crate::REGISTRY_SEED],
        bump
    )]
    pub registry: Account<'info, Registry>,

    #[account(mut)]
    pub admin: Signer<'info>,

    pub system_program: Program<'info, System>,
}

/// Shared by the registry setters (content host, minter, doctor).
#[derive(Accounts)]
pub struct UpdateRegistry<'info> {
    #[account(
        mut,
        seeds = [crate::REGISTRY_SEED],
        bump = registry.bump
    )]
    pub registry: Account<'info, Registry>,

    pub admin: Signer<'info>,
}

#[derive(Accounts)]
#[instruction(token_id: u32)]
pub struct InitToken<'info> {
    #[account(
        mut,
        seeds = [crate::REGISTRY_SEED],
        bump = registry.bump
    )]
    pub registry: Account<'info, Registry>,

    #[account(
        init,
        payer = admin,
        space = 8 + TokenData::INIT_SPACE,
        seeds = [crate::TOKEN_SEED, token_id.to_le_bytes().as_ref()],
        bump
    )]
    pub token: Account<'info, TokenData>,

    #[account(mut)]
    pub admin: Signer<'info>,

    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
#[instruction(token_id: u32)]
pub struct StoreTokenData<'info> {
    #[account(
        seeds = [crate::REGISTRY_SEED],
        bump = registry.bump
    )]
    pub registry: Account<'info, Registry>,

    #[account(
        seeds = [crate::TOKEN_SEED, token_id.to_le_bytes().as_ref()],
        bump = token.bump
    )]
    pub token: Account<'info, TokenData>,

    pub admin: Signer<'info>,
}

#[derive(Accounts)]
#[instruction(token_id: u32)]
pub struct MintToken<'info> {
    #[account(
        mut,
        seeds = [crate::REGISTRY_SEED],
        bump = registry.bump
    )]
    pub registry: Account<'info, Registry>,

    #[account(
        mut,
        seeds = [crate::TOKEN_SEED, token_id.to_le_bytes().as_ref()],
        bump = token.bump
    )]
    pub token: Account<'info, TokenData>,

    #[account(
        init,
        payer = authority,
        seeds = [crate::TOKEN_MINT_SEED, token_id.to_le_bytes().as_ref()],
        bump,
        mint::decimals = 0,
        mint::authority = registry
    )]
    pub mint: Account<'info, Mint>,

    #[account(
        init,
        payer = authority,
        seeds = [crate::HOLDER_SEED, token_id.to_le_bytes().as_ref()],
        bump,
        token::mint = mint,
        token::authority = recipient
    )]
    pub holder: Account<'info, TokenAccount>,

    /// CHECK: receives the NFT; only its key is used as the holder authority.
    pub recipient: UncheckedAccount<'info>,

    /// Admin or registry minter. Pays for the new accounts.
    #[account(mut)]
    pub authority: Signer<'info>,

    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
    pub rent: Sysvar<'info, Rent>,
}

#[derive(Accounts)]
#[instruction(token_id: u32)]
pub struct Diagnose<'info> {
    #[account(
        mut,
        seeds = [crate::REGISTRY_SEED],
        bump = registry.bump
    )]
    pub registry: Account<'info, Registry>,

    #[account(
        mut,
        seeds = [crate::TOKEN_SEED, token_id.to_le_bytes().as_ref()],
        bump = token.bump
    )]
    pub token: Account<'info, TokenData>,

    pub admin: Signer<'info>,
}

#[derive(Accounts)]
#[instruction(token_id: u32)]
pub struct TokenUri<'info> {
    #[account(
        seeds = [crate::REGISTRY_SEED],
        bump = registry.bump
    )]
    pub registry: Account<'info, Registry>,

    #[account(
        seeds = [crate::TOKEN_SEED, token_id.to_le_bytes().as_ref()],
        bump = token.bump
    )]
    pub token: Account<'info, TokenData>,
}

// ----------------------------
// Doctor
// ----------------------------

#[derive(Accounts)]
pub struct InitializeDoctor<'info> {
    #[account(
        seeds = [crate::REGISTRY_SEED],
        bump = registry.bump
    )]
    pub registry: Account<'info, Registry>,

    #[account(
        init,
        payer = admin,
        space = 8 + Doctor::INIT_SPACE,
        seeds = [crate::DOCTOR_SEED],
        bump
    )]
    pub doctor: Account<'info, Doctor>,

    #[account(mut)]
    pub admin: Signer<'info>,

    pub system_program: Program<'info, System>,
}

/// Shared by the Doctor admin setters and `force_clear_roll`.
#[derive(Accounts)]
pub struct UpdateDoctor<'info> {
    #[account(
        mut,
        seeds = [crate::DOCTOR_SEED],
        bump = doctor.bump
    )]
    pub doctor: Account<'info, Doctor>,

    pub admin: Signer<'info>,
}

#[derive(Accounts)]
pub struct FundDoctor<'info> {
    #[account(
        mut,
        seeds = [crate::DOCTOR_SEED],
        bump = doctor.bump
    )]
    pub doctor: Account<'info, Doctor>,

    #[account(mut)]
    pub funder: Signer<'info>,

    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
pub struct RequestRoll<'info> {
    #[account(
        mut,
        seeds = [crate::DOCTOR_SEED],
        bump = doctor.bump
    )]
    pub doctor: Account<'info, Doctor>,

    pub requester: Signer<'info>,
}

#[derive(Accounts)]
pub struct ApplyRoll<'info> {
    #[account(
        mut,
        seeds = [crate::DOCTOR_SEED],
        bump = doctor.bump
    )]
    pub doctor: Account<'info, Doctor>,

    #[account(
        mut,
        seeds = [crate::REGISTRY_SEED],
        bump = registry.bump,
        address = doctor.registry
    )]
    pub registry: Account<'info, Registry>,

    /// Token picked by the roll, required only on a diagnosis.
    #[account(mut)]
    pub selected_token: Option<Account<'info, TokenData>>,

    /// CHECK: must equal the open cycle's requester (checked in handler); paid inside the lock window.
    #[account(mut)]
    pub requester: UncheckedAccount<'info>,

    #[account(mut)]
    pub caller: Signer<'info>,

    /// CHECK: SlotHashes sysvar. Address enforced.
    #[account(address = slot_hashes::ID)]
    pub slot_hashes: UncheckedAccount<'info>,
}

#[derive(Accounts)]
pub struct FulfillRandomness<'info> {
    #[account(
        mut,
        seeds = [crate::DOCTOR_SEED],
        bump = doctor.bump
    )]
    pub doctor: Account<'info, Doctor>,

    /// CHECK: instruction sysvar (for ed25519 introspection). Address enforced.
    #[account(address = anchor_lang::solana_program::sysvar::instructions::ID)]
    pub instructions: UncheckedAccount<'info>,
}

#[derive(Accounts)]
pub struct ViewDoctor<'info> {
    #[account(
        seeds = [crate::DOCTOR_SEED],
        bump = doctor.bump
    )]
    pub doctor: Account<'info, Doctor>,

    #[account(
        seeds = [crate::REGISTRY_SEED],
        bump = registry.bump,
        address = doctor.registry
    )]
    pub registry: Account<'info, Registry>,
}

// ----------------------------
// MintDateRegistry
// ----------------------------

#[derive(Accounts)]
pub struct InitializeMintDateRegistry<'info> {
    #[account(
        init,
        payer = admin,
        space = 8 + MintDateRegistry::INIT_SPACE,
        seeds = [crate::MINT_DATES_SEED],
        bump
    )]
    pub mint_dates: Account<'info, MintDateRegistry>,

    #[account(mut)]
    pub admin: Signer<'info>,

    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
pub struct UpdateMintDates<'info> {
    #[account(
        mut,
        seeds = [crate::MINT_DATES_SEED],
        bump = mint_dates.bump
    )]
    pub mint_dates: Account<'info, MintDateRegistry>,

    /// Admin for writer management, admin or writer for dates.
    pub authority: Signer<'info>,
}

#[derive(Accounts)]
pub struct ViewMintDates<'info> {
    #[account(
        seeds = [crate::MINT_DATES_SEED],
        bump = mint_dates.bump
    )]
    pub mint_dates: Account<'info, MintDateRegistry>,
}

// ----------------------------
// Seller
// ----------------------------

#[derive(Accounts)]
pub struct InitializeSeller<'info> {
    #[account(
        init,
        payer = admin,
        space = 8 + Seller::INIT_SPACE,
        seeds = [crate::SELLER_SEED],
        bump
    )]
    pub seller: Account<'info, Seller>,

    #[account(mut)]
    pub admin: Signer<'info>,

    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
pub struct UpdateSeller<'info> {
    #[account(
        mut,
        seeds = [crate::SELLER_SEED],
        bump = seller.bump
    )]
    pub seller: Account<'info, Seller>,

    pub admin: Signer<'info>,
}

#[derive(Accounts)]
#[instruction(token_id: u32)]
pub struct Purchase<'info> {
    #[account(
        mut,
        seeds = [crate::SELLER_SEED],
        bump = seller.bump
    )]
    pub seller: Account<'info, Seller>,

    #[account(
        mut,
        seeds = [crate::REGISTRY_SEED],
        bump = registry.bump
    )]
    pub registry: Account<'info, Registry>,

    #[account(
        mut,
        seeds = [crate::TOKEN_SEED, token_id.to_le_bytes().as_ref()],
        bump = token.bump
    )]
    pub token: Account<'info, TokenData>,

    #[account(
        init,
        payer = buyer,
        seeds = [crate::TOKEN_MINT_SEED, token_id.to_le_bytes().as_ref()],
        bump,
        mint::decimals = 0,
        mint::authority = registry
    )]
    pub mint: Account<'info, Mint>,

    #[account(
        init,
        payer = buyer,
        seeds = [crate::HOLDER_SEED, token_id.to_le_bytes().as_ref()],
        bump,
        token::mint = mint,
        token::authority = buyer
    )]
    pub holder: Account<'info, TokenAccount>,

    #[account(mut)]
    pub buyer: Signer<'info>,

    /// CHECK: lamport recipient. Address enforced against seller.treasury.
    #[account(mut, address = seller.treasury)]
    pub treasury: UncheckedAccount<'info>,

    /// CHECK: lamport recipient, required when seller.beneficiary is set (checked in handler).
    #[account(mut)]
    pub beneficiary: Option<UncheckedAccount<'info>>,

    /// Records the purchase time as mint date when the seller is a writer.
    #[account(mut)]
    pub mint_dates: Option<Account<'info, MintDateRegistry>>,

    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
    pub rent: Sysvar<'info, Rent>,
}
