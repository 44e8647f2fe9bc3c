use anchor_lang::prelude::*;
use anchor_lang::solana_program::{program::invoke, system_instruction};

use crate::constants::*;
use crate::errors::MahinError;
use crate::events::{Purchased, TokenMinted};
use crate::instructions::mint_date::set_mint_date_core;
use crate::instructions::registry::mint_single;
use crate::registry::register_mint;
use crate::state::Seller;
use crate::utils::split_sale;
use crate::{InitializeSeller, Purchase, UpdateSeller};

pub fn initialize_seller(
    ctx: Context<InitializeSeller>,
    mint_price: Option<u64>,
    allocation: Vec<u32>,
) -> Result<()> {
    validate_allocation(&allocation)?;

    let seller = &mut ctx.accounts.seller;
    seller.admin = ctx.accounts.admin.key();
    seller.bump = ctx.bumps.seller;
    seller.enabled = false;
    seller.mint_price = mint_price.unwrap_or(DEFAULT_MINT_PRICE);
    seller.treasury = ctx.accounts.admin.key();
    seller.beneficiary = Pubkey::default();
    seller.allocation = allocation;
    seller.sold_count = 0;
    seller.version = INITIAL_VERSION;

    Ok(())
}

pub fn set_mint_price(ctx: Context<UpdateSeller>, mint_price: u64) -> Result<()> {
    let seller = &mut ctx.accounts.seller;
    require_keys_eq!(seller.admin, ctx.accounts.admin.key(), MahinError::Unauthorized);
    seller.mint_price = mint_price;
    Ok(())
}

pub fn set_treasury(ctx: Context<UpdateSeller>, treasury: Pubkey) -> Result<()> {
    let seller = &mut ctx.accounts.seller;
    require_keys_eq!(seller.admin, ctx.accounts.admin.key(), MahinError::Unauthorized);
    require!(treasury != Pubkey::default(), MahinError::TreasuryMismatch);
    seller.treasury = treasury;
    Ok(())
}

pub fn set_beneficiary(ctx: Context<UpdateSeller>, beneficiary: Pubkey) -> Result<()> {
    let seller = &mut ctx.accounts.seller;
    require_keys_eq!(seller.admin, ctx.accounts.admin.key(), MahinError::Unauthorized);
    seller.beneficiary = beneficiary;
    Ok(())
}

pub fn enable_seller(ctx: Context<UpdateSeller>, enabled: bool) -> Result<()> {
    let seller = &mut ctx.accounts.seller;
    require_keys_eq!(seller.admin, ctx.accounts.admin.key(), MahinError::Unauthorized);
    seller.enabled = enabled;
    Ok(())
}

pub fn purchase(ctx: Context<Purchase>, token_id: u32) -> Result<()> {
    let buyer = ctx.accounts.buyer.key();
    let seller_key = ctx.accounts.seller.key();

    let price = take_next(&mut ctx.accounts.seller, token_id, ctx.accounts.buyer.lamports())?;
    require_keys_eq!(ctx.accounts.registry.minter, seller_key, MahinError::Unauthorized);

    // --- payment ---
    let beneficiary = ctx.accounts.seller.beneficiary;
    let has_beneficiary = beneficiary != Pubkey::default();
    let (beneficiary_share, treasury_share) = split_sale(price, has_beneficiary)?;

    if beneficiary_share > 0 {
        let beneficiary_info = ctx
            .accounts
            .beneficiary
            .as_ref()
            .ok_or(MahinError::BeneficiaryMismatch)?;
        require_keys_eq!(beneficiary_info.key(), beneficiary, MahinError::BeneficiaryMismatch);
        pay(
            &ctx.accounts.buyer.to_account_info(),
            &beneficiary_info.to_account_info(),
            &ctx.accounts.system_program.to_account_info(),
            beneficiary_share,
        )?;
    }
    pay(
        &ctx.accounts.buyer.to_account_info(),
        &ctx.accounts.treasury.to_account_info(),
        &ctx.accounts.system_program.to_account_info(),
        treasury_share,
    )?;

    // --- mint ---
    mint_single(
        &ctx.accounts.token_program,
        &ctx.accounts.registry,
        &ctx.accounts.mint,
        &ctx.accounts.holder,
    )?;

    let now = Clock::get()?.unix_timestamp;
    let mint = ctx.accounts.mint.key();
    register_mint(
        &mut ctx.accounts.registry,
        &mut ctx.accounts.token,
        buyer,
        mint,
        now,
    )?;

    if let Some(mint_dates) = ctx.accounts.mint_dates.as_mut() {
        if mint_dates.is_writer(&seller_key) {
            set_mint_date_core(mint_dates, &seller_key, token_id, now)?;
        } else {
            msg!("seller is not a mint date writer, skipping");
        }
    }

    emit!(TokenMinted { token_id, owner: buyer, mint });
    emit!(Purchased { token_id, buyer, price });
    Ok(())
}

fn pay<'info>(
    from: &AccountInfo<'info>,
    to: &AccountInfo<'info>,
    system_program: &AccountInfo<'info>,
    amount: u64,
) -> Result<()> {
    if amount == 0 {
        return Ok(());
    }
    let ix = system_instruction::transfer(from.key, to.key, amount);
    invoke(&ix, &[from.clone(), to.clone(), system_program.clone()])?;
    Ok(())
}

// -------------------------
// Core
// -------------------------

pub fn validate_allocation(allocation: &[u32]) -> Result<()> {
    require!(
        allocation.len() <= MAX_TOKENS as usize,
        MahinError::InvalidAllocation
    );
    for (i, id) in allocation.iter().enumerate() {
        require!(*id < MAX_TOKENS, MahinError::InvalidAllocation);
        require!(!allocation[..i].contains(id), MahinError::InvalidAllocation);
    }
    Ok(())
}

/// Checks a purchase of `token_id` and pops it from the allocation. Returns the price.
pub fn take_next(seller: &mut Seller, token_id: u32, buyer_lamports: u64) -> Result<u64> {
    require!(seller.enabled, MahinError::SellerDisabled);
    let next = seller.next_token_id().ok_or(MahinError::SoldOut)?;
    require!(next == token_id, MahinError::InvalidTokenId);
    require!(buyer_lamports >= seller.mint_price, MahinError::NotEnoughFunds);

    seller.allocation.remove(0);
    seller.sold_count = seller
        .sold_count
        .checked_add(1)
        .ok_or(MahinError::MathOverflow)?;
    Ok(seller.mint_price)
}
