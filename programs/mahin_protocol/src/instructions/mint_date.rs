use anchor_lang::prelude::*;

use crate::constants::*;
use crate::errors::MahinError;
use crate::state::MintDateRegistry;
use crate::{InitializeMintDateRegistry, UpdateMintDates, ViewMintDates};

pub fn initialize_mint_date_registry(
    ctx: Context<InitializeMintDateRegistry>,
    default_mint_date: Option<i64>,
) -> Result<()> {
    let reg = &mut ctx.accounts.mint_dates;
    reg.admin = ctx.accounts.admin.key();
    reg.bump = ctx.bumps.mint_dates;
    reg.default_mint_date = default_mint_date.unwrap_or(DEFAULT_MINT_DATE);
    reg.writers = Vec::new();
    reg.entries = Vec::new();
    reg.version = INITIAL_VERSION;
    Ok(())
}

pub fn add_writer(ctx: Context<UpdateMintDates>, writer: Pubkey) -> Result<()> {
    let reg = &mut ctx.accounts.mint_dates;
    require_keys_eq!(reg.admin, ctx.accounts.authority.key(), MahinError::Unauthorized);
    add_writer_core(reg, writer)
}

pub fn remove_writer(ctx: Context<UpdateMintDates>, writer: Pubkey) -> Result<()> {
    let reg = &mut ctx.accounts.mint_dates;
    require_keys_eq!(reg.admin, ctx.accounts.authority.key(), MahinError::Unauthorized);
    remove_writer_core(reg, writer)
}

pub fn set_mint_date_for_token(
    ctx: Context<UpdateMintDates>,
    token_id: u32,
    mint_date: i64,
) -> Result<()> {
    let writer = ctx.accounts.authority.key();
    set_mint_date_core(&mut ctx.accounts.mint_dates, &writer, token_id, mint_date)
}

pub fn get_mint_date_for_token(ctx: Context<ViewMintDates>, token_id: u32) -> Result<i64> {
    Ok(ctx.accounts.mint_dates.mint_date_for(token_id))
}

// -------------------------
// Core
// -------------------------

pub fn add_writer_core(reg: &mut MintDateRegistry, writer: Pubkey) -> Result<()> {
    require!(!reg.writers.contains(&writer), MahinError::WriterAlreadyExists);
    require!(reg.writers.len() < MAX_WRITERS, MahinError::WriterSetFull);
    reg.writers.push(writer);
    Ok(())
}

pub fn remove_writer_core(reg: &mut MintDateRegistry, writer: Pubkey) -> Result<()> {
    let pos = reg
        .writers
        .iter()
        .position(|w| *w == writer)
        .ok_or(MahinError::WriterNotFound)?;
    reg.writers.remove(pos);
    Ok(())
}

pub fn set_mint_date_core(
    reg: &mut MintDateRegistry,
    writer: &Pubkey,
    token_id: u32,
    mint_date: i64,
) -> Result<()> {
    require!(reg.is_writer(writer), MahinError::NotWriter);
    require!(token_id < MAX_TOKENS, MahinError::InvalidTokenId);

    let known = reg.entries.iter().any(|e| e.token_id == token_id);
    require!(
        known || reg.entries.len() < MAX_TOKENS as usize,
        MahinError::MintDateRegistryFull
    );
    reg.upsert(token_id, mint_date);
    Ok(())
}
