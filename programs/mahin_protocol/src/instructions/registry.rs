use anchor_lang::prelude::*;
use anchor_spl::token::spl_token::instruction::AuthorityType;
use anchor_spl::token::{self, Mint, MintTo, SetAuthority, Token, TokenAccount};

use crate::constants::*;
use crate::errors::MahinError;
use crate::events::{Diagnosed, TokenDataStorage, TokenMinted};
use crate::registry::{diagnose_core, init_token_core, register_mint, resolve_uri};
use crate::state::Registry;
use crate::{Diagnose, InitToken, InitializeRegistry, MintToken, StoreTokenData, TokenUri, UpdateRegistry};

pub fn initialize_registry(ctx: Context<InitializeRegistry>, content_host: String) -> Result<()> {
    require!(
        content_host.len() <= MAX_CONTENT_HOST_LEN,
        MahinError::ContentHostTooLong
    );

    let reg = &mut ctx.accounts.registry;
    reg.admin = ctx.accounts.admin.key();
    reg.bump = ctx.bumps.registry;
    reg.minter = Pubkey::default();
    reg.doctor = Pubkey::default();
    reg.content_host = content_host;
    reg.token_count = 0;
    reg.minted_count = 0;
    reg.diagnosed_count = 0;
    reg.eligible = Vec::new();
    reg.version = INITIAL_VERSION;

    Ok(())
}

pub fn set_content_host(ctx: Context<UpdateRegistry>, content_host: String) -> Result<()> {
    let reg = &mut ctx.accounts.registry;
    require_keys_eq!(reg.admin, ctx.accounts.admin.key(), MahinError::Unauthorized);
    require!(
        content_host.len() <= MAX_CONTENT_HOST_LEN,
        MahinError::ContentHostTooLong
    );

    reg.content_host = content_host;
    Ok(())
}

pub fn set_minter(ctx: Context<UpdateRegistry>, minter: Pubkey) -> Result<()> {
    let reg = &mut ctx.accounts.registry;
    require_keys_eq!(reg.admin, ctx.accounts.admin.key(), MahinError::Unauthorized);

    reg.minter = minter;
    Ok(())
}

pub fn set_doctor(ctx: Context<UpdateRegistry>, doctor: Pubkey) -> Result<()> {
    let reg = &mut ctx.accounts.registry;
    require_keys_eq!(reg.admin, ctx.accounts.admin.key(), MahinError::Unauthorized);

    reg.doctor = doctor;
    Ok(())
}

pub fn init_token(
    ctx: Context<InitToken>,
    token_id: u32,
    name: String,
    content: Vec<String>,
) -> Result<()> {
    let reg = &mut ctx.accounts.registry;
    require_keys_eq!(reg.admin, ctx.accounts.admin.key(), MahinError::Unauthorized);

    init_token_core(
        reg,
        &mut ctx.accounts.token,
        token_id,
        ctx.bumps.token,
        name,
        content,
    )
}

pub fn store_token_data(
    ctx: Context<StoreTokenData>,
    token_id: u32,
    state_index: u8,
    payload: String,
) -> Result<()> {
    let reg = &ctx.accounts.registry;
    require_keys_eq!(reg.admin, ctx.accounts.admin.key(), MahinError::Unauthorized);
    require!(
        (state_index as usize) < ctx.accounts.token.content.len(),
        MahinError::InvalidContent
    );

    emit!(TokenDataStorage {
        token_id,
        state_index,
        payload,
    });
    Ok(())
}

pub fn mint_token(ctx: Context<MintToken>, token_id: u32) -> Result<()> {
    require!(
        ctx.accounts.registry.can_mint(&ctx.accounts.authority.key()),
        MahinError::Unauthorized
    );
    require!(!ctx.accounts.token.minted, MahinError::TokenAlreadyMinted);

    mint_single(
        &ctx.accounts.token_program,
        &ctx.accounts.registry,
        &ctx.accounts.mint,
        &ctx.accounts.holder,
    )?;

    let owner = ctx.accounts.recipient.key();
    let mint = ctx.accounts.mint.key();
    let now = Clock::get()?.unix_timestamp;
    register_mint(
        &mut ctx.accounts.registry,
        &mut ctx.accounts.token,
        owner,
        mint,
        now,
    )?;

    emit!(TokenMinted { token_id, owner, mint });
    Ok(())
}

/// Mints the single unit of a token's SPL mint to `holder` and revokes the mint
/// authority, fixing supply at one.
pub(crate) fn mint_single<'info>(
    token_program: &Program<'info, Token>,
    registry: &Account<'info, Registry>,
    mint: &Account<'info, Mint>,
    holder: &Account<'info, TokenAccount>,
) -> Result<()> {
    let signer_seeds: &[&[&[u8]]] = &[&[crate::REGISTRY_SEED, &[registry.bump]]];

    token::mint_to(
        CpiContext::new_with_signer(
            token_program.to_account_info(),
            MintTo {
                mint: mint.to_account_info(),
                to: holder.to_account_info(),
                authority: registry.to_account_info(),
            },
            signer_seeds,
        ),
        1,
    )?;

    token::set_authority(
        CpiContext::new_with_signer(
            token_program.to_account_info(),
            SetAuthority {
                current_authority: registry.to_account_info(),
                account_or_mint: mint.to_account_info(),
            },
            signer_seeds,
        ),
        AuthorityType::MintTokens,
        None,
    )?;

    Ok(())
}

pub fn diagnose(ctx: Context<Diagnose>, token_id: u32) -> Result<()> {
    let reg = &mut ctx.accounts.registry;
    require_keys_eq!(reg.admin, ctx.accounts.admin.key(), MahinError::Unauthorized);

    let now = Clock::get()?.unix_timestamp;
    if diagnose_core(reg, &mut ctx.accounts.token, now)? {
        emit!(Diagnosed {
            token_id,
            roll_id: None,
        });
    } else {
        msg!("token {} already diagnosed", token_id);
    }
    Ok(())
}

pub fn token_uri(ctx: Context<TokenUri>, _token_id: u32) -> Result<String> {
    require!(ctx.accounts.token.minted, MahinError::InvalidTokenId);
    Ok(resolve_uri(&ctx.accounts.registry, &ctx.accounts.token))
}
