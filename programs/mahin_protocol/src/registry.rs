use anchor_lang::prelude::*;

use crate::{constants::*, errors::MahinError, state::{Registry, TokenData}};

pub fn validate_content(content: &[String]) -> Result<()> {
    require!(
        (MIN_CONTENT_STATES..=MAX_CONTENT_STATES).contains(&content.len()),
        MahinError::InvalidContent
    );
    for pointer in content {
        require!(
            !pointer.is_empty() && pointer.len() <= MAX_CONTENT_POINTER_LEN,
            MahinError::InvalidContent
        );
    }
    Ok(())
}

pub fn init_token_core(
    registry: &mut Registry,
    token: &mut TokenData,
    token_id: u32,
    bump: u8,
    name: String,
    content: Vec<String>,
) -> Result<()> {
    require!(token_id < MAX_TOKENS, MahinError::InvalidTokenId);
    require!(name.len() <= MAX_TOKEN_NAME_LEN, MahinError::NameTooLong);
    validate_content(&content)?;

    token.token_id = token_id;
    token.bump = bump;
    token.name = name;
    token.content = content;
    token.minted = false;
    token.owner = Pubkey::default();
    token.mint = Pubkey::default();
    token.minted_at = 0;
    token.diagnosed = false;
    token.diagnosed_at = 0;

    registry.token_count = registry
        .token_count
        .checked_add(1)
        .ok_or(MahinError::MathOverflow)?;

    Ok(())
}

/// Marks a token as minted and makes it eligible for diagnosis.
pub fn register_mint(
    registry: &mut Registry,
    token: &mut TokenData,
    owner: Pubkey,
    mint: Pubkey,
    now: i64,
) -> Result<()> {
    require!(!token.minted, MahinError::TokenAlreadyMinted);
    require!(
        registry.eligible.len() < MAX_TOKENS as usize,
        MahinError::RegistryFull
    );

    token.minted = true;
    token.owner = owner;
    token.mint = mint;
    token.minted_at = now;

    if !token.diagnosed {
        registry.eligible.push(token.token_id);
    }
    registry.minted_count = registry
        .minted_count
        .checked_add(1)
        .ok_or(MahinError::MathOverflow)?;

    Ok(())
}

/// One-way diagnosis. Returns `false` (and changes nothing) if already diagnosed.
pub fn diagnose_core(registry: &mut Registry, token: &mut TokenData, now: i64) -> Result<bool> {
    require!(token.minted, MahinError::InvalidTokenId);
    if token.diagnosed {
        return Ok(false);
    }

    token.diagnosed = true;
    token.diagnosed_at = now;

    if let Some(pos) = registry.eligible.iter().position(|id| *id == token.token_id) {
        registry.eligible.swap_remove(pos);
    }
    registry.diagnosed_count = registry
        .diagnosed_count
        .checked_add(1)
        .ok_or(MahinError::MathOverflow)?;

    Ok(true)
}

pub fn resolve_uri(registry: &Registry, token: &TokenData) -> String {
    format!("{}{}", registry.content_host, token.current_pointer())
}
