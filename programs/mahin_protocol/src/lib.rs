use anchor_lang::prelude::*;

pub mod constants;
pub mod contexts;
pub mod errors;
pub mod events;
pub mod instructions;
pub mod probability;
pub mod randomness;
pub mod registry;
pub mod reward;
pub mod roll;
pub mod roll_log;
pub mod state;
pub mod utils;

pub use constants::*;
pub use contexts::*;
pub use errors::*;
pub use events::*;
pub use state::*;
pub use utils::*;

use solana_security_txt::security_txt;

security_txt! {
    // Required fields
    name: "Project Mahin",
    project_url: "https://mahin.by-ma.art",
    contacts: "link:https://twitter.com/artbyma",
    policy: "https://mahin.by-ma.art",

    // Optional fields
    preferred_languages: "en,de"
}

declare_id!("BeL6tEnoVFSc3N74y3RVLJZELUN6iHePFPnnngqwTDEY");

#[program]
pub mod mahin_protocol {
    use super::*;
    use crate::instructions::{admin, mint_date, oracle, registry, roll, seller};

    // ----------------------------
    // Token registry
    // ----------------------------
    pub fn initialize_registry(ctx: Context<InitializeRegistry>, content_host: String) -> Result<()> {
        registry::initialize_registry(ctx, content_host)
    }

    pub fn set_content_host(ctx: Context<UpdateRegistry>, content_host: String) -> Result<()> {
        registry::set_content_host(ctx, content_host)
    }

    pub fn set_minter(ctx: Context<UpdateRegistry>, minter: Pubkey) -> Result<()> {
        registry::set_minter(ctx, minter)
    }

    pub fn set_doctor(ctx: Context<UpdateRegistry>, doctor: Pubkey) -> Result<()> {
        registry::set_doctor(ctx, doctor)
    }

    pub fn init_token(
        ctx: Context<InitToken>,
        token_id: u32,
        name: String,
        content: Vec<String>,
    ) -> Result<()> {
        registry::init_token(ctx, token_id, name, content)
    }

    pub fn store_token_data(
        ctx: Context<StoreTokenData>,
        token_id: u32,
        state_index: u8,
        payload: String,
    ) -> Result<()> {
        registry::store_token_data(ctx, token_id, state_index, payload)
    }

    pub fn mint_token(ctx: Context<MintToken>, token_id: u32) -> Result<()> {
        registry::mint_token(ctx, token_id)
    }

    pub fn diagnose(ctx: Context<Diagnose>, token_id: u32) -> Result<()> {
        registry::diagnose(ctx, token_id)
    }

    pub fn token_uri(ctx: Context<TokenUri>, token_id: u32) -> Result<String> {
        registry::token_uri(ctx, token_id)
    }

    // ----------------------------
    // Doctor admin
    // ----------------------------
    pub fn initialize_doctor(ctx: Context<InitializeDoctor>) -> Result<()> {
        admin::initialize_doctor(ctx)
    }

    pub fn set_per_second_probability(ctx: Context<UpdateDoctor>, per_second: u128) -> Result<()> {
        admin::set_per_second_probability(ctx, per_second)
    }

    pub fn set_last_roll_time(ctx: Context<UpdateDoctor>, timestamp: i64) -> Result<()> {
        admin::set_last_roll_time(ctx, timestamp)
    }

    pub fn set_reward_params(
        ctx: Context<UpdateDoctor>,
        reward_per_year: u64,
        min_reward: u64,
        reward_lock_seconds: i64,
    ) -> Result<()> {
        admin::set_reward_params(ctx, reward_per_year, min_reward, reward_lock_seconds)
    }

    pub fn set_oracle_pubkey(ctx: Context<UpdateDoctor>, oracle_pubkey: Pubkey) -> Result<()> {
        admin::set_oracle_pubkey(ctx, oracle_pubkey)
    }

    pub fn set_mint_date_registry(ctx: Context<UpdateDoctor>, mint_date_registry: Pubkey) -> Result<()> {
        admin::set_mint_date_registry(ctx, mint_date_registry)
    }

    pub fn force_clear_roll(ctx: Context<UpdateDoctor>) -> Result<()> {
        admin::force_clear_roll(ctx)
    }

    #[cfg(feature = "mock-randomness")]
    pub fn set_randomness_mock(ctx: Context<UpdateDoctor>, randomness: [u8; 32]) -> Result<()> {
        admin::set_randomness_mock(ctx, randomness)
    }

    // ----------------------------
    // Rolls
    // ----------------------------
    pub fn fund_doctor(ctx: Context<FundDoctor>, amount: u64) -> Result<()> {
        roll::fund_doctor(ctx, amount)
    }

    pub fn request_roll(ctx: Context<RequestRoll>, use_fallback: bool) -> Result<()> {
        roll::request_roll(ctx, use_fallback)
    }

    pub fn fulfill_randomness(
        ctx: Context<FulfillRandomness>,
        request_id: u64,
        randomness: [u8; 32],
    ) -> Result<()> {
        oracle::fulfill_randomness(ctx, request_id, randomness)
    }

    pub fn apply_roll(ctx: Context<ApplyRoll>) -> Result<()> {
        roll::apply_roll(ctx)
    }

    // views
    pub fn is_rolling(ctx: Context<ViewDoctor>) -> Result<bool> {
        roll::is_rolling(ctx)
    }

    pub fn get_probability(ctx: Context<ViewDoctor>, timestamp: i64) -> Result<u128> {
        roll::get_probability(ctx, timestamp)
    }

    pub fn get_reward_amount(ctx: Context<ViewDoctor>, timestamp: i64) -> Result<u64> {
        roll::get_reward_amount(ctx, timestamp)
    }

    pub fn roll_stats(ctx: Context<ViewDoctor>) -> Result<RollStats> {
        roll::roll_stats(ctx)
    }

    // ----------------------------
    // Mint dates
    // ----------------------------
    pub fn initialize_mint_date_registry(
        ctx: Context<InitializeMintDateRegistry>,
        default_mint_date: Option<i64>,
    ) -> Result<()> {
        mint_date::initialize_mint_date_registry(ctx, default_mint_date)
    }

    pub fn add_writer(ctx: Context<UpdateMintDates>, writer: Pubkey) -> Result<()> {
        mint_date::add_writer(ctx, writer)
    }

    pub fn remove_writer(ctx: Context<UpdateMintDates>, writer: Pubkey) -> Result<()> {
        mint_date::remove_writer(ctx, writer)
    }

    pub fn set_mint_date_for_token(
        ctx: Context<UpdateMintDates>,
        token_id: u32,
        mint_date: i64,
    ) -> Result<()> {
        mint_date::set_mint_date_for_token(ctx, token_id, mint_date)
    }

    pub fn get_mint_date_for_token(ctx: Context<ViewMintDates>, token_id: u32) -> Result<i64> {
        mint_date::get_mint_date_for_token(ctx, token_id)
    }

    // ----------------------------
    // Seller
    // ----------------------------
    pub fn initialize_seller(
        ctx: Context<InitializeSeller>,
        mint_price: Option<u64>,
        allocation: Vec<u32>,
    ) -> Result<()> {
        seller::initialize_seller(ctx, mint_price, allocation)
    }

    pub fn set_mint_price(ctx: Context<UpdateSeller>, mint_price: u64) -> Result<()> {
        seller::set_mint_price(ctx, mint_price)
    }

    pub fn set_treasury(ctx: Context<UpdateSeller>, treasury: Pubkey) -> Result<()> {
        seller::set_treasury(ctx, treasury)
    }

    pub fn set_beneficiary(ctx: Context<UpdateSeller>, beneficiary: Pubkey) -> Result<()> {
        seller::set_beneficiary(ctx, beneficiary)
    }

    pub fn enable_seller(ctx: Context<UpdateSeller>, enabled: bool) -> Result<()> {
        seller::enable_seller(ctx, enabled)
    }

    pub fn purchase(ctx: Context<Purchase>, token_id: u32) -> Result<()> {
        seller::purchase(ctx, token_id)
    }
}
