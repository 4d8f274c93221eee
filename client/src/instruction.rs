//! Instruction builders for the portfolio program
//!
//! Data is the Anchor method discriminator followed by the Borsh-encoded
//! arguments in declaration order.

use borsh::BorshSerialize;
use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
    system_program,
};

use crate::discriminator::instruction_discriminator;
use crate::state::AccountName;

pub const INITIALIZE_PORTFOLIO: &str = "initialize_portfolio";
pub const UPDATE_PORTFOLIO: &str = "update_portfolio";
pub const INITIALIZE_GAME: &str = "initialize_game";
pub const UPDATE_GAME: &str = "update_game";
pub const REGISTER_PLAYER: &str = "register_player";
pub const UPDATE_PLAYER: &str = "update_player";

/// Every instruction the harness sends
pub const ALL_INSTRUCTIONS: [&str; 6] = [
    INITIALIZE_PORTFOLIO,
    UPDATE_PORTFOLIO,
    INITIALIZE_GAME,
    UPDATE_GAME,
    REGISTER_PLAYER,
    UPDATE_PLAYER,
];

/// Arguments of `update_portfolio`
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize)]
pub struct UpdatePortfolioArgs {
    pub new_name: String,
    pub nb_tokens: u32,
    pub nb_transactions: u32,
    pub amount_total_tokens: u32,
    pub amount_total_value_stablecoin: u32,
    pub date_portfolio: i32,
}

/// Arguments of `update_game`
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize)]
pub struct UpdateGameArgs {
    pub new_name: String,
    pub wallet_address: [u8; 32],
    pub total_max_players: u32,
    pub date_game: i32,
}

/// Arguments of `update_player`
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize)]
pub struct UpdatePlayerArgs {
    pub new_name: String,
    pub nb_games: u32,
}

fn encode<T: BorshSerialize>(ix_name: &str, args: &T) -> Vec<u8> {
    let mut data = instruction_discriminator(ix_name).to_vec();
    // writing into a Vec cannot fail
    args.serialize(&mut data)
        .unwrap_or_else(|e| unreachable!("borsh write to Vec failed: {e}"));
    data
}

/// Accounts for the create instructions: new account, payer, system program
fn create_accounts(target: &Pubkey, user: &Pubkey) -> Vec<AccountMeta> {
    vec![
        AccountMeta::new(*target, true),
        AccountMeta::new(*user, true),
        AccountMeta::new_readonly(system_program::ID, false),
    ]
}

/// Accounts for the update instructions: existing account, owner
fn update_accounts(target: &Pubkey, user: &Pubkey) -> Vec<AccountMeta> {
    vec![AccountMeta::new(*target, false), AccountMeta::new(*user, true)]
}

/// Build initialize_portfolio instruction
///
/// The portfolio account is created by the program, so its keypair must sign
/// alongside the payer.
pub fn initialize_portfolio(
    program_id: &Pubkey,
    portfolio: &Pubkey,
    user: &Pubkey,
    name: &AccountName,
) -> Instruction {
    Instruction {
        program_id: *program_id,
        accounts: create_accounts(portfolio, user),
        data: encode(INITIALIZE_PORTFOLIO, &name.as_str()),
    }
}

/// Build update_portfolio instruction
pub fn update_portfolio(
    program_id: &Pubkey,
    portfolio: &Pubkey,
    user: &Pubkey,
    args: &UpdatePortfolioArgs,
) -> Instruction {
    Instruction {
        program_id: *program_id,
        accounts: update_accounts(portfolio, user),
        data: encode(UPDATE_PORTFOLIO, args),
    }
}

/// Build initialize_game instruction
pub fn initialize_game(
    program_id: &Pubkey,
    game: &Pubkey,
    user: &Pubkey,
    name: &AccountName,
) -> Instruction {
    Instruction {
        program_id: *program_id,
        accounts: create_accounts(game, user),
        data: encode(INITIALIZE_GAME, &name.as_str()),
    }
}

/// Build update_game instruction
pub fn update_game(
    program_id: &Pubkey,
    game: &Pubkey,
    user: &Pubkey,
    args: &UpdateGameArgs,
) -> Instruction {
    Instruction {
        program_id: *program_id,
        accounts: update_accounts(game, user),
        data: encode(UPDATE_GAME, args),
    }
}

/// Build register_player instruction
pub fn register_player(
    program_id: &Pubkey,
    player: &Pubkey,
    user: &Pubkey,
    name: &AccountName,
) -> Instruction {
    Instruction {
        program_id: *program_id,
        accounts: create_accounts(player, user),
        data: encode(REGISTER_PLAYER, &name.as_str()),
    }
}

/// Build update_player instruction
pub fn update_player(
    program_id: &Pubkey,
    player: &Pubkey,
    user: &Pubkey,
    args: &UpdatePlayerArgs,
) -> Instruction {
    Instruction {
        program_id: *program_id,
        accounts: update_accounts(player, user),
        data: encode(UPDATE_PLAYER, args),
    }
}
