//! Client-side view of the accounts owned by the portfolio program
//!
//! Layouts follow the program's Anchor accounts: 8-byte discriminator, then
//! Borsh fields. Names are stored as fixed 50-byte, zero-padded arrays.

use anyhow::Context;
use borsh::BorshDeserialize;
use chrono::{DateTime, SecondsFormat, Utc};
use solana_sdk::pubkey::Pubkey;
use std::fmt;

use crate::discriminator::{account_discriminator, Discriminator};
use crate::error::{DecodeError, NameError};

pub const NAME_LENGTH: usize = 50;
pub const DISCRIMINATOR_LENGTH: usize = 8;
pub const PUBLIC_KEY_LENGTH: usize = 32;
pub const U32_LENGTH: usize = 4;
pub const INT_LENGTH: usize = 4;

/// Space the program allocates for portfolio accounts (game accounts too)
pub const PORTFOLIO_SIZE: usize = DISCRIMINATOR_LENGTH
    + NAME_LENGTH
    + PUBLIC_KEY_LENGTH
    + U32_LENGTH * 4
    + INT_LENGTH;

pub const PLAYER_SIZE: usize =
    DISCRIMINATOR_LENGTH + NAME_LENGTH + PUBLIC_KEY_LENGTH + U32_LENGTH;

/// A name the program will accept: letters and numbers, at most 50 bytes
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AccountName(String);

impl AccountName {
    pub fn parse(name: impl Into<String>) -> Result<Self, NameError> {
        let name = name.into();
        if !name.chars().all(char::is_alphanumeric) {
            return Err(NameError::InvalidFormat(name));
        }
        if name.len() > NAME_LENGTH {
            return Err(NameError::TooLong(name.len()));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Zero-padded on-chain representation
    pub fn to_field(&self) -> [u8; NAME_LENGTH] {
        let mut field = [0u8; NAME_LENGTH];
        field[..self.0.len()].copy_from_slice(self.0.as_bytes());
        field
    }
}

impl fmt::Display for AccountName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Read a stored name, dropping every NUL byte
pub fn decode_name(field: &[u8; NAME_LENGTH]) -> Result<String, NameError> {
    let bytes: Vec<u8> = field.iter().copied().filter(|b| *b != 0).collect();
    String::from_utf8(bytes).map_err(|_| NameError::NotUtf8)
}

/// Render a unix timestamp stored as i32
pub fn format_timestamp(ts: i32) -> String {
    DateTime::from_timestamp(i64::from(ts), 0)
        .map(|d| d.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_else(|| ts.to_string())
}

/// Unix seconds as the program's i32 timestamp
pub fn program_timestamp(secs: i64) -> anyhow::Result<i32> {
    i32::try_from(secs).context(format!(
        "Timestamp {} does not fit the program's i32 date fields",
        secs
    ))
}

pub fn now_timestamp() -> anyhow::Result<i32> {
    program_timestamp(Utc::now().timestamp())
}

/// An account type we can read back and print
pub trait AccountState: Sized {
    /// Anchor account struct name
    const ACCOUNT_NAME: &'static str;

    fn discriminator() -> Discriminator {
        account_discriminator(Self::ACCOUNT_NAME)
    }

    fn decode(data: &[u8]) -> Result<Self, DecodeError>;

    /// (label, value) pairs for console output
    fn describe(&self) -> Vec<(&'static str, String)>;
}

/// Check the discriminator and Borsh-decode the body, ignoring trailing bytes
fn decode_body<T: BorshDeserialize>(
    account: &'static str,
    expected: Discriminator,
    data: &[u8],
) -> Result<T, DecodeError> {
    if data.len() < DISCRIMINATOR_LENGTH {
        return Err(DecodeError::TooShort {
            account,
            len: data.len(),
            min: DISCRIMINATOR_LENGTH,
        });
    }

    let (head, mut body) = data.split_at(DISCRIMINATOR_LENGTH);
    let mut actual = [0u8; DISCRIMINATOR_LENGTH];
    actual.copy_from_slice(head);
    if actual != expected {
        return Err(DecodeError::Discriminator {
            account,
            expected,
            actual,
        });
    }

    T::deserialize(&mut body).map_err(|source| DecodeError::Borsh { account, source })
}

#[derive(BorshDeserialize)]
struct RawPortfolio {
    name: [u8; NAME_LENGTH],
    wallet_address: [u8; PUBLIC_KEY_LENGTH],
    nb_tokens: u32,
    nb_transactions: u32,
    amount_total_tokens: u32,
    amount_total_value_stablecoin: u32,
    date_portfolio: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Portfolio {
    pub name: String,
    pub wallet_address: Pubkey,
    pub nb_tokens: u32,
    pub nb_transactions: u32,
    pub amount_total_tokens: u32,
    pub amount_total_value_stablecoin: u32,
    pub date_portfolio: i32,
}

impl AccountState for Portfolio {
    const ACCOUNT_NAME: &'static str = "Portfolio";

    fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        let raw: RawPortfolio = decode_body("portfolio", Self::discriminator(), data)?;
        Ok(Self {
            name: decode_name(&raw.name)?,
            wallet_address: Pubkey::new_from_array(raw.wallet_address),
            nb_tokens: raw.nb_tokens,
            nb_transactions: raw.nb_transactions,
            amount_total_tokens: raw.amount_total_tokens,
            amount_total_value_stablecoin: raw.amount_total_value_stablecoin,
            date_portfolio: raw.date_portfolio,
        })
    }

    fn describe(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Portfolio name", self.name.clone()),
            ("Wallet address", self.wallet_address.to_string()),
            ("Number of tokens", self.nb_tokens.to_string()),
            ("Number of transactions", self.nb_transactions.to_string()),
            ("Total amount of tokens", self.amount_total_tokens.to_string()),
            (
                "Total value in stablecoin",
                self.amount_total_value_stablecoin.to_string(),
            ),
            ("Portfolio date", format_timestamp(self.date_portfolio)),
        ]
    }
}

#[derive(BorshDeserialize)]
struct RawGame {
    name: [u8; NAME_LENGTH],
    wallet_address: [u8; PUBLIC_KEY_LENGTH],
    total_max_players: u32,
    date_game: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Game {
    pub name: String,
    pub wallet_address: Pubkey,
    pub total_max_players: u32,
    pub date_game: i32,
}

impl AccountState for Game {
    const ACCOUNT_NAME: &'static str = "Game";

    fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        let raw: RawGame = decode_body("game", Self::discriminator(), data)?;
        Ok(Self {
            name: decode_name(&raw.name)?,
            wallet_address: Pubkey::new_from_array(raw.wallet_address),
            total_max_players: raw.total_max_players,
            date_game: raw.date_game,
        })
    }

    fn describe(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Game name", self.name.clone()),
            ("Game wallet address", self.wallet_address.to_string()),
            ("Game total max players", self.total_max_players.to_string()),
            ("Game date", format_timestamp(self.date_game)),
        ]
    }
}

#[derive(BorshDeserialize)]
struct RawPlayer {
    name: [u8; NAME_LENGTH],
    wallet_address: [u8; PUBLIC_KEY_LENGTH],
    nb_games: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub name: String,
    pub wallet_address: Pubkey,
    pub nb_games: u32,
}

impl AccountState for Player {
    const ACCOUNT_NAME: &'static str = "Player";

    fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        let raw: RawPlayer = decode_body("player", Self::discriminator(), data)?;
        Ok(Self {
            name: decode_name(&raw.name)?,
            wallet_address: Pubkey::new_from_array(raw.wallet_address),
            nb_games: raw.nb_games,
        })
    }

    fn describe(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Player name", self.name.clone()),
            ("Player wallet address", self.wallet_address.to_string()),
            ("Number of games", self.nb_games.to_string()),
        ]
    }
}
