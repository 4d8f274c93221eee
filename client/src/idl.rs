//! Compatibility check against the program's Anchor IDL
//!
//! Only the parts we rely on are read: instruction and account names, and the
//! discriminators newer Anchor versions emit. Older IDLs use camelCase
//! instruction names, so names are compared with case and underscores folded.
//!
//! The IDL comes from the workspace build output when present, otherwise from
//! the IDL account `anchor idl init` writes on chain.

use anyhow::{bail, Context, Result};
use flate2::read::ZlibDecoder;
use serde::Deserialize;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::pubkey::Pubkey;
use std::io::Read;
use std::path::Path;

use crate::discriminator::{account_discriminator, instruction_discriminator, Discriminator};
use crate::instruction::ALL_INSTRUCTIONS;
use crate::state::{AccountState, Game, Player, Portfolio, DISCRIMINATOR_LENGTH, PUBLIC_KEY_LENGTH};

/// Seed Anchor derives the IDL account address with
pub const IDL_SEED: &str = "anchor:idl";

/// Anchor's on-chain IDL account struct name
const IDL_ACCOUNT_NAME: &str = "IdlAccount";

/// discriminator, authority, then the u32 length of the zlib payload
const IDL_HEADER_LENGTH: usize = DISCRIMINATOR_LENGTH + PUBLIC_KEY_LENGTH + 4;

#[derive(Debug, Clone, Deserialize)]
pub struct Idl {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub instructions: Vec<IdlEntry>,
    #[serde(default)]
    pub accounts: Vec<IdlEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IdlEntry {
    pub name: String,
    #[serde(default)]
    pub discriminator: Option<Vec<u8>>,
}

fn fold(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

impl Idl {
    pub fn load(path: &str) -> Result<Self> {
        let expanded = shellexpand::tilde(path);
        let text = std::fs::read_to_string(expanded.as_ref())
            .context(format!("Failed to read IDL from {}", path))?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("Failed to parse IDL JSON")
    }

    /// Address of the program's on-chain IDL account
    pub fn onchain_address(program_id: &Pubkey) -> Result<Pubkey> {
        let (base, _bump) = Pubkey::find_program_address(&[], program_id);
        Pubkey::create_with_seed(&base, IDL_SEED, program_id)
            .context("Failed to derive IDL account address")
    }

    /// Decode an IDL account: discriminator, authority, length-prefixed zlib JSON
    pub fn from_account_data(data: &[u8]) -> Result<Self> {
        if data.len() < IDL_HEADER_LENGTH {
            bail!(
                "IDL account data is {} bytes, expected at least {}",
                data.len(),
                IDL_HEADER_LENGTH
            );
        }
        if data[..DISCRIMINATOR_LENGTH] != account_discriminator(IDL_ACCOUNT_NAME) {
            bail!("Account is not an Anchor IDL account");
        }

        let len_offset = DISCRIMINATOR_LENGTH + PUBLIC_KEY_LENGTH;
        let mut len_bytes = [0u8; 4];
        len_bytes.copy_from_slice(&data[len_offset..IDL_HEADER_LENGTH]);
        let len = u32::from_le_bytes(len_bytes) as usize;

        let compressed = data
            .get(IDL_HEADER_LENGTH..IDL_HEADER_LENGTH + len)
            .context(format!("IDL payload of {} bytes runs past the account", len))?;

        let mut text = String::new();
        ZlibDecoder::new(compressed)
            .read_to_string(&mut text)
            .context("Failed to inflate IDL payload")?;

        Self::parse(&text)
    }

    /// Fetch the IDL published on chain, `None` when the program has none
    pub async fn fetch_onchain(client: &RpcClient, program_id: &Pubkey) -> Result<Option<Self>> {
        let address = Self::onchain_address(program_id)?;
        let response = client
            .get_account_with_commitment(&address, client.commitment())
            .await
            .context(format!("Failed to fetch IDL account {}", address))?;

        match response.value {
            Some(account) => Ok(Some(Self::from_account_data(&account.data)?)),
            None => Ok(None),
        }
    }

    /// Workspace IDL file first, then the on-chain IDL. `None` when neither
    /// is available.
    pub async fn locate(
        path: Option<&str>,
        client: &RpcClient,
        program_id: &Pubkey,
    ) -> Result<Option<Self>> {
        if let Some(path) = path {
            let expanded = shellexpand::tilde(path);
            if Path::new(expanded.as_ref()).exists() {
                log::info!("Using IDL from {}", path);
                return Self::load(path).map(Some);
            }
            log::info!("No IDL at {}, trying the on-chain IDL", path);
        }

        let idl = Self::fetch_onchain(client, program_id).await?;
        if idl.is_some() {
            log::info!("Fetched IDL from chain for {}", program_id);
        }
        Ok(idl)
    }

    fn find<'a>(entries: &'a [IdlEntry], name: &str) -> Option<&'a IdlEntry> {
        let wanted = fold(name);
        entries.iter().find(|e| fold(&e.name) == wanted)
    }

    /// Fail with every missing or mismatched item listed
    pub fn check_compatible(&self, program_id: &str) -> Result<()> {
        let mut problems = Vec::new();

        if let Some(address) = &self.address {
            if address != program_id {
                problems.push(format!(
                    "IDL address {} differs from configured program {}",
                    address, program_id
                ));
            }
        }

        for ix_name in ALL_INSTRUCTIONS {
            match Self::find(&self.instructions, ix_name) {
                None => problems.push(format!("instruction {} missing", ix_name)),
                Some(entry) => {
                    check_discriminator(entry, instruction_discriminator(ix_name), &mut problems)
                }
            }
        }

        for account_name in [
            Portfolio::ACCOUNT_NAME,
            Game::ACCOUNT_NAME,
            Player::ACCOUNT_NAME,
        ] {
            match Self::find(&self.accounts, account_name) {
                None => problems.push(format!("account {} missing", account_name)),
                Some(entry) => {
                    check_discriminator(entry, account_discriminator(account_name), &mut problems)
                }
            }
        }

        if !problems.is_empty() {
            bail!("IDL incompatible: {}", problems.join("; "));
        }

        log::info!(
            "IDL matches: {} instructions, {} accounts",
            self.instructions.len(),
            self.accounts.len()
        );
        Ok(())
    }
}

fn check_discriminator(entry: &IdlEntry, expected: Discriminator, problems: &mut Vec<String>) {
    if let Some(found) = &entry.discriminator {
        if found.as_slice() != expected.as_slice() {
            problems.push(format!(
                "{} discriminator {:?} != expected {:?}",
                entry.name, found, expected
            ));
        }
    }
}
