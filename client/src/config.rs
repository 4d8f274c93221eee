//! Smoke harness configuration

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use solana_sdk::{
    commitment_config::{CommitmentConfig, CommitmentLevel},
    pubkey::Pubkey,
};
use std::time::Duration;

use crate::retry::RetryPolicy;

/// Program ID of the deployed portfolio program on devnet
pub const DEVNET_PROGRAM_ID: Pubkey =
    solana_sdk::pubkey!("GMjxqNihJ5HrjDPDufCc7f7bmTxuMyP4G7xmC1H3XvnV");

/// Where `anchor build` leaves the program's IDL
pub const DEFAULT_IDL_PATH: &str = "target/idl/portfolio_program.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// RPC URL for Solana cluster
    pub rpc_url: String,

    /// Portfolio program ID
    #[serde(with = "pubkey_string")]
    pub program_id: Pubkey,

    /// Payer wallet keypair path
    pub keypair_path: String,

    /// Commitment used when reading accounts back
    pub commitment: CommitmentLevel,

    /// Commitment a submitted transaction must reach before we move on
    pub confirm_commitment: CommitmentLevel,

    /// Skip the preflight simulation when sending
    pub skip_preflight: bool,

    /// Wait after a create transaction before the first fetch
    pub settle_secs: u64,

    /// Wait after an update transaction before the first fetch
    pub update_settle_secs: u64,

    /// Number of account fetch attempts
    pub fetch_attempts: u32,

    /// Delay between account fetch attempts in seconds
    pub fetch_retry_secs: u64,

    /// Number of signature status polls before giving up
    pub confirm_attempts: u32,

    /// Delay between signature status polls in milliseconds
    pub confirm_poll_ms: u64,

    /// Warn when the payer holds less than this
    pub min_balance_lamports: u64,

    /// Workspace Anchor IDL to check against before running. When unset or
    /// missing the on-chain IDL is used instead.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idl_path: Option<String>,

    /// Suites to run, in order
    pub suites: Vec<String>,
}

impl Config {
    /// Load configuration from TOML file
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("PORTFOLIO_SMOKE_CONFIG")
            .unwrap_or_else(|_| "smoke-config.toml".to_string());

        Self::load_from(&config_path)
    }

    pub fn load_from(config_path: &str) -> Result<Self> {
        let config_str = std::fs::read_to_string(config_path)
            .context(format!("Failed to read config file: {}", config_path))?;

        let config: Config = toml::from_str(&config_str)
            .context("Failed to parse config TOML")?;

        Ok(config)
    }

    /// Create default configuration
    pub fn default_devnet() -> Self {
        Self {
            rpc_url: "https://api.devnet.solana.com".to_string(),
            program_id: DEVNET_PROGRAM_ID,
            keypair_path: "~/.config/solana/id.json".to_string(),
            commitment: CommitmentLevel::Finalized,
            confirm_commitment: CommitmentLevel::Confirmed,
            skip_preflight: true,
            settle_secs: 30,
            update_settle_secs: 45,
            fetch_attempts: 5,
            fetch_retry_secs: 5,
            confirm_attempts: 60,
            confirm_poll_ms: 1_000,
            min_balance_lamports: 50_000_000, // 0.05 SOL covers a few account rents
            idl_path: Some(DEFAULT_IDL_PATH.to_string()),
            suites: vec!["portfolio".to_string(), "game".to_string()],
        }
    }

    /// Let the Anchor provider variables take precedence over the file
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(
            std::env::var("ANCHOR_PROVIDER_URL").ok(),
            std::env::var("ANCHOR_WALLET").ok(),
        );
    }

    fn apply_overrides(&mut self, provider_url: Option<String>, wallet: Option<String>) {
        if let Some(url) = provider_url.filter(|u| !u.is_empty()) {
            log::info!("Using RPC URL from ANCHOR_PROVIDER_URL: {}", url);
            self.rpc_url = url;
        }
        if let Some(path) = wallet.filter(|p| !p.is_empty()) {
            log::info!("Using wallet from ANCHOR_WALLET: {}", path);
            self.keypair_path = path;
        }
    }

    /// Write default config to file
    pub fn write_default(path: &str) -> Result<()> {
        let config = Self::default_devnet();
        let toml_str = toml::to_string_pretty(&config)
            .context("Failed to serialize config")?;

        std::fs::write(path, toml_str)
            .context(format!("Failed to write config to {}", path))?;

        log::info!("Created default config at {}", path);
        Ok(())
    }

    pub fn read_commitment(&self) -> CommitmentConfig {
        CommitmentConfig {
            commitment: self.commitment,
        }
    }

    pub fn confirm_commitment(&self) -> CommitmentConfig {
        CommitmentConfig {
            commitment: self.confirm_commitment,
        }
    }

    pub fn fetch_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.fetch_attempts, Duration::from_secs(self.fetch_retry_secs))
    }

    pub fn confirm_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.confirm_attempts,
            Duration::from_millis(self.confirm_poll_ms),
        )
    }
}

/// Base58 strings in TOML instead of 32-element byte arrays
mod pubkey_string {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};
    use solana_sdk::pubkey::Pubkey;
    use std::str::FromStr;

    pub fn serialize<S: Serializer>(key: &Pubkey, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&key.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Pubkey, D::Error> {
        let s = String::deserialize(deserializer)?;
        Pubkey::from_str(&s).map_err(|e| D::Error::custom(format!("invalid pubkey {s}: {e}")))
    }
}
