//! Transport seam between the scenarios and a cluster

use anyhow::{bail, Context, Result};
use solana_client::{
    nonblocking::rpc_client::RpcClient,
    rpc_config::{RpcSendTransactionConfig, RpcTransactionConfig},
};
use solana_sdk::{
    commitment_config::CommitmentConfig,
    instruction::Instruction,
    native_token::LAMPORTS_PER_SOL,
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
    transaction::Transaction,
};
use std::time::Duration;

use crate::config::Config;
use crate::retry::{poll_until, RetryPolicy};

/// A landed transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub signature: Signature,
    pub slot: Option<u64>,
    pub block_time: Option<i64>,
}

/// What a scenario needs from the cluster
#[allow(async_fn_in_trait)]
pub trait ProgramSession {
    /// Fee payer and owner of every account the scenarios create
    fn payer(&self) -> Pubkey;

    fn program_id(&self) -> Pubkey;

    /// Sign with the payer plus `extra_signers`, send, and wait for confirmation
    async fn submit(
        &self,
        instructions: &[Instruction],
        extra_signers: &[&Keypair],
    ) -> Result<Submission>;

    /// Raw account data, `None` while the account is not visible
    async fn fetch_account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>>;

    /// Give the cluster time to catch up
    async fn pause(&self, duration: Duration);
}

/// Session backed by a JSON-RPC endpoint
pub struct RpcSession {
    client: RpcClient,
    payer: Keypair,
    program_id: Pubkey,
    read_commitment: CommitmentConfig,
    confirm_commitment: CommitmentConfig,
    skip_preflight: bool,
    confirm_policy: RetryPolicy,
}

impl RpcSession {
    pub fn new(config: &Config, payer: Keypair) -> Self {
        let client = RpcClient::new_with_commitment(
            config.rpc_url.clone(),
            config.confirm_commitment(),
        );

        Self {
            client,
            payer,
            program_id: config.program_id,
            read_commitment: config.read_commitment(),
            confirm_commitment: config.confirm_commitment(),
            skip_preflight: config.skip_preflight,
            confirm_policy: config.confirm_policy(),
        }
    }

    pub fn client(&self) -> &RpcClient {
        &self.client
    }

    /// Check the program is deployed and report the payer's balance
    pub async fn preflight(&self, min_balance_lamports: u64) -> Result<()> {
        let program = self
            .client
            .get_account(&self.program_id)
            .await
            .context(format!("Program {} not found on cluster", self.program_id))?;

        if !program.executable {
            bail!("Account {} is not an executable program", self.program_id);
        }
        log::info!("Program {} is deployed (owner {})", self.program_id, program.owner);

        let balance = self
            .client
            .get_balance(&self.payer.pubkey())
            .await
            .context("Failed to fetch payer balance")?;
        log::info!(
            "Payer {} balance: {} SOL",
            self.payer.pubkey(),
            balance as f64 / LAMPORTS_PER_SOL as f64
        );
        if balance < min_balance_lamports {
            log::warn!(
                "Payer balance below {} lamports, transactions may fail",
                min_balance_lamports
            );
        }

        Ok(())
    }

    /// Poll the signature status until it reaches the confirm commitment
    async fn await_confirmation(&self, signature: &Signature) -> Result<()> {
        let commitment = self.confirm_commitment;

        let confirmed = poll_until(self.confirm_policy, || async move {
            let status = self
                .client
                .get_signature_status_with_commitment(signature, commitment)
                .await
                .context("Failed to fetch signature status")?;

            match status {
                Some(Ok(())) => Ok(Some(())),
                Some(Err(e)) => bail!("Transaction failed: {}", e),
                None => {
                    log::debug!("Signature {} not yet {:?}", signature, commitment.commitment);
                    Ok(None)
                }
            }
        })
        .await?;

        if confirmed.is_none() {
            bail!(
                "Transaction {} not confirmed after {} polls",
                signature,
                self.confirm_policy.attempts
            );
        }

        log::info!("Transaction {} confirmed at {:?}", signature, commitment.commitment);
        Ok(())
    }

    /// Slot and block time for logging; failures here are not fatal
    async fn transaction_details(&self, signature: &Signature) -> (Option<u64>, Option<i64>) {
        let config = RpcTransactionConfig {
            commitment: Some(self.confirm_commitment),
            max_supported_transaction_version: Some(0),
            ..RpcTransactionConfig::default()
        };

        match self.client.get_transaction_with_config(signature, config).await {
            Ok(tx) => (Some(tx.slot), tx.block_time),
            Err(e) => {
                log::warn!("Could not fetch details for {}: {}", signature, e);
                (None, None)
            }
        }
    }
}

impl ProgramSession for RpcSession {
    fn payer(&self) -> Pubkey {
        self.payer.pubkey()
    }

    fn program_id(&self) -> Pubkey {
        self.program_id
    }

    async fn submit(
        &self,
        instructions: &[Instruction],
        extra_signers: &[&Keypair],
    ) -> Result<Submission> {
        let (recent_blockhash, _last_valid_height) = self
            .client
            .get_latest_blockhash_with_commitment(self.confirm_commitment)
            .await
            .context("Failed to fetch recent blockhash")?;

        let mut signers: Vec<&Keypair> = Vec::with_capacity(extra_signers.len() + 1);
        signers.push(&self.payer);
        signers.extend_from_slice(extra_signers);

        let transaction = Transaction::new_signed_with_payer(
            instructions,
            Some(&self.payer.pubkey()),
            &signers,
            recent_blockhash,
        );

        let send_config = RpcSendTransactionConfig {
            skip_preflight: self.skip_preflight,
            preflight_commitment: Some(self.confirm_commitment.commitment),
            ..RpcSendTransactionConfig::default()
        };
        let signature = self
            .client
            .send_transaction_with_config(&transaction, send_config)
            .await
            .context("Failed to send transaction")?;
        log::info!("Transaction signature: {}", signature);

        self.await_confirmation(&signature).await?;

        let (slot, block_time) = self.transaction_details(&signature).await;
        log::info!("Transaction details: slot={:?} block_time={:?}", slot, block_time);

        Ok(Submission {
            signature,
            slot,
            block_time,
        })
    }

    async fn fetch_account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>> {
        let response = self
            .client
            .get_account_with_commitment(address, self.read_commitment)
            .await
            .context(format!("Failed to fetch account {}", address))?;

        Ok(response.value.map(|account| account.data))
    }

    async fn pause(&self, duration: Duration) {
        if !duration.is_zero() {
            log::info!("Waiting {}s for the cluster to catch up...", duration.as_secs());
            tokio::time::sleep(duration).await;
        }
    }
}
