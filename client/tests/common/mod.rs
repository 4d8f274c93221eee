//! In-memory stand-in for the cluster
//!
//! Applies the portfolio program's create/update instructions to a map of
//! accounts so the scenarios can run without a validator.

#![allow(dead_code)]

use anyhow::{anyhow, bail, Result};
use borsh::BorshDeserialize;
use portfolio_client::{
    discriminator::instruction_discriminator,
    session::{ProgramSession, Submission},
    state::{AccountName, AccountState, Game, Player, Portfolio, NAME_LENGTH, PORTFOLIO_SIZE},
};
use solana_sdk::{
    instruction::Instruction,
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::time::Duration;

#[derive(BorshDeserialize)]
struct NameArg {
    name: String,
}

#[derive(BorshDeserialize)]
struct PortfolioUpdate {
    new_name: String,
    nb_tokens: u32,
    nb_transactions: u32,
    amount_total_tokens: u32,
    amount_total_value_stablecoin: u32,
    date_portfolio: i32,
}

#[derive(BorshDeserialize)]
struct GameUpdate {
    new_name: String,
    wallet_address: [u8; 32],
    total_max_players: u32,
    date_game: i32,
}

#[derive(BorshDeserialize)]
struct PlayerUpdate {
    new_name: String,
    nb_games: u32,
}

pub const CLOCK: i32 = 1_700_000_000;

pub struct MemorySession {
    pub payer: Keypair,
    pub program_id: Pubkey,
    accounts: RefCell<HashMap<Pubkey, Vec<u8>>>,
    /// Fetches that report "not found" after each submit
    pub lag: Cell<u32>,
    pending_lag: Cell<u32>,
    /// Fetches of an updated account that still return its pre-update data
    pub stale_updates: Cell<u32>,
    pending_stale: Cell<u32>,
    before_submit: RefCell<HashMap<Pubkey, Vec<u8>>>,
    /// Reject the next N submits
    pub fail_submits: Cell<u32>,
    /// Ignore `nb_transactions` on portfolio updates
    pub drop_transaction_count: Cell<bool>,
    pub submissions: RefCell<Vec<Signature>>,
    pub pauses: RefCell<Vec<Duration>>,
    pub fetches: Cell<u32>,
}

impl MemorySession {
    pub fn new() -> Self {
        Self {
            payer: Keypair::new(),
            program_id: Pubkey::new_unique(),
            accounts: RefCell::new(HashMap::new()),
            lag: Cell::new(0),
            pending_lag: Cell::new(0),
            stale_updates: Cell::new(0),
            pending_stale: Cell::new(0),
            before_submit: RefCell::new(HashMap::new()),
            fail_submits: Cell::new(0),
            drop_transaction_count: Cell::new(false),
            submissions: RefCell::new(Vec::new()),
            pauses: RefCell::new(Vec::new()),
            fetches: Cell::new(0),
        }
    }

    pub fn account(&self, address: &Pubkey) -> Option<Vec<u8>> {
        self.accounts.borrow().get(address).cloned()
    }

    fn apply(&self, ix: &Instruction, signers: &[Pubkey]) -> Result<()> {
        if ix.program_id != self.program_id {
            bail!("unknown program {}", ix.program_id);
        }
        let target = ix.accounts.first().ok_or_else(|| anyhow!("missing accounts"))?.pubkey;
        let user = ix.accounts.get(1).ok_or_else(|| anyhow!("missing user"))?.pubkey;
        if !signers.contains(&user) {
            bail!("user did not sign");
        }

        let (disc, mut args) = ix.data.split_at(8);
        let is = |name: &str| disc == instruction_discriminator(name).as_slice();

        let mut accounts = self.accounts.borrow_mut();

        if is("initialize_portfolio") || is("initialize_game") || is("register_player") {
            if !signers.contains(&target) {
                bail!("new account did not sign");
            }
            if accounts.contains_key(&target) {
                bail!("account already in use");
            }
            let NameArg { name } = NameArg::deserialize(&mut args)?;
            let name = AccountName::parse(name).map_err(|e| anyhow!("custom program error: {e}"))?;

            let data = if is("initialize_portfolio") {
                portfolio_bytes(&name.to_field(), &user, [0; 4], CLOCK)
            } else if is("initialize_game") {
                game_bytes(&name.to_field(), &user, 0, CLOCK)
            } else {
                player_bytes(&name.to_field(), &user, 0)
            };
            accounts.insert(target, data);
        } else if is("update_portfolio") {
            let current = accounts.get(&target).ok_or_else(|| anyhow!("account not initialized"))?;
            let before = Portfolio::decode(current)?;
            if before.wallet_address != user {
                bail!("Only the portfolio owner can update this portfolio");
            }
            let u = PortfolioUpdate::deserialize(&mut args)?;
            let name = AccountName::parse(u.new_name).map_err(|e| anyhow!("{e}"))?;
            let nb_transactions = if self.drop_transaction_count.get() {
                before.nb_transactions
            } else {
                u.nb_transactions
            };
            let data = portfolio_bytes(
                &name.to_field(),
                &user,
                [
                    u.nb_tokens,
                    nb_transactions,
                    u.amount_total_tokens,
                    u.amount_total_value_stablecoin,
                ],
                u.date_portfolio,
            );
            accounts.insert(target, data);
        } else if is("update_game") {
            let current = accounts.get(&target).ok_or_else(|| anyhow!("account not initialized"))?;
            if Game::decode(current)?.wallet_address != user {
                bail!("Only the game owner can update this game");
            }
            let u = GameUpdate::deserialize(&mut args)?;
            let name = AccountName::parse(u.new_name).map_err(|e| anyhow!("{e}"))?;
            let data = game_bytes(
                &name.to_field(),
                &Pubkey::new_from_array(u.wallet_address),
                u.total_max_players,
                u.date_game,
            );
            accounts.insert(target, data);
        } else if is("update_player") {
            let current = accounts.get(&target).ok_or_else(|| anyhow!("account not initialized"))?;
            if Player::decode(current)?.wallet_address != user {
                bail!("Only the player owner can update this player");
            }
            let u = PlayerUpdate::deserialize(&mut args)?;
            let name = AccountName::parse(u.new_name).map_err(|e| anyhow!("{e}"))?;
            accounts.insert(target, player_bytes(&name.to_field(), &user, u.nb_games));
        } else {
            bail!("unknown instruction {:?}", disc);
        }

        Ok(())
    }
}

impl ProgramSession for MemorySession {
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
        if self.fail_submits.get() > 0 {
            self.fail_submits.set(self.fail_submits.get() - 1);
            bail!("Transaction failed: blockhash not found");
        }

        let mut signers = vec![self.payer.pubkey()];
        signers.extend(extra_signers.iter().map(|k| k.pubkey()));

        let before = self.accounts.borrow().clone();
        for ix in instructions {
            self.apply(ix, &signers)?;
        }
        *self.before_submit.borrow_mut() = before;
        self.pending_stale.set(self.stale_updates.get());

        let signature = Signature::new_unique();
        self.submissions.borrow_mut().push(signature);
        self.pending_lag.set(self.lag.get());

        Ok(Submission {
            signature,
            slot: Some(self.submissions.borrow().len() as u64),
            block_time: Some(i64::from(CLOCK)),
        })
    }

    async fn fetch_account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>> {
        self.fetches.set(self.fetches.get() + 1);
        if self.pending_lag.get() > 0 {
            self.pending_lag.set(self.pending_lag.get() - 1);
            return Ok(None);
        }
        if self.pending_stale.get() > 0 {
            if let Some(old) = self.before_submit.borrow().get(address) {
                self.pending_stale.set(self.pending_stale.get() - 1);
                return Ok(Some(old.clone()));
            }
        }
        Ok(self.account(address))
    }

    async fn pause(&self, duration: Duration) {
        self.pauses.borrow_mut().push(duration);
    }
}

pub fn portfolio_bytes(
    name: &[u8; NAME_LENGTH],
    owner: &Pubkey,
    counters: [u32; 4],
    date: i32,
) -> Vec<u8> {
    let mut data = Portfolio::discriminator().to_vec();
    data.extend_from_slice(name);
    data.extend_from_slice(owner.as_ref());
    for c in counters {
        data.extend_from_slice(&c.to_le_bytes());
    }
    data.extend_from_slice(&date.to_le_bytes());
    data
}

pub fn game_bytes(
    name: &[u8; NAME_LENGTH],
    wallet: &Pubkey,
    max_players: u32,
    date: i32,
) -> Vec<u8> {
    let mut data = Game::discriminator().to_vec();
    data.extend_from_slice(name);
    data.extend_from_slice(wallet.as_ref());
    data.extend_from_slice(&max_players.to_le_bytes());
    data.extend_from_slice(&date.to_le_bytes());
    // the program allocates game accounts with the portfolio size
    data.resize(PORTFOLIO_SIZE, 0);
    data
}

pub fn player_bytes(name: &[u8; NAME_LENGTH], owner: &Pubkey, nb_games: u32) -> Vec<u8> {
    let mut data = Player::discriminator().to_vec();
    data.extend_from_slice(name);
    data.extend_from_slice(owner.as_ref());
    data.extend_from_slice(&nb_games.to_le_bytes());
    data
}
