//! Create → settle → fetch → update → settle → fetch → compare
//!
//! One generic flow drives every account type; each [`Lifecycle`] supplies
//! the instructions and the expected values.

use anyhow::{bail, Context, Result};
use solana_sdk::{
    instruction::Instruction,
    pubkey::Pubkey,
    signature::{Keypair, Signer},
};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::config::Config;
use crate::error::NameError;
use crate::instruction::{self, UpdateGameArgs, UpdatePlayerArgs, UpdatePortfolioArgs};
use crate::report::{print_fields, print_section, Check, RunSummary, SuiteReport};
use crate::retry::{retry_fetch, RetryPolicy};
use crate::session::ProgramSession;
use crate::state::{AccountName, AccountState, Game, Player, Portfolio};

/// Waits and retry budget shared by every suite
#[derive(Debug, Clone, Copy)]
pub struct Timings {
    pub settle: Duration,
    pub update_settle: Duration,
    pub fetch: RetryPolicy,
}

impl Timings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            settle: Duration::from_secs(config.settle_secs),
            update_settle: Duration::from_secs(config.update_settle_secs),
            fetch: config.fetch_policy(),
        }
    }
}

/// Account-specific half of a suite
pub trait Lifecycle {
    type Account: AccountState + PartialEq;

    /// Lowercase noun used in logs, e.g. "portfolio"
    fn label(&self) -> &'static str;

    fn create_instruction(&self, program_id: &Pubkey, target: &Pubkey, payer: &Pubkey)
        -> Instruction;

    fn update_instruction(&self, program_id: &Pubkey, target: &Pubkey, payer: &Pubkey)
        -> Instruction;

    fn initial_checks(&self, account: &Self::Account, payer: &Pubkey) -> Vec<Check>;

    fn update_checks(&self, account: &Self::Account, payer: &Pubkey) -> Vec<Check>;
}

/// Fetch and decode an account, retrying while it is missing or unreadable.
///
/// With `previous` set, a read that still decodes to that state counts as a
/// failed attempt: the node has not caught up with the update yet.
pub async fn fetch_state<A, S>(
    session: &S,
    address: &Pubkey,
    what: &str,
    policy: RetryPolicy,
    previous: Option<&A>,
) -> Result<A>
where
    A: AccountState + PartialEq,
    S: ProgramSession,
{
    retry_fetch(policy, what, move || async move {
        let Some(data) = session.fetch_account_data(address).await? else {
            return Ok(None);
        };
        let account = A::decode(&data)?;
        if previous == Some(&account) {
            bail!("{} still shows the pre-update state", what);
        }
        Ok(Some(account))
    })
    .await
}

/// Run one lifecycle to completion. Errors end the suite but are reported,
/// not propagated, so later suites still run.
pub async fn run_lifecycle<L, S>(session: &S, lifecycle: &L, timings: Timings) -> SuiteReport
where
    L: Lifecycle,
    S: ProgramSession,
{
    let mut report = SuiteReport::new(lifecycle.label());

    if let Err(e) = drive(session, lifecycle, timings, &mut report.checks).await {
        log::error!("Error during {} operations: {:#}", lifecycle.label(), e);
        report.error = Some(format!("{:#}", e));
    }

    report
}

async fn drive<L, S>(
    session: &S,
    lifecycle: &L,
    timings: Timings,
    checks: &mut Vec<Check>,
) -> Result<()>
where
    L: Lifecycle,
    S: ProgramSession,
{
    let label = lifecycle.label();
    let program_id = session.program_id();
    let payer = session.payer();

    let account = Keypair::new();
    let address = account.pubkey();
    log::info!("Creating {} account: {}", label, address);

    let create = lifecycle.create_instruction(&program_id, &address, &payer);
    session
        .submit(&[create], &[&account])
        .await
        .context(format!("Failed to create {} account", label))?;

    session.pause(timings.settle).await;

    let what = format!("{} account", label);
    let created: L::Account = fetch_state(session, &address, &what, timings.fetch, None).await?;
    print_fields(&format!("Created {}", label), &created.describe());
    checks.extend(lifecycle.initial_checks(&created, &payer));

    let update = lifecycle.update_instruction(&program_id, &address, &payer);
    session
        .submit(&[update], &[])
        .await
        .context(format!("Failed to update {} account", label))?;

    session.pause(timings.update_settle).await;

    let updated: L::Account = fetch_state(
        session,
        &address,
        &format!("updated {} account", label),
        timings.fetch,
        Some(&created),
    )
    .await?;
    print_fields(&format!("Updated {}", label), &updated.describe());
    checks.extend(lifecycle.update_checks(&updated, &payer));

    Ok(())
}

#[derive(Debug, Clone)]
pub struct PortfolioLifecycle {
    pub name: AccountName,
    pub update: UpdatePortfolioArgs,
}

impl PortfolioLifecycle {
    pub fn new(name: &str, update: UpdatePortfolioArgs) -> Result<Self, NameError> {
        AccountName::parse(update.new_name.as_str())?;
        Ok(Self {
            name: AccountName::parse(name)?,
            update,
        })
    }

    /// Values the devnet scripts used, with `now` as the portfolio date
    pub fn devnet(now: i32) -> Result<Self, NameError> {
        Self::new(
            "MyDevnetPortfolio",
            UpdatePortfolioArgs {
                new_name: "UpdatedDevnetPortfolio".to_string(),
                nb_tokens: 5,
                nb_transactions: 10,
                amount_total_tokens: 100,
                amount_total_value_stablecoin: 1000,
                date_portfolio: now,
            },
        )
    }
}

impl Lifecycle for PortfolioLifecycle {
    type Account = Portfolio;

    fn label(&self) -> &'static str {
        "portfolio"
    }

    fn create_instruction(
        &self,
        program_id: &Pubkey,
        target: &Pubkey,
        payer: &Pubkey,
    ) -> Instruction {
        instruction::initialize_portfolio(program_id, target, payer, &self.name)
    }

    fn update_instruction(
        &self,
        program_id: &Pubkey,
        target: &Pubkey,
        payer: &Pubkey,
    ) -> Instruction {
        instruction::update_portfolio(program_id, target, payer, &self.update)
    }

    fn initial_checks(&self, account: &Portfolio, payer: &Pubkey) -> Vec<Check> {
        vec![
            Check::new("Portfolio name", &self.name, &account.name),
            Check::new("Portfolio wallet address", payer, account.wallet_address),
            Check::new("Portfolio token count", 0, account.nb_tokens),
            Check::new("Portfolio transaction count", 0, account.nb_transactions),
            Check::new("Portfolio total tokens", 0, account.amount_total_tokens),
            Check::new("Portfolio total value", 0, account.amount_total_value_stablecoin),
        ]
    }

    fn update_checks(&self, account: &Portfolio, payer: &Pubkey) -> Vec<Check> {
        let u = &self.update;
        vec![
            Check::new("Portfolio name", &u.new_name, &account.name),
            Check::new("Portfolio wallet address", payer, account.wallet_address),
            Check::new("Portfolio token count", u.nb_tokens, account.nb_tokens),
            Check::new(
                "Portfolio transaction count",
                u.nb_transactions,
                account.nb_transactions,
            ),
            Check::new(
                "Portfolio total tokens",
                u.amount_total_tokens,
                account.amount_total_tokens,
            ),
            Check::new(
                "Portfolio total value",
                u.amount_total_value_stablecoin,
                account.amount_total_value_stablecoin,
            ),
            Check::new("Portfolio date", u.date_portfolio, account.date_portfolio),
        ]
    }
}

#[derive(Debug, Clone)]
pub struct GameLifecycle {
    pub name: AccountName,
    pub update: UpdateGameArgs,
}

impl GameLifecycle {
    pub fn new(name: &str, update: UpdateGameArgs) -> Result<Self, NameError> {
        AccountName::parse(update.new_name.as_str())?;
        Ok(Self {
            name: AccountName::parse(name)?,
            update,
        })
    }

    /// The devnet scripts kept the game wallet pointed at the payer
    pub fn devnet(payer: &Pubkey, now: i32) -> Result<Self, NameError> {
        Self::new(
            "DevnetTestGame",
            UpdateGameArgs {
                new_name: "UpdatedDevnetGame".to_string(),
                wallet_address: payer.to_bytes(),
                total_max_players: 200,
                date_game: now,
            },
        )
    }
}

impl Lifecycle for GameLifecycle {
    type Account = Game;

    fn label(&self) -> &'static str {
        "game"
    }

    fn create_instruction(
        &self,
        program_id: &Pubkey,
        target: &Pubkey,
        payer: &Pubkey,
    ) -> Instruction {
        instruction::initialize_game(program_id, target, payer, &self.name)
    }

    fn update_instruction(
        &self,
        program_id: &Pubkey,
        target: &Pubkey,
        payer: &Pubkey,
    ) -> Instruction {
        instruction::update_game(program_id, target, payer, &self.update)
    }

    fn initial_checks(&self, account: &Game, payer: &Pubkey) -> Vec<Check> {
        vec![
            Check::new("Game name", &self.name, &account.name),
            Check::new("Game wallet address", payer, account.wallet_address),
            Check::new("Game total max players", 0, account.total_max_players),
        ]
    }

    fn update_checks(&self, account: &Game, _payer: &Pubkey) -> Vec<Check> {
        let u = &self.update;
        vec![
            Check::new("Game name", &u.new_name, &account.name),
            Check::new(
                "Game wallet address",
                Pubkey::new_from_array(u.wallet_address),
                account.wallet_address,
            ),
            Check::new("Game total max players", u.total_max_players, account.total_max_players),
            Check::new("Game date", u.date_game, account.date_game),
        ]
    }
}

#[derive(Debug, Clone)]
pub struct PlayerLifecycle {
    pub name: AccountName,
    pub update: UpdatePlayerArgs,
}

impl PlayerLifecycle {
    pub fn new(name: &str, update: UpdatePlayerArgs) -> Result<Self, NameError> {
        AccountName::parse(update.new_name.as_str())?;
        Ok(Self {
            name: AccountName::parse(name)?,
            update,
        })
    }

    pub fn devnet() -> Result<Self, NameError> {
        Self::new(
            "DevnetPlayer",
            UpdatePlayerArgs {
                new_name: "UpdatedDevnetPlayer".to_string(),
                nb_games: 3,
            },
        )
    }
}

impl Lifecycle for PlayerLifecycle {
    type Account = Player;

    fn label(&self) -> &'static str {
        "player"
    }

    fn create_instruction(
        &self,
        program_id: &Pubkey,
        target: &Pubkey,
        payer: &Pubkey,
    ) -> Instruction {
        instruction::register_player(program_id, target, payer, &self.name)
    }

    fn update_instruction(
        &self,
        program_id: &Pubkey,
        target: &Pubkey,
        payer: &Pubkey,
    ) -> Instruction {
        instruction::update_player(program_id, target, payer, &self.update)
    }

    fn initial_checks(&self, account: &Player, payer: &Pubkey) -> Vec<Check> {
        vec![
            Check::new("Player name", &self.name, &account.name),
            Check::new("Player wallet address", payer, account.wallet_address),
            Check::new("Player game count", 0, account.nb_games),
        ]
    }

    fn update_checks(&self, account: &Player, payer: &Pubkey) -> Vec<Check> {
        vec![
            Check::new("Player name", &self.update.new_name, &account.name),
            Check::new("Player wallet address", payer, account.wallet_address),
            Check::new("Player game count", self.update.nb_games, account.nb_games),
        ]
    }
}

/// Suites selectable from config or the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suite {
    Portfolio,
    Game,
    Player,
}

impl Suite {
    pub const ALL: [Suite; 3] = [Suite::Portfolio, Suite::Game, Suite::Player];
}

impl FromStr for Suite {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "portfolio" => Ok(Suite::Portfolio),
            "game" => Ok(Suite::Game),
            "player" => Ok(Suite::Player),
            other => bail!(
                "unknown suite '{}' (expected portfolio, game or player)",
                other
            ),
        }
    }
}

impl fmt::Display for Suite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Suite::Portfolio => "portfolio",
            Suite::Game => "game",
            Suite::Player => "player",
        };
        f.write_str(name)
    }
}

/// Run a suite with its devnet literals
pub async fn run_suite<S: ProgramSession>(
    session: &S,
    suite: Suite,
    timings: Timings,
    now: i32,
) -> SuiteReport {
    let result = match suite {
        Suite::Portfolio => match PortfolioLifecycle::devnet(now) {
            Ok(l) => Ok(run_lifecycle(session, &l, timings).await),
            Err(e) => Err(e),
        },
        Suite::Game => match GameLifecycle::devnet(&session.payer(), now) {
            Ok(l) => Ok(run_lifecycle(session, &l, timings).await),
            Err(e) => Err(e),
        },
        Suite::Player => match PlayerLifecycle::devnet() {
            Ok(l) => Ok(run_lifecycle(session, &l, timings).await),
            Err(e) => Err(e),
        },
    };

    result.unwrap_or_else(|e| SuiteReport {
        name: suite.to_string(),
        checks: Vec::new(),
        error: Some(e.to_string()),
    })
}

/// Run the named suites in order. Unknown names are skipped with a warning;
/// it is an error when none of the names selects a suite.
pub async fn run_suites<S: ProgramSession>(
    session: &S,
    names: &[String],
    timings: Timings,
    now: i32,
) -> Result<RunSummary> {
    let mut summary = RunSummary::default();

    for name in names {
        let suite: Suite = match name.parse() {
            Ok(suite) => suite,
            Err(e) => {
                log::warn!("Skipping: {:#}", e);
                summary.skip();
                continue;
            }
        };

        print_section(&format!("{} tests", suite).to_uppercase());
        let report = run_suite(session, suite, timings, now).await;
        report.print();
        summary.record(&report);
    }

    summary.print();

    if summary.passed + summary.failed == 0 {
        bail!("No suites ran ({} skipped)", summary.skipped);
    }

    Ok(summary)
}
