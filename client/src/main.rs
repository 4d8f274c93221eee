//! Portfolio program smoke test runner
//!
//! Usage: `portfolio-smoke [portfolio|game|player ...]`
//!        `portfolio-smoke --write-config <path>`

use anyhow::{Context, Result};
use portfolio_client::{
    config::Config, idl::Idl, keypair::load_keypair, report::print_banner, run_suites,
    state::now_timestamp, RpcSession, RunSummary, Timings,
};
use solana_sdk::signature::Signer;

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();

    match run(&args).await {
        Ok(summary) if summary.failed == 0 => {}
        Ok(summary) => {
            log::error!("{} suite(s) failed", summary.failed);
            std::process::exit(1);
        }
        Err(e) => {
            log::error!("Top-level error: {:#}", e);
            std::process::exit(2);
        }
    }
}

async fn run(args: &[String]) -> Result<RunSummary> {
    if args.first().map(String::as_str) == Some("--write-config") {
        let path = args.get(1).map(String::as_str).unwrap_or("smoke-config.toml");
        Config::write_default(path)?;
        return Ok(RunSummary::default());
    }

    // Load configuration
    let mut config = Config::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({:#}), using default devnet config", e);
        Config::default_devnet()
    });
    config.apply_env_overrides();

    let requested: &[String] = if args.is_empty() { &config.suites } else { args };

    print_banner(&config.rpc_url, config.program_id);

    // Load payer wallet
    let payer = load_keypair(&config.keypair_path)?;
    log::info!("Using wallet public key: {}", payer.pubkey());

    let session = RpcSession::new(&config, payer);
    session
        .preflight(config.min_balance_lamports)
        .await
        .context("Error setting up program")?;

    match Idl::locate(config.idl_path.as_deref(), session.client(), &config.program_id).await {
        Ok(Some(idl)) => idl.check_compatible(&config.program_id.to_string())?,
        Ok(None) => log::warn!("No IDL in the workspace or on chain, skipping IDL check"),
        Err(e) => log::warn!("Could not load IDL ({:#}), skipping IDL check", e),
    }

    let now = now_timestamp()?;
    run_suites(&session, requested, Timings::from_config(&config), now).await
}
