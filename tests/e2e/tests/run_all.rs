//! Run all suites end to end
//!
//! Local run (needs the Solana CLI and `target/deploy/portfolio_program.so`):
//! ```bash
//! cargo test -p portfolio-e2e-tests -- --ignored --nocapture local
//! ```
//!
//! Devnet run (needs a funded `~/.config/solana/id.json`, takes minutes):
//! ```bash
//! cargo test -p portfolio-e2e-tests -- --ignored --nocapture devnet
//! ```

use portfolio_client::{
    config::Config, keypair::load_keypair, run_suites, state::now_timestamp, ProgramSession,
    RpcSession, Timings,
};
use portfolio_e2e_tests::TestContext;
use solana_sdk::signature::Signer;

#[tokio::test(flavor = "multi_thread")]
#[ignore = "needs solana-test-validator and a built program"]
async fn run_all_local() {
    println!("\n");
    println!("═══════════════════════════════════════════════════════════");
    println!("  Portfolio End-to-End Test Suite");
    println!("  Testing the built program on solana-test-validator");
    println!("═══════════════════════════════════════════════════════════");

    // Initialize test context
    println!("\nInitializing test environment...");
    let ctx = match TestContext::new() {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("❌ Failed to initialize test context: {:#}", e);
            eprintln!("Make sure solana-test-validator is installed and ports are available");
            panic!("Test setup failed");
        }
    };

    println!("\n✓ Test environment ready");
    println!("  RPC URL: {}", ctx.validator.rpc_url());
    println!("  Payer: {}", ctx.session.payer());

    ctx.session
        .preflight(ctx.config.min_balance_lamports)
        .await
        .expect("program should be preloaded");

    let summary = run_suites(
        &ctx.session,
        &ctx.config.suites,
        Timings::from_config(&ctx.config),
        now_timestamp().expect("timestamp"),
    )
    .await
    .expect("at least one suite should run");

    if summary.failed > 0 {
        panic!("{} suite(s) failed", summary.failed);
    }
}

#[tokio::test(flavor = "multi_thread")]
#[ignore = "hits devnet with a funded wallet"]
async fn run_all_devnet() {
    let mut config = Config::default_devnet();
    config.apply_env_overrides();

    let payer = load_keypair(&config.keypair_path).expect("devnet wallet");
    println!("Using wallet public key: {}", payer.pubkey());

    let session = RpcSession::new(&config, payer);
    session
        .preflight(config.min_balance_lamports)
        .await
        .expect("program should be deployed on devnet");

    let summary = run_suites(
        &session,
        &config.suites,
        Timings::from_config(&config),
        now_timestamp().expect("timestamp"),
    )
    .await
    .expect("at least one suite should run");

    if summary.failed > 0 {
        panic!("{} suite(s) failed", summary.failed);
    }
}
