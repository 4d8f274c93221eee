//! Paths and constants for the e2e runs

use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

pub const LOCAL_RPC_URL: &str = "http://localhost:8899";

/// Airdrop for the payer: covers rent for every account the suites create
pub const PAYER_AIRDROP_LAMPORTS: u64 = 10_000_000_000;

/// Built program, overridable with `PORTFOLIO_PROGRAM_SO`
pub fn program_so_path() -> Result<PathBuf> {
    if let Ok(path) = env::var("PORTFOLIO_PROGRAM_SO") {
        return Ok(PathBuf::from(path));
    }

    let mut workspace_root = env::current_dir().context("Failed to get current directory")?;

    // If we're in tests/e2e, go up two levels to workspace root
    if workspace_root.ends_with("tests/e2e") {
        workspace_root = workspace_root
            .parent()
            .and_then(|p| p.parent())
            .ok_or_else(|| anyhow::anyhow!("Failed to find workspace root"))?
            .to_path_buf();
    }

    Ok(workspace_root.join("target/deploy/portfolio_program.so"))
}
