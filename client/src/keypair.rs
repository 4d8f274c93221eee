//! Wallet keypair loading

use anyhow::{Context, Result};
use solana_sdk::signature::Keypair;

/// Load a keypair from file.
///
/// Accepts the Solana CLI JSON byte array, the raw 64 bytes, or a base58
/// encoded secret key on a single line.
pub fn load_keypair(path: &str) -> Result<Keypair> {
    let expanded_path = shellexpand::tilde(path);
    let bytes = std::fs::read(expanded_path.as_ref())
        .context(format!("Failed to read keypair from {}", path))?;

    keypair_from_bytes(&bytes).context(format!("Invalid keypair file {}", path))
}

fn keypair_from_bytes(bytes: &[u8]) -> Result<Keypair> {
    let trimmed = bytes.trim_ascii();

    let secret = if bytes.len() == 64 {
        // Binary format
        bytes.to_vec()
    } else if trimmed.first() == Some(&b'[') {
        // JSON format
        serde_json::from_slice::<Vec<u8>>(trimmed).context("Failed to parse keypair JSON")?
    } else {
        let text = std::str::from_utf8(trimmed).context("Keypair file is neither JSON nor binary")?;
        bs58::decode(text)
            .into_vec()
            .context("Failed to decode base58 keypair")?
    };

    Keypair::try_from(&secret[..]).context("Failed to create keypair from bytes")
}
