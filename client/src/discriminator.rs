//! Anchor discriminators: first 8 bytes of sha256("<namespace>:<name>")

use sha2::{Digest, Sha256};

pub type Discriminator = [u8; 8];

fn hash_prefix(preimage: &str) -> Discriminator {
    let digest = Sha256::digest(preimage.as_bytes());
    let mut out = [0u8; 8];
    out.copy_from_slice(&digest[..8]);
    out
}

/// Discriminator prefixed to instruction data, e.g. `global:update_game`
pub fn instruction_discriminator(ix_name: &str) -> Discriminator {
    hash_prefix(&format!("global:{}", ix_name))
}

/// Discriminator at the start of account data, e.g. `account:Game`
pub fn account_discriminator(account_name: &str) -> Discriminator {
    hash_prefix(&format!("account:{}", account_name))
}
