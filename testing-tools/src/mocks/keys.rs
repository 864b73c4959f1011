use alloy_primitives::hex;
use galena_types::Keypair;
use sha2::{Digest, Sha256};
use transaction_pool::KeyDerivation;

/// Key derivation where the public key is the hex of the seed hash itself.
#[derive(Debug, Default, Clone, Copy)]
pub struct MockKeys;

impl KeyDerivation for MockKeys {
    fn make_keypair(&self, hash: &[u8; 32]) -> Keypair {
        Keypair { public_key: hex::encode(hash), private_key: hex::encode(hash) }
    }
}

/// The keysgroup entry granting `secret` signing rights under [`MockKeys`].
pub fn keysgroup_entry(secret: &str) -> String {
    format!("+{}", hex::encode(Sha256::digest(secret.as_bytes())))
}
