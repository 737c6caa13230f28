//! Keypair-backed wallet signer.

use super::WalletSigner;
use crate::error::SyncError;
use crate::shared::PubkeyStr;
use async_trait::async_trait;
use solana_keypair::Keypair;
use solana_signature::Signature;
use solana_signer::Signer;

/// Signs with a local keypair. Never declines.
pub struct KeypairSigner {
    keypair: Keypair,
}

impl KeypairSigner {
    pub fn new(keypair: Keypair) -> Self {
        Self { keypair }
    }

    /// Build from a 32-byte ed25519 seed.
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self::new(Keypair::new_from_array(seed))
    }
}

#[async_trait]
impl WalletSigner for KeypairSigner {
    fn public_key(&self) -> PubkeyStr {
        PubkeyStr::from_pubkey(self.keypair.pubkey())
    }

    async fn sign_message(&self, message: &[u8]) -> Result<Signature, SyncError> {
        Ok(self.keypair.sign_message(message))
    }
}
