use std::fs;
use std::path::Path;

use base64::Engine;
use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signer},
    transaction::VersionedTransaction,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("Failed to load keypair from file: {0}")]
    LoadError(String),
    #[error("Failed to sign transaction: {0}")]
    SigningError(String),
    #[error("Invalid keypair bytes: {0}")]
    InvalidKeypair(String),
    #[error("Invalid transaction payload: {0}")]
    InvalidTransaction(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// The bot wallet: keypair loading and transaction signing
pub struct WalletManager {
    keypair: Keypair,
}

impl WalletManager {
    /// Load keypair from a file path (JSON array format). `~` and `$VARS` are expanded.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, WalletError> {
        let raw = path.as_ref().to_string_lossy();
        let expanded = shellexpand::full(&raw)
            .map_err(|e| WalletError::LoadError(format!("Failed to expand path {}: {}", raw, e)))?;

        let contents = fs::read_to_string(&*expanded)
            .map_err(|e| WalletError::LoadError(format!("Failed to read {}: {}", expanded, e)))?;

        let bytes: Vec<u8> = serde_json::from_str(&contents)
            .map_err(|e| WalletError::LoadError(format!("Invalid JSON format: {}", e)))?;

        Self::from_bytes(&bytes)
    }

    /// Load keypair from raw bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WalletError> {
        let keypair = Keypair::try_from(bytes)
            .map_err(|e| WalletError::InvalidKeypair(e.to_string()))?;

        Ok(Self { keypair })
    }

    /// Create a new random keypair (for testing)
    pub fn new_random() -> Self {
        Self {
            keypair: Keypair::new(),
        }
    }

    /// Get the public key as a string
    pub fn public_key(&self) -> String {
        self.keypair.pubkey().to_string()
    }

    pub fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    /// Decode a base64 serialized transaction (as returned by swap APIs) and sign it
    pub fn sign_serialized(&self, encoded: &str) -> Result<VersionedTransaction, WalletError> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| WalletError::InvalidTransaction(format!("base64: {}", e)))?;
        let unsigned: VersionedTransaction = bincode::deserialize(&bytes)
            .map_err(|e| WalletError::InvalidTransaction(format!("bincode: {}", e)))?;

        self.sign_versioned(unsigned)
    }

    /// Re-sign the message of `transaction` with the bot keypair
    pub fn sign_versioned(&self, transaction: VersionedTransaction) -> Result<VersionedTransaction, WalletError> {
        VersionedTransaction::try_new(transaction.message, &[&self.keypair])
            .map_err(|e| WalletError::SigningError(e.to_string()))
    }

    /// Export keypair as bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        self.keypair.to_bytes().to_vec()
    }
}

impl std::fmt::Debug for WalletManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletManager")
            .field("pubkey", &self.public_key())
            .finish()
    }
}
