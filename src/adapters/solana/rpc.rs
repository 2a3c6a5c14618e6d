use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::StreamExt;
use solana_client::nonblocking::pubsub_client::PubsubClient;
use solana_client::rpc_client::RpcClient;
use solana_client::rpc_config::{RpcTransactionLogsConfig, RpcTransactionLogsFilter};
use solana_client::rpc_request::TokenAccountsFilter;
use solana_sdk::{
    commitment_config::CommitmentConfig,
    pubkey::Pubkey,
    transaction::VersionedTransaction,
};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::ports::{ActivityNotification, ChainClient, ChainError};

/// SPL Token program
pub const TOKEN_PROGRAM_ID: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";

/// SPL Token-2022 program
pub const TOKEN_2022_PROGRAM_ID: &str = "TokenzQdBNbLqP5VEhdkAS6EPFLC1PE33NbK4hR1uwFt";

/// Wrapped SOL always has 9 decimals
const NATIVE_MINT_DECIMALS: u8 = 9;
const NATIVE_MINT: &str = "So11111111111111111111111111111111111111112";

#[derive(Debug, Error)]
pub enum SolanaClientError {
    #[error("RPC request failed: {0}")]
    RpcError(String),
    #[error("Transaction failed: {0}")]
    TransactionError(String),
    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),
    #[error("Unexpected account data: {0}")]
    ParseError(String),
    #[error("Subscription failed: {0}")]
    SubscriptionError(String),
}

impl From<SolanaClientError> for ChainError {
    fn from(e: SolanaClientError) -> Self {
        match e {
            SolanaClientError::InvalidPublicKey(s) => ChainError::InvalidAddress(s),
            SolanaClientError::ParseError(s) => ChainError::ParseError(s),
            SolanaClientError::SubscriptionError(s) => ChainError::SubscriptionError(s),
            other => ChainError::RpcError(other.to_string()),
        }
    }
}

/// Balance of one mint across all of a wallet's token accounts
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TokenHolding {
    /// Base units
    pub raw_amount: u64,
    pub decimals: u8,
}

impl TokenHolding {
    pub fn ui_amount(&self) -> f64 {
        spl_token::amount_to_ui_amount(self.raw_amount, self.decimals)
    }
}

/// Sum jsonParsed token accounts per mint.
///
/// Accounts that are not parsed token accounts are skipped.
pub fn sum_token_accounts(accounts: &[serde_json::Value]) -> HashMap<String, TokenHolding> {
    let mut holdings: HashMap<String, TokenHolding> = HashMap::new();

    for data in accounts {
        let info = &data["parsed"]["info"];
        let Some(mint) = info["mint"].as_str() else {
            continue;
        };
        let token_amount = &info["tokenAmount"];
        let raw_amount = token_amount["amount"]
            .as_str()
            .and_then(|a| a.parse::<u64>().ok());
        let decimals = token_amount["decimals"].as_u64();
        let (Some(raw_amount), Some(decimals)) = (raw_amount, decimals) else {
            debug!("Skipping unparsable token account for {}", mint);
            continue;
        };

        let entry = holdings.entry(mint.to_string()).or_insert(TokenHolding {
            raw_amount: 0,
            decimals: decimals as u8,
        });
        entry.raw_amount = entry.raw_amount.saturating_add(raw_amount);
    }

    holdings
}

/// Wrapper around Solana RPC client with async-compatible methods
#[derive(Clone)]
pub struct SolanaClient {
    client: Arc<RpcClient>,
    ws_url: String,
    commitment: CommitmentConfig,
    activity_buffer: usize,
    decimals: Arc<Mutex<HashMap<String, u8>>>,
}

impl SolanaClient {
    /// Create a new Solana RPC client
    pub fn new(rpc_url: String, ws_url: String) -> Self {
        Self::with_commitment(rpc_url, ws_url, CommitmentConfig::confirmed())
    }

    pub fn with_commitment(rpc_url: String, ws_url: String, commitment: CommitmentConfig) -> Self {
        let client = Arc::new(RpcClient::new_with_commitment(rpc_url, commitment));
        Self {
            client,
            ws_url,
            commitment,
            activity_buffer: 1024,
            decimals: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Capacity of the activity channel
    pub fn with_activity_buffer(mut self, capacity: usize) -> Self {
        self.activity_buffer = capacity.max(1);
        self
    }

    fn parse_pubkey(value: &str) -> Result<Pubkey, SolanaClientError> {
        Pubkey::from_str(value).map_err(|e| SolanaClientError::InvalidPublicKey(format!("{}: {}", value, e)))
    }

    /// Token holdings of `owner` under SPL Token and Token-2022, keyed by mint
    pub async fn get_token_holdings(&self, owner: &str) -> Result<HashMap<String, TokenHolding>, SolanaClientError> {
        let owner = Self::parse_pubkey(owner)?;
        let programs = [
            Self::parse_pubkey(TOKEN_PROGRAM_ID)?,
            Self::parse_pubkey(TOKEN_2022_PROGRAM_ID)?,
        ];

        let client = Arc::clone(&self.client);
        let accounts = tokio::task::spawn_blocking(move || {
            let mut values = Vec::new();
            for program in programs {
                let keyed = client
                    .get_token_accounts_by_owner(&owner, TokenAccountsFilter::ProgramId(program))
                    .map_err(|e| SolanaClientError::RpcError(e.to_string()))?;
                for account in keyed {
                    let data = serde_json::to_value(&account.account.data)
                        .map_err(|e| SolanaClientError::ParseError(e.to_string()))?;
                    values.push(data);
                }
            }
            Ok::<_, SolanaClientError>(values)
        })
        .await
        .map_err(|e| SolanaClientError::RpcError(format!("Task join error: {}", e)))??;

        let holdings = sum_token_accounts(&accounts);
        if let Ok(mut cache) = self.decimals.lock() {
            for (mint, holding) in &holdings {
                cache.insert(mint.clone(), holding.decimals);
            }
        }
        Ok(holdings)
    }

    /// Raw balance and decimals of `mint` held by `owner`; zero when no account exists
    pub async fn get_token_holding(&self, owner: &str, mint: &str) -> Result<TokenHolding, SolanaClientError> {
        let owner = Self::parse_pubkey(owner)?;
        let mint_key = Self::parse_pubkey(mint)?;

        let client = Arc::clone(&self.client);
        let accounts = tokio::task::spawn_blocking(move || {
            client
                .get_token_accounts_by_owner(&owner, TokenAccountsFilter::Mint(mint_key))
                .map_err(|e| SolanaClientError::RpcError(e.to_string()))?
                .into_iter()
                .map(|keyed| {
                    serde_json::to_value(&keyed.account.data)
                        .map_err(|e| SolanaClientError::ParseError(e.to_string()))
                })
                .collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(|e| SolanaClientError::RpcError(format!("Task join error: {}", e)))??;

        match sum_token_accounts(&accounts).remove(mint) {
            Some(holding) => Ok(holding),
            None => Ok(TokenHolding {
                raw_amount: 0,
                decimals: self.get_decimals(mint).await?,
            }),
        }
    }

    /// Mint decimals, cached after the first lookup
    pub async fn get_decimals(&self, mint: &str) -> Result<u8, SolanaClientError> {
        if mint == NATIVE_MINT {
            return Ok(NATIVE_MINT_DECIMALS);
        }
        if let Some(decimals) = self.decimals.lock().ok().and_then(|c| c.get(mint).copied()) {
            return Ok(decimals);
        }

        let mint_key = Self::parse_pubkey(mint)?;
        let client = Arc::clone(&self.client);
        let decimals = tokio::task::spawn_blocking(move || {
            client
                .get_token_supply(&mint_key)
                .map(|supply| supply.decimals)
                .map_err(|e| SolanaClientError::RpcError(e.to_string()))
        })
        .await
        .map_err(|e| SolanaClientError::RpcError(format!("Task join error: {}", e)))??;

        if let Ok(mut cache) = self.decimals.lock() {
            cache.insert(mint.to_string(), decimals);
        }
        Ok(decimals)
    }

    /// Send a signed transaction and wait for confirmation
    pub async fn send_and_confirm_transaction(
        &self,
        transaction: &VersionedTransaction,
    ) -> Result<String, SolanaClientError> {
        let tx = transaction.clone();
        let client = Arc::clone(&self.client);

        tokio::task::spawn_blocking(move || {
            client
                .send_and_confirm_transaction(&tx)
                .map(|sig| sig.to_string())
                .map_err(|e| SolanaClientError::TransactionError(e.to_string()))
        })
        .await
        .map_err(|e| SolanaClientError::RpcError(format!("Task join error: {}", e)))?
    }

    /// Get SOL balance for a public key
    pub async fn get_balance(&self, pubkey: &str) -> Result<u64, SolanaClientError> {
        let pubkey = Self::parse_pubkey(pubkey)?;

        // Spawn blocking to make sync RPC call async-compatible
        let client = Arc::clone(&self.client);
        tokio::task::spawn_blocking(move || {
            client
                .get_balance(&pubkey)
                .map_err(|e| SolanaClientError::RpcError(e.to_string()))
        })
        .await
        .map_err(|e| SolanaClientError::RpcError(format!("Task join error: {}", e)))?
    }
}

#[async_trait]
impl ChainClient for SolanaClient {
    async fn fetch_balances(&self, wallet: &str) -> Result<HashMap<String, f64>, ChainError> {
        let holdings = self.get_token_holdings(wallet).await?;
        Ok(holdings
            .into_iter()
            .map(|(mint, holding)| (mint, holding.ui_amount()))
            .collect())
    }

    async fn subscribe_activity(
        &self,
        wallet: &str,
    ) -> Result<mpsc::Receiver<ActivityNotification>, ChainError> {
        Self::parse_pubkey(wallet)?;

        let pubsub = PubsubClient::new(&self.ws_url)
            .await
            .map_err(|e| SolanaClientError::SubscriptionError(e.to_string()))?;
        let (tx, rx) = mpsc::channel(self.activity_buffer);
        let wallet = wallet.to_string();
        let commitment = self.commitment;

        tokio::spawn(async move {
            let filter = RpcTransactionLogsFilter::Mentions(vec![wallet.clone()]);
            let config = RpcTransactionLogsConfig {
                commitment: Some(commitment),
            };
            let (mut stream, unsubscribe) = match pubsub.logs_subscribe(filter, config).await {
                Ok(subscription) => subscription,
                Err(e) => {
                    warn!("Log subscription for {} failed: {}", wallet, e);
                    return;
                }
            };
            info!("Log subscription for {} active", wallet);

            while let Some(response) = stream.next().await {
                let notification = ActivityNotification {
                    signature: response.value.signature,
                    slot: response.context.slot,
                    err: response.value.err.map(|e| e.to_string()),
                };
                if tx.send(notification).await.is_err() {
                    debug!("Activity receiver for {} dropped", wallet);
                    break;
                }
            }

            unsubscribe().await;
            warn!("Log subscription for {} ended", wallet);
        });

        Ok(rx)
    }
}
