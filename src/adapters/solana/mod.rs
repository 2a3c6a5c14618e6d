pub mod rpc;
pub mod wallet;

pub use rpc::{SolanaClient, SolanaClientError, TokenHolding};
pub use wallet::{WalletError, WalletManager};
