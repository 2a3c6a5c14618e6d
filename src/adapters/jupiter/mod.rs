//! Jupiter Adapter
//!
//! Swap execution through the Jupiter DEX aggregator: quote fetching, swap
//! building and signed transaction submission.

mod client;
mod executor;
mod quote;
mod swap;

pub use client::{JupiterClient, JupiterConfig, DEFAULT_JUPITER_API_URL};
pub use executor::{resolve_sell_amount, JupiterExecutor};
pub(crate) use executor::fill_from_quote;
pub use quote::{QuoteRequest, QuoteResponse, RoutePlanStep, SwapInfo};
pub use swap::{SwapRequest, SwapResponse};
