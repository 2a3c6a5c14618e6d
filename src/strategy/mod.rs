//! Strategy Layer - Mirrored trade decisions
//!
//! Turns classified tracked-wallet transitions into swap commands for the bot:
//! - New position: buy a fixed base-asset amount
//! - Increase: observe only, or an opt-in fractional buy
//! - Partial decrease: sell the same share of the bot's holding
//! - Full exit: sell the whole holding

pub mod mirror_policy;

pub use mirror_policy::{IncreasePolicy, PolicyError, TradeDecisionPolicy, SOL_MINT};
