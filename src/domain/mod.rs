//! Domain Layer - Core mirroring logic
//!
//! Pure types and logic with no I/O. All external interactions happen
//! through the ports layer.
//!
//! - `snapshot`: point-in-time token balances of a wallet
//! - `transition`: snapshot diff classification
//! - `ledger`: shadow holdings of the bot wallet
//! - `swap`: swap commands and outcomes
//! - `correlator`: mint to activity signature attribution
//! - `metrics`: latency and success counters
//! - `tracker_state`: baseline snapshot and seen signatures between passes

pub mod snapshot;
pub mod transition;
pub mod ledger;
pub mod swap;
pub mod correlator;
pub mod metrics;
pub mod tracker_state;

pub use snapshot::BalanceSnapshot;
pub use transition::{DiffClassifier, TransitionEvent, TransitionKind, DEFAULT_DUST_THRESHOLD};
pub use ledger::{LedgerError, PositionLedger};
pub use swap::{SwapAmount, SwapCommand, SwapDirection, SwapFill, TradeOutcome};
pub use correlator::SignatureCorrelator;
pub use metrics::{LatencySummary, PerformanceMetrics};
pub use tracker_state::{SeenSignatures, TrackerState, MAX_SEEN_SIGNATURES};
