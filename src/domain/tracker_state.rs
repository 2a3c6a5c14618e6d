//! Tracker State
//!
//! The state that survives between passes: the last accepted snapshot of the
//! tracked wallet and the bounded set of activity signatures already handled.

use std::collections::{HashSet, VecDeque};

use super::snapshot::BalanceSnapshot;

/// Oldest signatures are evicted beyond this many
pub const MAX_SEEN_SIGNATURES: usize = 10_000;

/// Insertion-ordered set of signatures with FIFO eviction
#[derive(Debug, Clone)]
pub struct SeenSignatures {
    set: HashSet<String>,
    order: VecDeque<String>,
    capacity: usize,
}

impl Default for SeenSignatures {
    fn default() -> Self {
        Self::with_capacity(MAX_SEEN_SIGNATURES)
    }
}

impl SeenSignatures {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            set: HashSet::new(),
            order: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Returns `false` if the signature was already present
    pub fn insert(&mut self, signature: &str) -> bool {
        if self.set.contains(signature) {
            return false;
        }
        if self.order.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.set.remove(&oldest);
            }
        }
        self.set.insert(signature.to_string());
        self.order.push_back(signature.to_string());
        true
    }

    pub fn contains(&self, signature: &str) -> bool {
        self.set.contains(signature)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct TrackerState {
    previous: Option<BalanceSnapshot>,
    pub signatures: SeenSignatures,
}

impl TrackerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn previous(&self) -> Option<&BalanceSnapshot> {
        self.previous.as_ref()
    }

    /// Replace the baseline, returning the one it supersedes.
    /// Degraded snapshots are rejected and leave the baseline untouched.
    pub fn advance(&mut self, snapshot: BalanceSnapshot) -> Result<Option<BalanceSnapshot>, BalanceSnapshot> {
        if snapshot.degraded {
            return Err(snapshot);
        }
        Ok(self.previous.replace(snapshot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_signature_rejected() {
        let mut seen = SeenSignatures::default();
        assert!(seen.insert("sig1"));
        assert!(!seen.insert("sig1"));
        assert_eq!(seen.len(), 1);
    }

    #[test]
    fn test_oldest_signature_evicted() {
        let mut seen = SeenSignatures::with_capacity(2);
        seen.insert("a");
        seen.insert("b");
        seen.insert("c");

        assert!(!seen.contains("a"));
        assert!(seen.contains("b"));
        assert!(seen.contains("c"));
        assert_eq!(seen.len(), 2);
        // evicted entries count as new again
        assert!(seen.insert("a"));
    }

    #[test]
    fn test_default_capacity() {
        let mut seen = SeenSignatures::default();
        for i in 0..(MAX_SEEN_SIGNATURES + 5) {
            seen.insert(&format!("sig{}", i));
        }
        assert_eq!(seen.len(), MAX_SEEN_SIGNATURES);
        assert!(!seen.contains("sig0"));
    }

    #[test]
    fn test_advance_keeps_baseline_on_degraded() {
        let mut state = TrackerState::new();
        let first = BalanceSnapshot::from_pairs("W", [("TKN", 5.0)]);
        assert_eq!(state.advance(first.clone()), Ok(None));

        assert!(state.advance(BalanceSnapshot::degraded("W")).is_err());
        assert_eq!(state.previous(), Some(&first));

        let second = BalanceSnapshot::from_pairs("W", [("TKN", 6.0)]);
        assert_eq!(state.advance(second.clone()), Ok(Some(first)));
        assert_eq!(state.previous(), Some(&second));
    }
}
