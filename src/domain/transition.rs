//! Balance Transitions
//!
//! Classifies the difference between two snapshots of the tracked wallet into
//! per-token trading events.
//!
//! Rules, per mint in the union of both snapshots (`o` old, `n` new, missing = 0):
//! - `n > o`, `o == 0` and the bot holds nothing: [`TransitionKind::NewPosition`]
//! - `n > o` otherwise: [`TransitionKind::Increase`]
//! - `n < o` and `n` above dust: [`TransitionKind::PartialDecrease`]
//! - `n` at or below dust (or missing) while the bot holds the mint: [`TransitionKind::FullExit`]
//! - anything else: no event

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::snapshot::BalanceSnapshot;

/// Balances at or below this are treated as an exit (UI units)
pub const DEFAULT_DUST_THRESHOLD: f64 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    NewPosition,
    Increase,
    PartialDecrease,
    FullExit,
}

impl fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransitionKind::NewPosition => write!(f, "NEW_POSITION"),
            TransitionKind::Increase => write!(f, "INCREASE"),
            TransitionKind::PartialDecrease => write!(f, "PARTIAL_DECREASE"),
            TransitionKind::FullExit => write!(f, "FULL_EXIT"),
        }
    }
}

/// One classified balance change of the tracked wallet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionEvent {
    pub mint: String,
    pub kind: TransitionKind,
    pub old_balance: f64,
    pub new_balance: f64,
    pub observed_at: DateTime<Utc>,
}

impl TransitionEvent {
    /// Absolute size of the change in UI units
    pub fn amount(&self) -> f64 {
        (self.new_balance - self.old_balance).abs()
    }

    /// Share of the old balance that was sold, in percent.
    /// `None` unless the balance went down from a positive value.
    pub fn decrease_percent(&self) -> Option<f64> {
        if self.old_balance > 0.0 && self.new_balance < self.old_balance {
            Some((self.old_balance - self.new_balance) / self.old_balance * 100.0)
        } else {
            None
        }
    }
}

/// Pure classifier from `(old, new, bot_has_position)` to transition kinds
#[derive(Debug, Clone, Copy)]
pub struct DiffClassifier {
    dust_threshold: f64,
}

impl Default for DiffClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_DUST_THRESHOLD)
    }
}

impl DiffClassifier {
    pub fn new(dust_threshold: f64) -> Self {
        Self { dust_threshold }
    }

    pub fn dust_threshold(&self) -> f64 {
        self.dust_threshold
    }

    /// Kind for a single mint, `None` when no event applies
    pub fn kind_for(&self, old: f64, new: f64, bot_has_position: bool) -> Option<TransitionKind> {
        if new > old {
            if old == 0.0 && !bot_has_position {
                return Some(TransitionKind::NewPosition);
            }
            return Some(TransitionKind::Increase);
        }
        if new < old && new > self.dust_threshold {
            return Some(TransitionKind::PartialDecrease);
        }
        if new <= self.dust_threshold && bot_has_position && new != old {
            return Some(TransitionKind::FullExit);
        }
        None
    }

    /// Compare two snapshots of the same wallet.
    ///
    /// Events come out in mint order so replaying a pair yields identical output.
    pub fn classify<F>(
        &self,
        old: &BalanceSnapshot,
        new: &BalanceSnapshot,
        bot_has_position: F,
    ) -> Vec<TransitionEvent>
    where
        F: Fn(&str) -> bool,
    {
        let mints: BTreeSet<&String> = old.balances.keys().chain(new.balances.keys()).collect();

        mints
            .into_iter()
            .filter_map(|mint| {
                let o = old.balance(mint);
                let n = new.balance(mint);
                let kind = self.kind_for(o, n, bot_has_position(mint))?;

                Some(TransitionEvent {
                    mint: mint.clone(),
                    kind,
                    old_balance: o,
                    new_balance: n,
                    observed_at: new.captured_at,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const WALLET: &str = "Tracked111";

    fn snap(pairs: &[(&str, f64)]) -> BalanceSnapshot {
        BalanceSnapshot::from_pairs(WALLET, pairs.iter().map(|(m, a)| (*m, *a)))
    }

    fn nothing_held(_: &str) -> bool {
        false
    }

    fn all_held(_: &str) -> bool {
        true
    }

    #[test]
    fn test_new_position_from_empty() {
        let events = DiffClassifier::default().classify(&snap(&[]), &snap(&[("TKN", 50.0)]), nothing_held);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, TransitionKind::NewPosition);
        assert_eq!(events[0].amount(), 50.0);
    }

    #[test]
    fn test_new_balance_while_bot_holds_is_increase() {
        let events = DiffClassifier::default().classify(&snap(&[]), &snap(&[("TKN", 50.0)]), all_held);
        assert_eq!(events[0].kind, TransitionKind::Increase);
    }

    #[test]
    fn test_increase_reports_delta() {
        let events = DiffClassifier::default().classify(
            &snap(&[("TKN", 20.0)]),
            &snap(&[("TKN", 35.0)]),
            nothing_held,
        );
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, TransitionKind::Increase);
        assert_eq!(events[0].amount(), 15.0);
    }

    #[test]
    fn test_partial_decrease_percent() {
        let events = DiffClassifier::default().classify(
            &snap(&[("TKN", 50.0)]),
            &snap(&[("TKN", 30.0)]),
            nothing_held,
        );
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, TransitionKind::PartialDecrease);
        assert_relative_eq!(events[0].decrease_percent().unwrap(), 40.0, epsilon = 1e-9);
    }

    #[test]
    fn test_full_exit_when_token_disappears() {
        let events = DiffClassifier::default().classify(&snap(&[("TKN", 30.0)]), &snap(&[]), all_held);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, TransitionKind::FullExit);
        assert_eq!(events[0].new_balance, 0.0);
    }

    #[test]
    fn test_full_exit_on_dust_balance() {
        let events = DiffClassifier::default().classify(
            &snap(&[("TKN", 30.0)]),
            &snap(&[("TKN", 0.0009)]),
            all_held,
        );
        assert_eq!(events[0].kind, TransitionKind::FullExit);
    }

    #[test]
    fn test_disappearing_token_without_bot_position_is_silent() {
        let events = DiffClassifier::default().classify(&snap(&[("TKN", 30.0)]), &snap(&[]), nothing_held);
        assert!(events.is_empty());
    }

    #[test]
    fn test_dust_never_tracked_is_silent() {
        let events = DiffClassifier::default().classify(&snap(&[("TKN", 0.0005)]), &snap(&[]), nothing_held);
        assert!(events.is_empty());
    }

    #[test]
    fn test_unchanged_balance_is_silent() {
        let events = DiffClassifier::default().classify(
            &snap(&[("TKN", 12.5), ("ABC", 1.0)]),
            &snap(&[("TKN", 12.5), ("ABC", 1.0)]),
            all_held,
        );
        assert!(events.is_empty());
    }

    #[test]
    fn test_one_event_per_changed_token() {
        let old = snap(&[("AAA", 10.0), ("BBB", 10.0), ("CCC", 10.0)]);
        let new = snap(&[("AAA", 20.0), ("BBB", 10.0), ("CCC", 5.0), ("DDD", 1.0)]);
        let events = DiffClassifier::default().classify(&old, &new, nothing_held);

        let kinds: Vec<(&str, TransitionKind)> =
            events.iter().map(|e| (e.mint.as_str(), e.kind)).collect();
        assert_eq!(
            kinds,
            vec![
                ("AAA", TransitionKind::Increase),
                ("CCC", TransitionKind::PartialDecrease),
                ("DDD", TransitionKind::NewPosition),
            ]
        );
    }

    #[test]
    fn test_classify_is_repeatable() {
        let old = snap(&[("AAA", 10.0), ("BBB", 3.0)]);
        let new = snap(&[("AAA", 4.0), ("CCC", 8.0)]);
        let classifier = DiffClassifier::default();
        let first = classifier.classify(&old, &new, |m| m == "BBB");
        let second = classifier.classify(&old, &new, |m| m == "BBB");
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
    }

    #[test]
    fn test_partial_decrease_percent_bounds() {
        let classifier = DiffClassifier::default();
        for (o, n) in [(100.0, 99.999), (100.0, 0.0011), (1.0, 0.5), (7.3, 2.1)] {
            let events = classifier.classify(&snap(&[("X", o)]), &snap(&[("X", n)]), all_held);
            let pct = events[0].decrease_percent().unwrap();
            assert_eq!(events[0].kind, TransitionKind::PartialDecrease);
            assert!(pct > 0.0 && pct < 100.0, "pct {} out of range", pct);
        }
    }

    #[test]
    fn test_kind_for_is_exclusive() {
        let classifier = DiffClassifier::new(0.001);
        assert_eq!(classifier.kind_for(0.0, 1.0, false), Some(TransitionKind::NewPosition));
        assert_eq!(classifier.kind_for(0.0, 1.0, true), Some(TransitionKind::Increase));
        assert_eq!(classifier.kind_for(2.0, 1.0, false), Some(TransitionKind::PartialDecrease));
        assert_eq!(classifier.kind_for(2.0, 0.0, true), Some(TransitionKind::FullExit));
        assert_eq!(classifier.kind_for(2.0, 0.0, false), None);
        assert_eq!(classifier.kind_for(2.0, 2.0, true), None);
    }

    #[test]
    fn test_custom_dust_threshold() {
        let classifier = DiffClassifier::new(1.0);
        let events = classifier.classify(&snap(&[("TKN", 10.0)]), &snap(&[("TKN", 0.9)]), all_held);
        assert_eq!(events[0].kind, TransitionKind::FullExit);
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(TransitionKind::PartialDecrease.to_string(), "PARTIAL_DECREASE");
        assert_eq!(TransitionKind::NewPosition.to_string(), "NEW_POSITION");
    }
}
