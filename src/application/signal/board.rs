//! Latest detections per symbol.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;

use crate::domain::signal::{describe, SignalSummary};
use crate::domain::{Signal, Symbol};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoardEntry {
    pub signals: Vec<Signal>,
    pub description: String,
    pub detected_at: DateTime<Utc>,
}

/// Thread-safe record of the most recent signals for each symbol and the
/// summary of the last detection round.
#[derive(Default)]
pub struct SignalBoard {
    entries: RwLock<BTreeMap<Symbol, BoardEntry>>,
    last_round: RwLock<Option<SignalSummary>>,
}

impl SignalBoard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a detection round. Symbols without signals keep their
    /// previous entry.
    pub fn record(&self, round: &BTreeMap<Symbol, Vec<Signal>>, at: DateTime<Utc>) {
        {
            let mut entries = self.entries.write();
            for (symbol, signals) in round {
                entries.insert(
                    symbol.clone(),
                    BoardEntry {
                        signals: signals.clone(),
                        description: describe(signals),
                        detected_at: at,
                    },
                );
            }
        }
        *self.last_round.write() = Some(SignalSummary::from_signals(round, at));
    }

    #[must_use]
    pub fn latest(&self) -> BTreeMap<Symbol, BoardEntry> {
        self.entries.read().clone()
    }

    #[must_use]
    pub fn get(&self, symbol: &Symbol) -> Option<BoardEntry> {
        self.entries.read().get(symbol).cloned()
    }

    #[must_use]
    pub fn last_round(&self) -> Option<SignalSummary> {
        self.last_round.read().clone()
    }

    /// Drop entries for symbols no longer tracked.
    pub fn retain(&self, symbols: &[Symbol]) {
        self.entries.write().retain(|s, _| symbols.contains(s));
    }
}
