//! Phase Ledger - current phase plus a bounded, append-only transition log

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::phase::{Phase, PhaseHistoryEntry};

/// Upper bound on retained history entries.
pub const MAX_PHASE_HISTORY: usize = 100;

/// Tracks which phase is current and how the session got there.
///
/// History is trimmed oldest-first once it exceeds its capacity, so a
/// long-running session never grows without bound.
#[derive(Debug, Clone)]
pub struct PhaseLedger {
    current: Phase,
    history: VecDeque<PhaseHistoryEntry>,
    capacity: usize,
}

impl PhaseLedger {
    /// Create a ledger whose history starts with one entry for `initial`.
    pub fn new(initial: Phase, now: DateTime<Utc>) -> Self {
        Self::with_capacity(initial, MAX_PHASE_HISTORY, now)
    }

    /// Create a ledger with a smaller history bound.
    ///
    /// `capacity` is clamped to `1..=MAX_PHASE_HISTORY`.
    pub fn with_capacity(initial: Phase, capacity: usize, now: DateTime<Utc>) -> Self {
        let capacity = capacity.clamp(1, MAX_PHASE_HISTORY);
        let mut history = VecDeque::with_capacity(capacity);
        history.push_back(PhaseHistoryEntry::initial(initial, now));
        Self {
            current: initial,
            history,
            capacity,
        }
    }

    pub fn current(&self) -> Phase {
        self.current
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Phase the most recent transition came from, if any.
    pub fn previous(&self) -> Option<Phase> {
        self.history.back().and_then(|entry| entry.previous_state)
    }

    pub fn history(&self) -> impl ExactSizeIterator<Item = &PhaseHistoryEntry> {
        self.history.iter()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn last_entry(&self) -> Option<&PhaseHistoryEntry> {
        self.history.back()
    }

    /// Record a transition into `next` and make it current.
    pub fn record(
        &mut self,
        next: Phase,
        metadata: Option<Map<String, Value>>,
        now: DateTime<Utc>,
    ) -> &PhaseHistoryEntry {
        let previous = self.current;
        self.current = next;
        self.history.push_back(PhaseHistoryEntry {
            name: next,
            entered_at: now,
            previous_state: Some(previous),
            metadata,
        });

        while self.history.len() > self.capacity {
            self.history.pop_front();
        }

        // Non-empty: we just pushed
        &self.history[self.history.len() - 1]
    }

    /// Keep the current phase, collapse history to a single entry for it.
    pub fn clear_history(&mut self, now: DateTime<Utc>) {
        self.history.clear();
        self.history
            .push_back(PhaseHistoryEntry::initial(self.current, now));
    }

    /// Return to `INIT` with a single history entry.
    pub fn reset(&mut self, now: DateTime<Utc>) {
        self.current = Phase::Init;
        self.clear_history(now);
    }

    /// Return to `INIT` and drop all history.
    pub fn clear(&mut self) {
        self.current = Phase::Init;
        self.history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_new_ledger_has_one_entry() {
        let ledger = PhaseLedger::new(Phase::Init, at(0));
        assert_eq!(ledger.current(), Phase::Init);
        assert_eq!(ledger.history_len(), 1);
        assert_eq!(ledger.previous(), None);
    }

    #[test]
    fn test_record_appends_with_previous_state() {
        let mut ledger = PhaseLedger::new(Phase::Init, at(0));
        ledger.record(Phase::Start, None, at(1));
        let entry = ledger.record(Phase::Round, None, at(2)).clone();

        assert_eq!(entry.name, Phase::Round);
        assert_eq!(entry.previous_state, Some(Phase::Start));
        assert_eq!(entry.entered_at, at(2));
        assert_eq!(ledger.previous(), Some(Phase::Start));
        let names: Vec<Phase> = ledger.history().map(|e| e.name).collect();
        assert_eq!(names, vec![Phase::Init, Phase::Start, Phase::Round]);
    }

    #[test]
    fn test_record_keeps_metadata() {
        let mut ledger = PhaseLedger::new(Phase::Init, at(0));
        let mut meta = Map::new();
        meta.insert("score".into(), Value::from(100));
        ledger.record(Phase::Round, Some(meta.clone()), at(1));
        assert_eq!(ledger.last_entry().unwrap().metadata, Some(meta));
    }

    #[test]
    fn test_history_is_bounded() {
        let mut ledger = PhaseLedger::new(Phase::Init, at(0));
        for i in 0..150 {
            ledger.record(Phase::Round, None, at(i));
            ledger.record(Phase::RoundResult, None, at(i));
        }
        assert_eq!(ledger.history_len(), MAX_PHASE_HISTORY);
        // Oldest entries dropped first
        assert_eq!(ledger.history().next().unwrap().name, Phase::Round);
        assert_eq!(ledger.current(), Phase::RoundResult);
    }

    #[test]
    fn test_capacity_is_clamped() {
        let ledger = PhaseLedger::with_capacity(Phase::Init, 500, at(0));
        assert_eq!(ledger.capacity(), MAX_PHASE_HISTORY);
        let tiny = PhaseLedger::with_capacity(Phase::Init, 0, at(0));
        assert_eq!(tiny.capacity(), 1);
    }

    #[test]
    fn test_clear_history_keeps_current() {
        let mut ledger = PhaseLedger::new(Phase::Init, at(0));
        ledger.record(Phase::Start, None, at(1));
        ledger.record(Phase::Round, None, at(2));
        ledger.clear_history(at(3));

        assert_eq!(ledger.current(), Phase::Round);
        assert_eq!(ledger.history_len(), 1);
        assert_eq!(ledger.last_entry().unwrap().name, Phase::Round);
    }

    #[test]
    fn test_reset_and_clear() {
        let mut ledger = PhaseLedger::new(Phase::Init, at(0));
        ledger.record(Phase::End, None, at(1));

        ledger.reset(at(2));
        assert_eq!(ledger.current(), Phase::Init);
        assert_eq!(ledger.history_len(), 1);

        ledger.record(Phase::Start, None, at(3));
        ledger.clear();
        assert_eq!(ledger.current(), Phase::Init);
        assert_eq!(ledger.history_len(), 0);
        assert_eq!(ledger.previous(), None);
    }
}
