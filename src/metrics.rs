use crate::query::Mode;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
struct ModeCounters {
    completed: AtomicU64,
    failed: AtomicU64,
}

impl ModeCounters {
    fn snapshot(&self) -> ModeSnapshot {
        ModeSnapshot {
            completed: self.completed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// Thread-safe per-mode query counters.
#[derive(Default)]
pub struct QueryMetrics {
    redact: ModeCounters,
    analysis: ModeCounters,
    extract: ModeCounters,
}

impl QueryMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    fn counters(&self, mode: Mode) -> &ModeCounters {
        match mode {
            Mode::Redact { .. } => &self.redact,
            Mode::Analyze => &self.analysis,
            Mode::Extract => &self.extract,
        }
    }

    /// Record a query that returned text.
    pub fn record_success(&self, mode: Mode) {
        self.counters(mode).completed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a query that ended in an error.
    pub fn record_failure(&self, mode: Mode) {
        self.counters(mode).failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            redact: self.redact.snapshot(),
            analysis: self.analysis.snapshot(),
            extract: self.extract.snapshot(),
        }
    }
}

/// Counters for a single mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct ModeSnapshot {
    /// Queries that returned text.
    pub completed: u64,
    /// Queries that failed.
    pub failed: u64,
}

/// Immutable view of query counters used for reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Counters for `/redact/`.
    pub redact: ModeSnapshot,
    /// Counters for `/analysis/`.
    pub analysis: ModeSnapshot,
    /// Counters for `/extract/`.
    pub extract: ModeSnapshot,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Character;

    #[test]
    fn records_outcomes_per_mode() {
        let metrics = QueryMetrics::new();
        metrics.record_success(Mode::Analyze);
        metrics.record_success(Mode::Analyze);
        metrics.record_failure(Mode::Redact {
            character: Character::Ron,
        });

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.analysis.completed, 2);
        assert_eq!(snapshot.redact.failed, 1);
        assert_eq!(snapshot.extract, ModeSnapshot::default());
    }

    #[test]
    fn snapshot_starts_empty() {
        assert_eq!(QueryMetrics::new().snapshot(), MetricsSnapshot::default());
    }
}
