//! Per-operation counters for the cache engine (behind the `metrics`
//! feature).
//!
//! These are observational: they never influence replacement decisions, and
//! the hit/miss/eviction totals reported by
//! [`CacheEngine::summary`](crate::engine::CacheEngine::summary) stay
//! available without this feature. The snapshot is a plain-old-data struct
//! so harnesses can diff two snapshots around a workload.

use std::cell::Cell;

/// A metrics-only cell for counters bumped on `&self` paths (probe and
/// victim scans).
///
/// # Safety
/// Observational only; the engine is single-threaded by contract, so no
/// synchronization is needed.
#[repr(transparent)]
#[derive(Debug, Default)]
pub struct MetricsCell(Cell<u64>);

impl MetricsCell {
    #[inline]
    pub fn get(&self) -> u64 {
        self.0.get()
    }

    #[inline]
    pub fn incr(&self) {
        self.0.set(self.0.get() + 1);
    }

    #[inline]
    pub fn add(&self, n: u64) {
        self.0.set(self.0.get() + n);
    }
}

/// Live per-operation counters owned by a
/// [`CacheEngine`](crate::engine::CacheEngine).
#[derive(Debug, Default)]
pub struct EngineMetrics {
    pub access_calls: u64,
    pub hits: u64,
    pub empty_inserts: u64,
    pub evictions: u64,
    pub probe_calls: MetricsCell,
    pub victim_scans: MetricsCell,
    pub victim_scan_steps: MetricsCell,
}

impl EngineMetrics {
    #[inline]
    pub fn record_access(&mut self) {
        self.access_calls += 1;
    }

    #[inline]
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    #[inline]
    pub fn record_empty_insert(&mut self) {
        self.empty_inserts += 1;
    }

    #[inline]
    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    #[inline]
    pub fn record_probe(&self) {
        self.probe_calls.incr();
    }

    #[inline]
    pub fn record_victim_scan(&self, lines: usize) {
        self.victim_scans.incr();
        self.victim_scan_steps.add(lines as u64);
    }

    /// Captures the counters along with geometry gauges.
    pub fn snapshot(&self, sets: usize, lines_per_set: usize) -> EngineMetricsSnapshot {
        EngineMetricsSnapshot {
            access_calls: self.access_calls,
            hits: self.hits,
            empty_inserts: self.empty_inserts,
            evictions: self.evictions,
            probe_calls: self.probe_calls.get(),
            victim_scans: self.victim_scans.get(),
            victim_scan_steps: self.victim_scan_steps.get(),
            sets,
            lines_per_set,
        }
    }
}

/// Point-in-time copy of [`EngineMetrics`].
#[derive(Debug, Default, Clone, Copy)]
pub struct EngineMetricsSnapshot {
    pub access_calls: u64,
    pub hits: u64,
    pub empty_inserts: u64,
    pub evictions: u64,
    pub probe_calls: u64,
    pub victim_scans: u64,
    pub victim_scan_steps: u64,

    // gauges captured at snapshot time
    pub sets: usize,
    pub lines_per_set: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_incr_and_add() {
        let cell = MetricsCell::default();
        cell.incr();
        cell.add(4);
        assert_eq!(cell.get(), 5);
    }

    #[test]
    fn snapshot_copies_counters_and_gauges() {
        let mut metrics = EngineMetrics::default();
        metrics.record_access();
        metrics.record_hit();
        metrics.record_probe();
        metrics.record_victim_scan(8);

        let snap = metrics.snapshot(16, 4);
        assert_eq!(snap.access_calls, 1);
        assert_eq!(snap.hits, 1);
        assert_eq!(snap.probe_calls, 1);
        assert_eq!(snap.victim_scans, 1);
        assert_eq!(snap.victim_scan_steps, 8);
        assert_eq!(snap.sets, 16);
        assert_eq!(snap.lines_per_set, 4);
    }
}
