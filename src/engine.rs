//! Set-associative cache engine with LRU/LFU replacement.
//!
//! The engine owns a fixed two-dimensional arrangement of sets and lines,
//! sized once at construction and never resized. Each access decomposes the
//! address, walks exactly one set, and resolves to one of three outcomes:
//!
//! ```text
//!   access(addr)
//!        │  set.clock += 1   (unconditionally, before branching)
//!        ▼
//!   ┌────────────────────────────────────────────────────────────┐
//!   │ probe: valid line in the target set with a matching tag?   │
//!   │                                                            │
//!   │   YES → refresh policy counter, Hit                        │
//!   │   NO  → first invalid line?                                │
//!   │           YES → fill it, Miss { insert_block }             │
//!   │           NO  → select victim, overwrite in place,         │
//!   │                 Evict { victim_block, insert_block }       │
//!   └────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Replacement policies
//!
//! | Policy | Victim                      | Tie-break                        |
//! |--------|-----------------------------|----------------------------------|
//! | LRU    | minimum `lru_stamp`         | lowest slot index (strict `<`)   |
//! | LFU    | minimum `access_count`      | minimum `lru_stamp`, then slot   |
//!
//! Victim selection deliberately returns the victim's *block address*, not a
//! slot handle; replacement re-locates the physical line by scanning for
//! that block address. Selection and replacement stay logically separate,
//! mirroring the hardware boundary between the two steps.
//!
//! ## Counters
//!
//! Each set carries a logical `clock` incremented exactly once per access
//! routed to it, hit or miss, and never reset. Engine-wide hit/miss/eviction
//! totals are monotone over the engine's lifetime and reported by
//! [`CacheEngine::summary`].

use std::fmt;

use crate::addr::Geometry;
use crate::error::ConfigError;
#[cfg(feature = "metrics")]
use crate::metrics::{EngineMetrics, EngineMetricsSnapshot};

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// Replacement policy applied when a full set needs a victim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// Least Recently Used: evict the line with the oldest last-touch stamp.
    Lru,
    /// Least Frequently Used: evict the line with the fewest touches,
    /// falling back to LRU among equally-infrequent lines.
    Lfu,
}

impl std::str::FromStr for Policy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lru" => Ok(Policy::Lru),
            "lfu" => Ok(Policy::Lfu),
            other => Err(ConfigError::new(format!(
                "unknown policy `{}` (expected `lru` or `lfu`)",
                other
            ))),
        }
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Policy::Lru => f.write_str("lru"),
            Policy::Lfu => f.write_str("lfu"),
        }
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Per-access result of [`CacheEngine::access`].
///
/// `Display` renders the bracketed per-access format the trace harness
/// echoes:
///
/// ```
/// use waycache::engine::AccessOutcome;
///
/// assert_eq!(AccessOutcome::Hit.to_string(), "[status: hit]");
/// assert_eq!(
///     AccessOutcome::Miss { insert_block: 0x40 }.to_string(),
///     "[status: miss, insert_block: 0x40]",
/// );
/// assert_eq!(
///     AccessOutcome::Evict { victim_block: 0x40, insert_block: 0x80 }.to_string(),
///     "[status: miss eviction, victim_block: 0x40, insert_block: 0x80]",
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessOutcome {
    /// The address was already cached.
    Hit,
    /// The address was inserted into an empty line.
    Miss {
        /// Block address the access was inserted under.
        insert_block: u64,
    },
    /// The set was full; a victim was overwritten.
    Evict {
        /// Block address the evicted line held.
        victim_block: u64,
        /// Block address the access was inserted under.
        insert_block: u64,
    },
}

impl fmt::Display for AccessOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessOutcome::Hit => f.write_str("[status: hit]"),
            AccessOutcome::Miss { insert_block } => {
                write!(f, "[status: miss, insert_block: {:#x}]", insert_block)
            },
            AccessOutcome::Evict {
                victim_block,
                insert_block,
            } => {
                write!(
                    f,
                    "[status: miss eviction, victim_block: {:#x}, insert_block: {:#x}]",
                    victim_block, insert_block
                )
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

/// Aggregate statistics captured from an engine.
///
/// `Display` renders the final summary line of the trace harness:
/// `<name> hits: <H>, misses: <M>, evictions: <E>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSummary {
    /// Display name the engine was constructed with.
    pub name: String,
    /// Total accesses that hit.
    pub hits: u64,
    /// Total accesses that missed (with or without eviction).
    pub misses: u64,
    /// Total misses that had to evict a valid line.
    pub evictions: u64,
}

impl fmt::Display for CacheSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} hits: {}, misses: {}, evictions: {}",
            self.name, self.hits, self.misses, self.evictions
        )
    }
}

// ---------------------------------------------------------------------------
// Lines and sets
// ---------------------------------------------------------------------------

/// One cache slot. `tag`, `block_addr`, and the policy counters are only
/// meaningful while `valid` is set; no operation reads them otherwise.
#[derive(Debug, Clone, Copy)]
struct Line {
    valid: bool,
    tag: u64,
    block_addr: u64,
    /// Set-local clock value at last touch (LRU).
    lru_stamp: u64,
    /// Touches since insertion, starting at 1 (LFU).
    access_count: u64,
}

impl Line {
    const INVALID: Line = Line {
        valid: false,
        tag: 0,
        block_addr: 0,
        lru_stamp: 0,
        access_count: 0,
    };

    /// Overwrites this slot with a freshly inserted block.
    #[inline]
    fn fill(&mut self, tag: u64, block_addr: u64, clock: u64) {
        self.valid = true;
        self.tag = tag;
        self.block_addr = block_addr;
        self.lru_stamp = clock;
        self.access_count = 1;
    }
}

/// One set: a fixed run of lines plus the set-local logical clock.
#[derive(Debug)]
struct CacheSet {
    lines: Vec<Line>,
    clock: u64,
}

impl CacheSet {
    fn new(lines_per_set: usize) -> Self {
        Self {
            lines: vec![Line::INVALID; lines_per_set],
            clock: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// A set-associative cache model driven one address at a time.
///
/// All storage is allocated up front by [`CacheEngine::new`] and only
/// overwritten in place afterwards; nothing is created or destroyed
/// mid-trace. Engines are independent values — construct as many as needed.
///
/// # Example
///
/// ```
/// use waycache::addr::Geometry;
/// use waycache::engine::{AccessOutcome, CacheEngine, Policy};
///
/// // blockBits=2, setBits=1, one line per set: 0x0 and 0x4 collide
/// let geometry = Geometry::new(2, 1, 1).unwrap();
/// let mut cache = CacheEngine::new(geometry, Policy::Lru, "L1");
///
/// assert_eq!(cache.access(0x0), AccessOutcome::Miss { insert_block: 0x0 });
/// assert_eq!(
///     cache.access(0x4),
///     AccessOutcome::Evict { victim_block: 0x0, insert_block: 0x4 },
/// );
/// assert_eq!(
///     cache.access(0x0),
///     AccessOutcome::Evict { victim_block: 0x4, insert_block: 0x0 },
/// );
/// assert_eq!(cache.summary().to_string(), "L1 hits: 0, misses: 3, evictions: 2");
/// ```
#[derive(Debug)]
pub struct CacheEngine {
    geometry: Geometry,
    policy: Policy,
    name: String,
    sets: Vec<CacheSet>,
    hit_count: u64,
    miss_count: u64,
    eviction_count: u64,
    #[cfg(feature = "metrics")]
    metrics: EngineMetrics,
}

impl CacheEngine {
    /// Creates an engine with the given geometry, policy, and display name.
    ///
    /// Allocates all `2^set_bits * lines_per_set` lines immediately, every
    /// line invalid, every counter and clock zero. The geometry has already
    /// been validated by [`Geometry::new`], so this cannot fail.
    pub fn new(geometry: Geometry, policy: Policy, name: impl Into<String>) -> Self {
        let sets = (0..geometry.num_sets())
            .map(|_| CacheSet::new(geometry.lines_per_set()))
            .collect();
        Self {
            geometry,
            policy,
            name: name.into(),
            sets,
            hit_count: 0,
            miss_count: 0,
            eviction_count: 0,
            #[cfg(feature = "metrics")]
            metrics: EngineMetrics::default(),
        }
    }

    /// The geometry this engine was built with.
    #[inline]
    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    /// The replacement policy in effect.
    #[inline]
    pub fn policy(&self) -> Policy {
        self.policy
    }

    /// Display name used in the summary line.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Total accesses that hit so far.
    #[inline]
    pub fn hit_count(&self) -> u64 {
        self.hit_count
    }

    /// Total accesses that missed so far.
    #[inline]
    pub fn miss_count(&self) -> u64 {
        self.miss_count
    }

    /// Total misses that evicted a valid line so far.
    #[inline]
    pub fn eviction_count(&self) -> u64 {
        self.eviction_count
    }

    /// Returns `true` if `addr` is currently cached.
    ///
    /// Scans every line of the target set for a valid matching tag. No side
    /// effects: does not advance clocks or counters.
    pub fn probe(&self, addr: u64) -> bool {
        #[cfg(feature = "metrics")]
        self.metrics.record_probe();

        let tag = self.geometry.tag(addr);
        let set = &self.sets[self.geometry.set_index(addr) as usize];
        set.lines.iter().any(|line| line.valid && line.tag == tag)
    }

    /// Routes one trace address through the cache and returns the outcome.
    ///
    /// Advances the target set's clock exactly once before branching, then
    /// takes the hit path, the insert-into-empty path, or the
    /// select-victim-and-replace path. This is the only mutating entry
    /// point; callers drive it strictly sequentially.
    pub fn access(&mut self, addr: u64) -> AccessOutcome {
        #[cfg(feature = "metrics")]
        self.metrics.record_access();

        let set_index = self.geometry.set_index(addr) as usize;
        self.sets[set_index].clock += 1;

        if self.probe(addr) {
            self.touch_hit_line(addr);
            self.hit_count += 1;

            #[cfg(feature = "metrics")]
            self.metrics.record_hit();

            return AccessOutcome::Hit;
        }

        let insert_block = self.geometry.block_address(addr);
        if self.insert_into_empty(addr) {
            self.miss_count += 1;

            #[cfg(feature = "metrics")]
            self.metrics.record_empty_insert();

            return AccessOutcome::Miss { insert_block };
        }

        let victim_block = self.select_victim(addr);
        self.replace_line(victim_block, addr);
        self.miss_count += 1;
        self.eviction_count += 1;

        #[cfg(feature = "metrics")]
        self.metrics.record_eviction();

        AccessOutcome::Evict {
            victim_block,
            insert_block,
        }
    }

    /// Captures the aggregate statistics under the engine's display name.
    pub fn summary(&self) -> CacheSummary {
        CacheSummary {
            name: self.name.clone(),
            hits: self.hit_count,
            misses: self.miss_count,
            evictions: self.eviction_count,
        }
    }

    /// Snapshot of the per-operation counters.
    #[cfg(feature = "metrics")]
    pub fn metrics_snapshot(&self) -> EngineMetricsSnapshot {
        self.metrics.snapshot(
            self.geometry.num_sets(),
            self.geometry.lines_per_set(),
        )
    }

    // =======================================================================
    // Internal paths
    // =======================================================================

    /// Hit path: refresh the matching line's policy counter.
    ///
    /// LRU stamps the line with the set's current clock; LFU bumps the
    /// line's touch count. Only called after a successful probe.
    fn touch_hit_line(&mut self, addr: u64) {
        let tag = self.geometry.tag(addr);
        let set = &mut self.sets[self.geometry.set_index(addr) as usize];
        let clock = set.clock;
        for line in &mut set.lines {
            if line.valid && line.tag == tag {
                match self.policy {
                    Policy::Lru => line.lru_stamp = clock,
                    Policy::Lfu => line.access_count += 1,
                }
                return;
            }
        }
        debug_assert!(false, "touch_hit_line called without a matching line");
    }

    /// Miss path, part one: fill the first invalid line in set order.
    ///
    /// Returns `false` if the set is full.
    fn insert_into_empty(&mut self, addr: u64) -> bool {
        let tag = self.geometry.tag(addr);
        let block_addr = self.geometry.block_address(addr);
        let set = &mut self.sets[self.geometry.set_index(addr) as usize];
        let clock = set.clock;
        for line in &mut set.lines {
            if !line.valid {
                line.fill(tag, block_addr, clock);
                return true;
            }
        }
        false
    }

    /// Miss path, part two: pick the victim in `addr`'s (full) set.
    ///
    /// Strict `<` comparisons keep the first minimum encountered, so exact
    /// ties deterministically favor the lowest slot index. Under LFU, lines
    /// tied on touch count fall back to the oldest LRU stamp.
    ///
    /// Returns the victim's block address, not a slot reference; the caller
    /// re-locates the physical line during replacement.
    fn select_victim(&self, addr: u64) -> u64 {
        let set = &self.sets[self.geometry.set_index(addr) as usize];
        let mut victim_block = 0u64;
        let mut min_stamp = u64::MAX;
        let mut min_count = u64::MAX;

        #[cfg(feature = "metrics")]
        self.metrics.record_victim_scan(set.lines.len());

        for line in &set.lines {
            match self.policy {
                Policy::Lru => {
                    if line.lru_stamp < min_stamp {
                        victim_block = line.block_addr;
                        min_stamp = line.lru_stamp;
                    }
                },
                Policy::Lfu => {
                    if line.access_count < min_count {
                        victim_block = line.block_addr;
                        min_count = line.access_count;
                        min_stamp = line.lru_stamp;
                    } else if line.access_count == min_count && line.lru_stamp < min_stamp {
                        victim_block = line.block_addr;
                        min_stamp = line.lru_stamp;
                    }
                },
            }
        }
        victim_block
    }

    /// Miss path, part three: overwrite the victim line with the insert
    /// address.
    ///
    /// The victim is identified only by block address; both addresses map to
    /// the same set by construction, so the scan stays within one set. A
    /// missing victim means selection and replacement disagreed — an
    /// internal defect, asserted in debug and a no-op in release.
    fn replace_line(&mut self, victim_block: u64, insert_addr: u64) {
        let tag = self.geometry.tag(insert_addr);
        let block_addr = self.geometry.block_address(insert_addr);
        let set = &mut self.sets[self.geometry.set_index(insert_addr) as usize];
        let clock = set.clock;
        for line in &mut set.lines {
            if line.valid && line.block_addr == victim_block {
                line.fill(tag, block_addr, clock);
                return;
            }
        }
        debug_assert!(false, "victim block {:#x} not found in its set", victim_block);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(block_bits: u32, set_bits: u32, lines: usize, policy: Policy) -> CacheEngine {
        let geometry = Geometry::new(block_bits, set_bits, lines).unwrap();
        CacheEngine::new(geometry, policy, "test")
    }

    #[test]
    fn test_first_access_misses_then_hits() {
        let mut cache = engine(4, 4, 2, Policy::Lru);

        assert!(!cache.probe(0x100));
        assert_eq!(cache.access(0x100), AccessOutcome::Miss { insert_block: 0x100 });
        assert!(cache.probe(0x100));
        assert_eq!(cache.access(0x100), AccessOutcome::Hit);
    }

    #[test]
    fn test_offsets_within_a_block_share_a_line() {
        let mut cache = engine(4, 4, 2, Policy::Lru);

        assert_eq!(cache.access(0x100), AccessOutcome::Miss { insert_block: 0x100 });
        // Same block, different offsets
        assert_eq!(cache.access(0x104), AccessOutcome::Hit);
        assert_eq!(cache.access(0x10f), AccessOutcome::Hit);
        assert_eq!(cache.hit_count(), 2);
        assert_eq!(cache.miss_count(), 1);
    }

    #[test]
    fn test_probe_has_no_side_effects() {
        let mut cache = engine(4, 2, 1, Policy::Lru);
        cache.access(0x40);
        let hits = cache.hit_count();
        let misses = cache.miss_count();

        for _ in 0..10 {
            assert!(cache.probe(0x40));
            assert!(!cache.probe(0x80000));
        }
        assert_eq!(cache.hit_count(), hits);
        assert_eq!(cache.miss_count(), misses);
    }

    #[test]
    fn test_set_fills_before_evicting() {
        // One set of 4 lines; 5 distinct blocks in that set force exactly
        // one eviction, on the 5th insertion.
        let mut cache = engine(4, 0, 4, Policy::Lru);

        for i in 0..4u64 {
            let outcome = cache.access(i << 4);
            assert!(matches!(outcome, AccessOutcome::Miss { .. }), "{:?}", outcome);
        }
        assert_eq!(
            cache.access(4 << 4),
            AccessOutcome::Evict {
                victim_block: 0,
                insert_block: 4 << 4,
            },
        );
        assert_eq!(cache.eviction_count(), 1);
    }

    #[test]
    fn test_lru_evicts_oldest() {
        // A, B fill the set; C evicts A; touching B then inserting D evicts C.
        let mut cache = engine(2, 0, 2, Policy::Lru);
        let (a, b, c, d) = (0x00, 0x04, 0x08, 0x0c);

        assert_eq!(cache.access(a), AccessOutcome::Miss { insert_block: a });
        assert_eq!(cache.access(b), AccessOutcome::Miss { insert_block: b });
        assert_eq!(
            cache.access(c),
            AccessOutcome::Evict { victim_block: a, insert_block: c },
        );
        assert_eq!(cache.access(b), AccessOutcome::Hit);
        assert_eq!(
            cache.access(d),
            AccessOutcome::Evict { victim_block: c, insert_block: d },
        );
    }

    #[test]
    fn test_lfu_evicts_least_frequent() {
        // Insert A and B, hit A; B (count 1) loses to A (count 2).
        let mut cache = engine(2, 0, 2, Policy::Lfu);
        let (a, b, c) = (0x00, 0x04, 0x08);

        cache.access(a);
        cache.access(b);
        assert_eq!(cache.access(a), AccessOutcome::Hit);
        assert_eq!(
            cache.access(c),
            AccessOutcome::Evict { victim_block: b, insert_block: c },
        );
    }

    #[test]
    fn test_lfu_tie_breaks_by_lru_stamp() {
        // All counts equal; the stalest stamp loses.
        let mut cache = engine(2, 0, 2, Policy::Lfu);
        let (a, b, c) = (0x00, 0x04, 0x08);

        cache.access(a); // stamp 1, count 1
        cache.access(b); // stamp 2, count 1
        assert_eq!(
            cache.access(c),
            AccessOutcome::Evict { victim_block: a, insert_block: c },
        );
    }

    #[test]
    fn test_lru_scan_keeps_first_minimum() {
        // The strict-less scan must settle on the single oldest stamp even
        // when it sits in slot 0 and every later slot is newer.
        let mut cache = engine(2, 0, 3, Policy::Lru);
        let (a, b, c, d) = (0x00, 0x04, 0x08, 0x0c);

        cache.access(a); // slot 0, stamp 1
        cache.access(b); // slot 1, stamp 2
        cache.access(c); // slot 2, stamp 3
        // a is oldest; d must evict a (slot 0), not b or c
        assert_eq!(
            cache.access(d),
            AccessOutcome::Evict { victim_block: a, insert_block: d },
        );
    }

    #[test]
    fn test_spec_worked_example() {
        // blockBits=2, setBits=1, 1 line/set, LRU; 0x0 and 0x4 share set bit 2.
        let mut cache = engine(2, 1, 1, Policy::Lru);

        assert_eq!(cache.access(0x0), AccessOutcome::Miss { insert_block: 0x0 });
        assert_eq!(
            cache.access(0x4),
            AccessOutcome::Evict { victim_block: 0x0, insert_block: 0x4 },
        );
        assert_eq!(
            cache.access(0x0),
            AccessOutcome::Evict { victim_block: 0x4, insert_block: 0x0 },
        );
    }

    #[test]
    fn test_counters_partition_accesses() {
        let mut cache = engine(3, 2, 2, Policy::Lfu);
        let addrs: Vec<u64> = (0..200u64).map(|i| (i * 37) % 0x400).collect();

        for (n, addr) in addrs.iter().enumerate() {
            cache.access(*addr);
            assert_eq!(cache.hit_count() + cache.miss_count(), n as u64 + 1);
            assert!(cache.eviction_count() <= cache.miss_count());
        }
    }

    #[test]
    fn test_summary_matches_counters() {
        let mut cache = engine(2, 1, 1, Policy::Lru);
        cache.access(0x0);
        cache.access(0x4);
        cache.access(0x0);

        let summary = cache.summary();
        assert_eq!(summary.name, "test");
        assert_eq!(summary.hits, cache.hit_count());
        assert_eq!(summary.misses, cache.miss_count());
        assert_eq!(summary.evictions, cache.eviction_count());
        assert_eq!(summary.to_string(), "test hits: 0, misses: 3, evictions: 2");
    }

    #[test]
    fn test_engines_are_independent() {
        let mut a = engine(2, 1, 1, Policy::Lru);
        let b = engine(2, 1, 1, Policy::Lru);

        a.access(0x0);
        assert_eq!(a.miss_count(), 1);
        assert_eq!(b.miss_count(), 0);
        assert!(!b.probe(0x0));
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("lru".parse::<Policy>().unwrap(), Policy::Lru);
        assert_eq!("LFU".parse::<Policy>().unwrap(), Policy::Lfu);
        assert!("mru".parse::<Policy>().is_err());
    }

    #[test]
    fn test_outcome_display_formats() {
        assert_eq!(AccessOutcome::Hit.to_string(), "[status: hit]");
        assert_eq!(
            AccessOutcome::Miss { insert_block: 0x7f0 }.to_string(),
            "[status: miss, insert_block: 0x7f0]",
        );
        assert_eq!(
            AccessOutcome::Evict { victim_block: 0x0, insert_block: 0x7f0 }.to_string(),
            "[status: miss eviction, victim_block: 0x0, insert_block: 0x7f0]",
        );
    }
}
