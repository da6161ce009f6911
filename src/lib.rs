//! waycache: a trace-driven set-associative cache simulator.
//!
//! Models a hardware cache with configurable geometry (block offset bits,
//! set index bits, lines per set) and a configurable replacement policy
//! (LRU or LFU), reporting a hit/miss/eviction outcome for every address in
//! a memory trace plus aggregate statistics at the end.
//!
//! The engine lives in [`engine`], address field extraction in [`addr`], and
//! the trace-file harness in [`trace`]. The `waycache` binary wires them to a
//! command line.

pub mod addr;
pub mod engine;
pub mod error;

#[cfg(feature = "metrics")]
pub mod metrics;

pub mod prelude;
pub mod trace;
