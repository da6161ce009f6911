//! Trace-file parsing and the loop that drives an engine over a trace.
//!
//! A trace is a text file with one memory access per line: a hex address,
//! with or without a `0x` prefix. Blank lines and lines starting with `#`
//! are skipped. The runner feeds each address to
//! [`CacheEngine::access`](crate::engine::CacheEngine::access) in file order
//! and optionally echoes the per-access outcome in the bracketed format the
//! outcome's `Display` impl renders.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;

use crate::engine::{CacheEngine, CacheSummary};
use crate::error::TraceError;

/// Parses one trace line into an address.
///
/// Accepts `deadbeef` or `0xdeadbeef`. Returns `None` for blank lines and
/// `#` comments.
fn parse_line(line: &str) -> Result<Option<u64>, TraceError> {
    let entry = line.trim();
    if entry.is_empty() || entry.starts_with('#') {
        return Ok(None);
    }
    let digits = entry
        .strip_prefix("0x")
        .or_else(|| entry.strip_prefix("0X"))
        .unwrap_or(entry);
    u64::from_str_radix(digits, 16)
        .map(Some)
        .map_err(|_| TraceError::new(format!("invalid address `{}`", entry)))
}

/// Reads a trace from any buffered reader, returning addresses in order.
///
/// # Example
///
/// ```
/// use waycache::trace::parse_trace;
///
/// let trace = "# warmup\n0x100\n104\n\n0x200\n";
/// let addrs = parse_trace(trace.as_bytes()).unwrap();
/// assert_eq!(addrs, vec![0x100, 0x104, 0x200]);
/// ```
pub fn parse_trace<R: BufRead>(reader: R) -> Result<Vec<u64>, TraceError> {
    let mut addresses = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        match parse_line(&line) {
            Ok(Some(addr)) => addresses.push(addr),
            Ok(None) => {},
            Err(err) => return Err(TraceError::at_line(index + 1, err)),
        }
    }
    Ok(addresses)
}

/// Reads a trace file from disk.
pub fn load_trace(path: impl AsRef<Path>) -> Result<Vec<u64>, TraceError> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|err| TraceError::new(format!("{}: {}", path.display(), err)))?;
    parse_trace(BufReader::new(file))
}

/// Drives `engine` over `addresses` in order.
///
/// With `echo` set, writes one line per access —
/// `0x<addr> [status: ...]` — matching the original simulator's per-access
/// output. Returns the engine's summary after the last access; the caller
/// decides whether to print it.
pub fn run_trace<W: Write>(
    engine: &mut CacheEngine,
    addresses: &[u64],
    mut echo: Option<&mut W>,
) -> io::Result<CacheSummary> {
    for &addr in addresses {
        let outcome = engine.access(addr);
        if let Some(out) = echo.as_deref_mut() {
            writeln!(out, "{:#x} {}", addr, outcome)?;
        }
    }
    Ok(engine.summary())
}
