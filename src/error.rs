//! Error types for the waycache library.
//!
//! ## Key Components
//!
//! - [`ConfigError`]: Returned when cache geometry or policy parameters are
//!   invalid (e.g. zero associativity, offset + index bits exceeding the
//!   address width).
//! - [`TraceError`]: Returned when a trace file cannot be read or a trace
//!   line cannot be parsed as an address.
//!
//! ## Example Usage
//!
//! ```
//! use waycache::addr::Geometry;
//! use waycache::error::ConfigError;
//!
//! // Fallible constructor for user-configurable parameters
//! let geometry: Result<Geometry, ConfigError> = Geometry::new(4, 2, 2);
//! assert!(geometry.is_ok());
//!
//! // Invalid geometry is caught without panicking
//! let bad = Geometry::new(40, 30, 2);
//! assert!(bad.is_err());
//! ```

use std::fmt;
use std::io;

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Error returned when cache configuration parameters are invalid.
///
/// Produced by [`Geometry::new`](crate::addr::Geometry::new) and by
/// [`Policy::from_str`](crate::engine::Policy). Carries a human-readable
/// description of which parameter failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError(String);

impl ConfigError {
    /// Creates a new `ConfigError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// TraceError
// ---------------------------------------------------------------------------

/// Error returned when a trace file cannot be read or parsed.
///
/// Parse failures carry the 1-based line number of the offending entry so
/// the operator can fix the trace.
#[derive(Debug)]
pub struct TraceError(String);

impl TraceError {
    /// Creates a new `TraceError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Creates a parse error tagged with the offending line number.
    #[inline]
    pub fn at_line(line: usize, msg: impl fmt::Display) -> Self {
        Self(format!("line {}: {}", line, msg))
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TraceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for TraceError {}

impl From<io::Error> for TraceError {
    fn from(err: io::Error) -> Self {
        Self(err.to_string())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- ConfigError ------------------------------------------------------

    #[test]
    fn config_display_shows_message() {
        let err = ConfigError::new("lines per set must be > 0");
        assert_eq!(err.to_string(), "lines per set must be > 0");
    }

    #[test]
    fn config_message_accessor() {
        let err = ConfigError::new("test");
        assert_eq!(err.message(), "test");
    }

    #[test]
    fn config_clone_and_eq() {
        let a = ConfigError::new("x");
        let b = a.clone();
        assert_eq!(a, b);
    }

    #[test]
    fn config_implements_std_error() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<ConfigError>();
    }

    // -- TraceError -------------------------------------------------------

    #[test]
    fn trace_at_line_prefixes_line_number() {
        let err = TraceError::at_line(7, "invalid address `zzz`");
        assert_eq!(err.to_string(), "line 7: invalid address `zzz`");
    }

    #[test]
    fn trace_from_io_error_keeps_message() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "no such trace");
        let err = TraceError::from(io_err);
        assert!(err.message().contains("no such trace"));
    }

    #[test]
    fn trace_implements_std_error() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<TraceError>();
    }
}
