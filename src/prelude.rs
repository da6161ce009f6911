pub use crate::addr::Geometry;
pub use crate::engine::{AccessOutcome, CacheEngine, CacheSummary, Policy};
pub use crate::error::{ConfigError, TraceError};
pub use crate::trace::{load_trace, parse_trace, run_trace};

#[cfg(feature = "metrics")]
pub use crate::metrics::EngineMetricsSnapshot;
