pub mod collector;
pub mod histogram;
pub mod outcome;
pub mod stats;

pub use collector::{MetricsCollector, MetricsSnapshot, RpsSummary};
pub use histogram::HistogramSummary;
pub use outcome::{ErrorClass, ErrorKind, RequestOutcome};
pub use stats::{CounterSnapshot, RunningStats, per_sec};
