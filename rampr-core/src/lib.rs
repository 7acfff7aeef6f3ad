mod error;
mod executor;
mod stage;
mod timeline;

pub mod runner;

#[cfg(feature = "http")]
pub use executor::HttpExecutor;
pub use error::{Error, Result};
pub use executor::{ErrorKind, RequestExecutor, RequestOutcome, StubExecutor};
pub use rampr_metrics::{HistogramSummary, MetricsCollector, MetricsSnapshot, RpsSummary};
pub use runner::{
    CancelToken, DrainOutcome, LiveMetrics, LoadRunner, ProgressFn, ProgressUpdate,
    ReconcileOutcome, RunReport, RunState, RunnerConfig, VirtualUserPool, VuState,
};
pub use stage::{Stage, parse_duration};
pub use timeline::{StageSnapshot, StageTimeline};
