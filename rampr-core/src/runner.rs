mod cancel;
mod config;
mod pool;
mod progress;
mod run;

pub use cancel::CancelToken;
pub use config::RunnerConfig;
pub use pool::{DrainOutcome, ReconcileOutcome, VirtualUserPool, VuState};
pub use progress::{LiveMetrics, ProgressFn, ProgressUpdate};
pub use run::{LoadRunner, RunReport, RunState};
