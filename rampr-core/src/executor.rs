use std::future::Future;

pub use rampr_metrics::{ErrorKind, RequestOutcome};

#[cfg(feature = "http")]
mod http;
mod stub;

#[cfg(feature = "http")]
pub use http::HttpExecutor;
pub use stub::StubExecutor;

/// One unit of work issued by a virtual user.
///
/// Implementations never fail: every error is folded into the returned [`RequestOutcome`]
/// (`success = false` plus an [`ErrorKind`]) so a bad request cannot stop a virtual user.
pub trait RequestExecutor: Send + Sync + 'static {
    fn execute(&self) -> impl Future<Output = RequestOutcome> + Send;
}

impl<E: RequestExecutor> RequestExecutor for std::sync::Arc<E> {
    fn execute(&self) -> impl Future<Output = RequestOutcome> + Send {
        (**self).execute()
    }
}
