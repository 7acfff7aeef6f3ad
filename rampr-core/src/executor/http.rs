use std::sync::Arc;
use std::time::{Duration, Instant};

use rampr_http::{HttpClient, HttpRequest, HttpTransportErrorKind};

use super::{ErrorKind, RequestExecutor, RequestOutcome};

/// Issues a plain `GET` against a fixed URL. Statuses below 400 count as success.
#[derive(Debug, Clone)]
pub struct HttpExecutor {
    client: Arc<HttpClient>,
    url: Arc<str>,
    timeout: Option<Duration>,
}

impl HttpExecutor {
    #[must_use]
    pub fn new(url: impl Into<Arc<str>>) -> Self {
        Self::with_client(Arc::new(HttpClient::default()), url)
    }

    #[must_use]
    pub fn with_client(client: Arc<HttpClient>, url: impl Into<Arc<str>>) -> Self {
        Self {
            client,
            url: url.into(),
            timeout: None,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

fn error_kind(err: &rampr_http::Error) -> ErrorKind {
    match err.transport_error_kind() {
        HttpTransportErrorKind::Timeout => ErrorKind::Timeout,
        HttpTransportErrorKind::Connect => ErrorKind::Connect,
        other => ErrorKind::Transport(other.into()),
    }
}

impl RequestExecutor for HttpExecutor {
    async fn execute(&self) -> RequestOutcome {
        let req = HttpRequest::get(&self.url).with_timeout(self.timeout);

        let issued_at = Instant::now();
        let res = self.client.request(req).await;
        let latency = issued_at.elapsed();

        match res {
            Ok(res) if res.is_success() => RequestOutcome::success(issued_at, latency),
            Ok(res) => RequestOutcome::failure(issued_at, latency, ErrorKind::Status(res.status)),
            Err(err) => {
                tracing::trace!(url = %self.url, error = %err, "request failed");
                RequestOutcome::failure(issued_at, latency, error_kind(&err))
            }
        }
    }
}
