use std::fmt;
use std::time::{Duration, Instant};

/// Coarse failure category, used to group the error breakdown.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, strum::Display, strum::EnumString,
)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorClass {
    Timeout,
    Connect,
    Status,
    Transport,
    Panicked,
    Injected,
}

/// Why a single request failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorKind {
    Timeout,
    Connect,
    /// The server answered with a non-success status code.
    Status(u16),
    /// Any other transport failure, named by the transport's error-kind label.
    Transport(&'static str),
    /// The executor future panicked; the virtual user keeps running.
    Panicked,
    /// Failure injected by the stub executor.
    Injected,
}

impl ErrorKind {
    #[must_use]
    pub fn class(self) -> ErrorClass {
        match self {
            Self::Timeout => ErrorClass::Timeout,
            Self::Connect => ErrorClass::Connect,
            Self::Status(_) => ErrorClass::Status,
            Self::Transport(_) => ErrorClass::Transport,
            Self::Panicked => ErrorClass::Panicked,
            Self::Injected => ErrorClass::Injected,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(code) => write!(f, "http_status:{code}"),
            Self::Transport(kind) => write!(f, "http_error:{kind}"),
            other => write!(f, "{}", other.class()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestOutcome {
    pub issued_at: Instant,
    pub latency: Duration,
    pub success: bool,
    pub error_kind: Option<ErrorKind>,
}

impl RequestOutcome {
    #[must_use]
    pub fn success(issued_at: Instant, latency: Duration) -> Self {
        Self {
            issued_at,
            latency,
            success: true,
            error_kind: None,
        }
    }

    #[must_use]
    pub fn failure(issued_at: Instant, latency: Duration, kind: ErrorKind) -> Self {
        Self {
            issued_at,
            latency,
            success: false,
            error_kind: Some(kind),
        }
    }
}
