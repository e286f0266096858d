use std::fmt;
use std::time::Duration;

/// Status code and message attached to an [`ActionError`]. Both are optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Detail {
    /// HTTP-style status code, if the failure came with one.
    pub status: Option<u16>,
    /// Human-readable explanation.
    pub message: Option<String>,
}

impl Detail {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl fmt::Display for Detail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.status, &self.message) {
            (Some(status), Some(message)) => write!(f, " (status {}): {}", status, message),
            (Some(status), None) => write!(f, " (status {})", status),
            (None, Some(message)) => write!(f, ": {}", message),
            (None, None) => Ok(()),
        }
    }
}

/// Why an action failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    #[error("network request failed{0}")]
    NetworkRequestFailure(Detail),

    #[error("timed out{0}")]
    Timeout(Detail),

    #[error("cancelled{0}")]
    Cancelled(Detail),

    #[error("decoding failed{0}")]
    DecodingFailure(Detail),

    #[error("snapshot failed{0}")]
    SnapshotFailure(Detail),

    #[error("not yet implemented{0}")]
    NotYetImplemented(Detail),

    #[error("engine failure: {0}")]
    EngineFailure(String),
}

/// Field-less discriminant of [`ActionError`], handy for matching and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NetworkRequestFailure,
    Timeout,
    Cancelled,
    DecodingFailure,
    SnapshotFailure,
    NotYetImplemented,
    EngineFailure,
}

impl ActionError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::NetworkRequestFailure(Detail::new().message(message))
    }

    /// Network failure identified only by its status code.
    pub fn status(status: u16) -> Self {
        Self::NetworkRequestFailure(Detail::new().status(status))
    }

    pub fn timeout(after: Duration) -> Self {
        Self::Timeout(Detail::new().message(format!("no result within {:?}", after)))
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::Cancelled(Detail::new().message(message))
    }

    pub fn decoding(message: impl Into<String>) -> Self {
        Self::DecodingFailure(Detail::new().message(message))
    }

    pub fn snapshot(message: impl Into<String>) -> Self {
        Self::SnapshotFailure(Detail::new().message(message))
    }

    pub fn not_yet_implemented(message: impl Into<String>) -> Self {
        Self::NotYetImplemented(Detail::new().message(message))
    }

    pub fn engine(message: impl Into<String>) -> Self {
        Self::EngineFailure(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NetworkRequestFailure(_) => ErrorKind::NetworkRequestFailure,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::Cancelled(_) => ErrorKind::Cancelled,
            Self::DecodingFailure(_) => ErrorKind::DecodingFailure,
            Self::SnapshotFailure(_) => ErrorKind::SnapshotFailure,
            Self::NotYetImplemented(_) => ErrorKind::NotYetImplemented,
            Self::EngineFailure(_) => ErrorKind::EngineFailure,
        }
    }

    /// Attached detail. `EngineFailure` carries a bare message instead.
    pub fn detail(&self) -> Option<&Detail> {
        match self {
            Self::NetworkRequestFailure(d)
            | Self::Timeout(d)
            | Self::Cancelled(d)
            | Self::DecodingFailure(d)
            | Self::SnapshotFailure(d)
            | Self::NotYetImplemented(d) => Some(d),
            Self::EngineFailure(_) => None,
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        self.detail().and_then(|d| d.status)
    }
}
