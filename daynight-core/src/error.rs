use thiserror::Error;

/// Stage of a sync sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Location,
    Fetch,
    Forward,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Stage::Location => "location",
            Stage::Fetch => "fetch",
            Stage::Forward => "forward",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("location request timed out")]
    Timeout,

    #[error("location permission denied")]
    PermissionDenied,

    #[error("location unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    #[error("message channel busy")]
    Busy,

    #[error("message rejected by watch: {0}")]
    Rejected(String),

    #[error("message channel I/O error: {0}")]
    Io(String),
}

/// Terminal failure of a single sync sequence.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error("Error requesting location: {0}")]
    LocationUnavailable(#[from] LocationError),

    #[error("{description} API request failed with status: {status_text}")]
    TransportFailure { description: String, status_text: String },

    #[error("Malformed sun data response: {0}")]
    MalformedResponse(String),

    #[error("Error sending sunrise/sunset info to watch: {0}")]
    ForwardingFailure(#[from] ChannelError),
}

impl SyncError {
    pub fn stage(&self) -> Stage {
        match self {
            SyncError::LocationUnavailable(_) => Stage::Location,
            SyncError::TransportFailure { .. } | SyncError::MalformedResponse(_) => Stage::Fetch,
            SyncError::ForwardingFailure(_) => Stage::Forward,
        }
    }
}
