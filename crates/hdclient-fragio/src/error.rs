use thiserror::Error;

/// Classification of a single fragment request's outcome. Never thrown
/// across an `await` boundary as a panic — every [`crate::FragmentIo`]
/// method resolves to one of these (or `Ok`) exactly once.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ClassifiedError {
    #[error("fragment request timed out after {timeout_ms}ms")]
    TimeoutError { timeout_ms: u64 },

    #[error("GET transport error: {description}")]
    GetError { description: String },

    #[error("PUT transport error: {description}")]
    PutError { description: String },

    #[error("DELETE transport error: {description}")]
    DeleteError { description: String },

    #[error("fragment endpoint replied with status {status}")]
    HttpError { status: u16 },
}

impl ClassifiedError {
    /// The HTTP-style status code this classification carries, per the
    /// taxonomy: timeouts are 504, transport/stream errors are 500,
    /// `HttpError` mirrors whatever the endpoint actually returned.
    pub fn code(&self) -> u16 {
        match self {
            ClassifiedError::TimeoutError { .. } => 504,
            ClassifiedError::GetError { .. }
            | ClassifiedError::PutError { .. }
            | ClassifiedError::DeleteError { .. } => 500,
            ClassifiedError::HttpError { status } => *status,
        }
    }

    /// A deliberate abort (e.g. to free a socket after a sibling
    /// fragment's timeout) surfaces as `GetError` with this fixed
    /// description, matching the wire-visible message implementations
    /// are expected to use for the case.
    pub fn aborted() -> ClassifiedError {
        ClassifiedError::GetError {
            description: "socket hang up".to_string(),
        }
    }
}
