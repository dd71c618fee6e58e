use hdclient_fragio::ClassifiedError;
use thiserror::Error;

/// User-visible error taxonomy. Every variant carries (or can compute) a
/// status code per §7: `ParseError` 400, `CorruptedData`/`ConfigError`
/// 422, fragment-transport errors whatever [`ClassifiedError::code`]
/// says, `InternalError` 500.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum HdClientError {
    #[error("ParseError")]
    ParseError,

    #[error("CorruptedData")]
    CorruptedData {
        chunk_id: u64,
        fragment_id: u32,
        actual_crc: u32,
        expected_crc: u32,
    },

    #[error("No matching code pattern found")]
    ConfigError,

    #[error("requested range is invalid: {0}")]
    InvalidRange(String),

    #[error(transparent)]
    Fragment(#[from] ClassifiedError),

    #[error("{0}")]
    InternalError(String),
}

impl HdClientError {
    pub fn code(&self) -> u16 {
        match self {
            HdClientError::ParseError => 400,
            HdClientError::CorruptedData { .. } | HdClientError::ConfigError => 422,
            HdClientError::InvalidRange(_) => 416,
            HdClientError::Fragment(c) => c.code(),
            HdClientError::InternalError(_) => 500,
        }
    }
}

/// Picks the worst of several fragment-level errors observed across an
/// operation, preferring 5xx over 4xx (504 counts as 5xx) per §7's
/// propagation rule. Returns `None` for an empty slice.
pub fn worst_classified<'a>(errors: impl IntoIterator<Item = &'a ClassifiedError>) -> Option<ClassifiedError> {
    errors
        .into_iter()
        .max_by_key(|e| {
            let code = e.code();
            let is_server_error = code >= 500;
            (is_server_error, code)
        })
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worst_classified_prefers_5xx_over_4xx() {
        let errors = vec![
            ClassifiedError::HttpError { status: 404 },
            ClassifiedError::HttpError { status: 500 },
        ];
        assert_eq!(
            worst_classified(errors.iter()),
            Some(ClassifiedError::HttpError { status: 500 })
        );
    }

    #[test]
    fn worst_classified_counts_timeout_as_server_error() {
        let errors = vec![
            ClassifiedError::HttpError { status: 403 },
            ClassifiedError::TimeoutError { timeout_ms: 100 },
        ];
        assert_eq!(
            worst_classified(errors.iter()),
            Some(ClassifiedError::TimeoutError { timeout_ms: 100 })
        );
    }
}
