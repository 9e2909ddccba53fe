use std::time::Duration;
use thiserror::Error;

/// Failure of a single request to the generation service, classified by the transport
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ServiceFailure {
    #[error("generation service returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("attempt timed out after {0:?}")]
    Timeout(Duration),
    #[error("network error: {0}")]
    Network(String),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("failed to build request: {0}")]
    InvalidRequest(String),
    #[error("invalid credential: {0}")]
    InvalidCredential(String),
}

impl ServiceFailure {
    /// Rate limiting, server errors, timeouts and network failures are worth another attempt
    pub fn is_retryable(&self) -> bool {
        match self {
            ServiceFailure::Status { status, .. } => *status == 429 || (500..600).contains(status),
            ServiceFailure::Timeout(_) | ServiceFailure::Network(_) => true,
            ServiceFailure::MalformedResponse(_)
            | ServiceFailure::InvalidRequest(_)
            | ServiceFailure::InvalidCredential(_) => false,
        }
    }
}

/// Errors raised while validating or executing a parameter sweep
#[derive(Debug, Error)]
pub enum SweepError {
    #[error("prompt must not be empty")]
    EmptyPrompt,
    #[error("invalid grid: no {dimension} values within bounds")]
    InvalidGrid { dimension: &'static str },
    #[error("grid too large ({combinations} combinations), reduce to at most {cap}")]
    GridTooLarge { combinations: usize, cap: usize },
    #[error("environment variable {var} is not set")]
    MissingCredential { var: String },
    #[error("gave up after {attempts} attempts: {source}")]
    TransientService {
        attempts: u32,
        #[source]
        source: ServiceFailure,
    },
    #[error(transparent)]
    TerminalService(ServiceFailure),
}
