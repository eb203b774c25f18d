use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AdvisorError {
    #[error("reasoning service unavailable: {0}")]
    UpstreamUnavailable(String),
    #[error("malformed reasoning reply: {0}")]
    MalformedResponse(String),
}

/// Failure of one assist request. None of these are retried and none are fatal to
/// the process.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AssistError {
    #[error("missing input: {0}")]
    MissingInput(String),
    #[error("speech recognition failed: {0}")]
    RecognitionFailure(String),
    #[error("upstream service unavailable: {0}")]
    UpstreamUnavailable(String),
    #[error("malformed upstream response: {0}")]
    MalformedResponse(String),
    #[error("internal failure: {0}")]
    InternalFailure(String),
}

impl AssistError {
    /// Stable machine-readable name, used in logs and debug artifacts.
    pub fn kind(&self) -> &'static str {
        match self {
            AssistError::MissingInput(_) => "missing_input",
            AssistError::RecognitionFailure(_) => "recognition_failure",
            AssistError::UpstreamUnavailable(_) => "upstream_unavailable",
            AssistError::MalformedResponse(_) => "malformed_response",
            AssistError::InternalFailure(_) => "internal_failure",
        }
    }
}

impl From<AdvisorError> for AssistError {
    fn from(e: AdvisorError) -> Self {
        match e {
            AdvisorError::UpstreamUnavailable(m) => AssistError::UpstreamUnavailable(m),
            AdvisorError::MalformedResponse(m) => AssistError::MalformedResponse(m),
        }
    }
}
