use thiserror::Error;

/// Failures talking to the narrative generator. All of these are recoverable:
/// the turn controller turns them into a degraded turn.
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("generator unreachable: {0}")]
    Transport(String),

    #[error("generator timed out")]
    Timeout,

    #[error("generator returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("unexpected response envelope: {0}")]
    MalformedEnvelope(String),
}

impl From<reqwest::Error> for GeneratorError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            GeneratorError::Timeout
        } else if e.is_decode() {
            GeneratorError::MalformedEnvelope(e.to_string())
        } else {
            GeneratorError::Transport(e.to_string())
        }
    }
}

/// Operator-level setup problems. The only fatal class.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Server configuration error: missing {0}")]
    MissingApiKey(&'static str),

    #[error("settings IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("settings JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("could not build HTTP client: {0}")]
    Client(String),
}

/// Caller broke a precondition of the turn entry point.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TurnInputError {
    #[error("choice must not be empty")]
    EmptyChoice,

    #[error("free text is {len} chars, limit is {max}")]
    FreeTextTooLong { len: usize, max: usize },
}
