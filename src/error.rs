use thiserror::Error;

/// Failures from the propose step. The cycle aborts and nothing is
/// committed to context.
#[derive(Debug, Error)]
pub enum ProposalError {
    #[error("backend request failed: {0}")]
    Backend(#[source] reqwest::Error),

    #[error("backend request timed out")]
    Timeout,

    #[error("backend returned HTTP {0}")]
    Status(u16),

    #[error("malformed model response: {0}")]
    Malformed(String),

    #[error("model returned an empty command")]
    EmptyCommand,
}

impl From<reqwest::Error> for ProposalError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProposalError::Timeout
        } else {
            ProposalError::Backend(err)
        }
    }
}

/// The subprocess could not be run at all. Reported as a normal result
/// with a synthetic exit code, never fatal.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("failed to spawn command: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Fatal at session start.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("tool '{0}' is not registered (see 'cmdllm tools')")]
    UnknownTool(String),

    #[error("{0} credentials are not configured (edit with 'cmdllm config')")]
    MissingCredentials(&'static str),
}
