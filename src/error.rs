//! Error types for indi-census.

use thiserror::Error;

/// Main error type for indi-census operations.
#[derive(Error, Debug)]
pub enum CensusError {
    // Cli args errors
    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(
        "No access token for {host}: set {env_var} or pass --allow-anonymous"
    )]
    MissingToken { host: String, env_var: String },

    // Network/API errors
    #[error("Network request failed: {0}")]
    NetworkError(String),

    #[error("API rate limit exceeded for {url} after {attempts} attempts")]
    RateLimitExceeded { url: String, attempts: u32 },

    #[error("Unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    // Parsing errors - automatic conversions via #[from]
    #[error("JSON parse error: {0}")]
    JsonParseError(#[from] serde_json::Error),

    #[error("URL parse error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] log::SetLoggerError),

    // Generic wrapper for other errors
    #[error(transparent)]
    Other(#[from] color_eyre::Report),
}

/// Result type alias using CensusError
pub type Result<T> = std::result::Result<T, CensusError>;

impl CensusError {
    /// Create a network error with context
    pub fn network(msg: impl Into<String>) -> Self {
        Self::NetworkError(msg.into())
    }

    /// Create an invalid config error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a missing token error
    pub fn missing_token(
        host: impl Into<String>,
        env_var: impl Into<String>,
    ) -> Self {
        Self::MissingToken {
            host: host.into(),
            env_var: env_var.into(),
        }
    }

    /// Errors worth retrying with backoff: timeouts, refused connections and
    /// truncated bodies.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::NetworkError(_))
    }

    /// Errors that stop the run before any host is queried.
    pub fn is_fatal_config(&self) -> bool {
        matches!(
            self,
            Self::InvalidArgs(_)
                | Self::InvalidConfig(_)
                | Self::MissingToken { .. }
        )
    }
}

// Generic I/O errors are wrapped in Other
impl From<std::io::Error> for CensusError {
    fn from(err: std::io::Error) -> Self {
        Self::Other(color_eyre::Report::from(err))
    }
}

// Implement From for reqwest errors (network/API)
impl From<reqwest::Error> for CensusError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            Self::InvalidConfig(err.to_string())
        } else {
            Self::NetworkError(err.to_string())
        }
    }
}

// Implement From for reqwest header errors (needs custom message)
impl From<reqwest::header::InvalidHeaderValue> for CensusError {
    fn from(err: reqwest::header::InvalidHeaderValue) -> Self {
        Self::InvalidConfig(format!("Invalid header value: {}", err))
    }
}
