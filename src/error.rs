use std::path::PathBuf;
use thiserror::Error;

/// Main error type for crucible
#[derive(Error, Debug)]
pub enum CrucibleError {
    #[error("IO error: {source}")]
    Io {
        source: std::io::Error,
        path: Option<PathBuf>,
    },

    #[error("Failed to load configuration: {message}")]
    Config { message: String },

    #[error("Generation request failed: {message}")]
    Generation { message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Parse error: {message}")]
    Parse { message: String },

    #[error("{0}")]
    Other(String),
}

impl CrucibleError {
    /// Create a new IO error with path context
    pub fn io_error(err: std::io::Error, path: Option<impl Into<PathBuf>>) -> Self {
        Self::Io {
            source: err,
            path: path.map(|p| p.into()),
        }
    }

    /// Create a new configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new generation error
    pub fn generation_error(message: impl Into<String>) -> Self {
        Self::Generation {
            message: message.into(),
        }
    }

    /// Create a new parse error
    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Create a new generic error
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}

impl From<std::io::Error> for CrucibleError {
    fn from(error: std::io::Error) -> Self {
        CrucibleError::io_error(error, None::<PathBuf>)
    }
}

impl From<serde_json::Error> for CrucibleError {
    fn from(error: serde_json::Error) -> Self {
        CrucibleError::parse_error(error.to_string())
    }
}

/// Result type alias using CrucibleError
pub type CrucibleResult<T> = Result<T, CrucibleError>;
