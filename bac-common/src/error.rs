//! Common error types for the break-away controller

use thiserror::Error;

/// Common result type for break-away controller operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by the controller crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed or out-of-range timecode
    #[error("Invalid timecode: {0}")]
    InvalidTimeCode(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}
