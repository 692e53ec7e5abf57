//! Error types for serlogin.

use std::io;
use thiserror::Error;

/// Main error type for serlogin operations.
///
/// Timeouts are not errors here: an empty read window is an ordinary outcome
/// that drives the login state machine.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid line or login parameters, rejected before the line is opened
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The serial line failed (device gone, permission denied, reader stopped)
    #[error("Transport error: {0}")]
    Transport(#[from] io::Error),
}

/// A configuration value that failed validation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Unsupported baud rate: {0}")]
    BaudRate(u32),

    #[error("Invalid parity '{0}' (expected N, E or O)")]
    Parity(String),

    #[error("Invalid byte width {0} (expected 5, 6, 7 or 8)")]
    DataBits(u8),

    #[error("Invalid stop bits '{0}' (expected 1 or 2)")]
    StopBits(String),

    #[error("Software and hardware flow control cannot both be enabled")]
    FlowControl,

    #[error("Invalid end time {0} (expected a positive number of seconds)")]
    EndTime(f64),

    #[error("User name must not be empty")]
    EmptyUser,

    #[error("Login prompt must not be empty")]
    EmptyPrompt,
}

impl ConfigError {
    /// Process exit code reported for this error by the binary.
    ///
    /// Line parameters share clap's usage-error code; login and timing
    /// parameters get their own.
    pub fn exit_code(&self) -> u8 {
        match self {
            ConfigError::BaudRate(_)
            | ConfigError::Parity(_)
            | ConfigError::DataBits(_)
            | ConfigError::StopBits(_)
            | ConfigError::FlowControl => 2,
            ConfigError::EndTime(_) | ConfigError::EmptyUser | ConfigError::EmptyPrompt => 3,
        }
    }
}

/// Result type alias using serlogin's Error.
pub type Result<T> = std::result::Result<T, Error>;
