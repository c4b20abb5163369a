//! Error types for sqlrun.
//!
//! Defines the main error enum used throughout the application.

use thiserror::Error;

/// Main error type for sqlrun operations.
#[derive(Error, Debug)]
pub enum RunnerError {
    /// The container environment is not usable (runtime, image, network or
    /// database container missing). Carries a remediation hint.
    #[error("{message}\n{hint}")]
    Environment { message: String, hint: String },

    /// The container runtime binary could not be spawned.
    #[error("'{0}' command not found. Is it installed and on PATH?")]
    RuntimeNotFound(String),

    /// Configuration errors (unreadable env file, invalid values, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O failures while staging files or spawning processes.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal application errors (unexpected states, bugs, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RunnerError {
    /// Creates an environment error with a remediation hint.
    pub fn environment(message: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::Environment {
            message: message.into(),
            hint: hint.into(),
        }
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Environment { .. } => "Environment Misconfigured",
            Self::RuntimeNotFound(_) => "Runtime Missing",
            Self::Config(_) => "Configuration Error",
            Self::Io(_) => "I/O Error",
            Self::Internal(_) => "Internal Error",
        }
    }

    /// Returns the user-facing report: category, message and any hint.
    pub fn report(&self) -> String {
        format!("{}: {}", self.category(), self)
    }

    /// Returns the remediation hint, if this error carries one.
    pub fn hint(&self) -> Option<&str> {
        match self {
            Self::Environment { hint, .. } => Some(hint),
            _ => None,
        }
    }
}

/// Result type alias using RunnerError.
pub type Result<T> = std::result::Result<T, RunnerError>;
