//! Error types for cmdgate.
//!
//! Defines the main error enum used throughout the crate. Layer-specific
//! errors (policy parsing, argument coercion, registration) live next to the
//! code that produces them and convert into [`GateError`].

use std::path::PathBuf;

use thiserror::Error;

use crate::commands::catalog::RegistrationError;
use crate::permissions::parser::PolicyParseError;

/// Main error type for cmdgate operations.
#[derive(Error, Debug)]
pub enum GateError {
    /// Configuration errors (invalid config file, bad values, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// A command definition was rejected while building the catalog.
    #[error("Registration error: {0}")]
    Registration(#[from] RegistrationError),

    /// A policy document could not be parsed.
    #[error("Policy error in {name}: {source}")]
    Policy {
        /// Class name of the offending document.
        name: String,
        #[source]
        source: PolicyParseError,
    },

    /// Filesystem errors while reading configuration or policy files.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Response delivery failed.
    #[error("Delivery error: {0}")]
    Delivery(String),
}

impl GateError {
    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a policy error for the named document.
    pub fn policy(name: impl Into<String>, source: PolicyParseError) -> Self {
        Self::Policy {
            name: name.into(),
            source,
        }
    }

    /// Creates an I/O error for the given path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a delivery error with the given message.
    pub fn delivery(msg: impl Into<String>) -> Self {
        Self::Delivery(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "Configuration Error",
            Self::Registration(_) => "Registration Error",
            Self::Policy { .. } => "Policy Error",
            Self::Io { .. } => "I/O Error",
            Self::Delivery(_) => "Delivery Error",
        }
    }
}

/// Result type alias using GateError.
pub type Result<T> = std::result::Result<T, GateError>;
