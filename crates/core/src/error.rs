//! Error types shared across the tutoring core.
//!
//! Only `ConfigurationError` is fatal. Lookup and backend errors are absorbed
//! by the caller so a session never ends in the middle of a conversation.

use std::path::PathBuf;

/// The pedagogical configuration could not be loaded or is missing a required section.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("Failed to read configuration file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Configuration is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Missing required configuration section: '{0}'")]
    MissingSection(String),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// An expected key was absent at lookup time.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigLookupError {
    #[error("No mastery topic for level {level} in domain '{domain}'")]
    MasteryTopic { domain: String, level: u8 },
    #[error("Unknown mastery domain '{0}'")]
    UnknownDomain(String),
}

/// The model backend failed to produce a reply.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    #[error("Ensure the model backend is running with model '{model}'. Details: {message}")]
    Unavailable { model: String, message: String },
    #[error("Reply stream failed: {0}")]
    Stream(String),
}
