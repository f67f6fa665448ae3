//! Error types for the hanging protocol core
//!
//! Failures are split by where they arise: building the model from documents,
//! talking to an external data source, or resolving a matching request.
//! Source and engine errors are `Clone` so a memoized failure can be handed to
//! every caller awaiting it.

use thiserror::Error;

use crate::shared::date::DateError;

/// Errors raised while building or converting model entities
#[derive(Debug, Error)]
pub enum ModelError {
    /// A document date could not be interpreted
    #[error("invalid protocol date: {0}")]
    Date(#[from] DateError),

    /// A document did not have the expected shape
    #[error("invalid document: {0}")]
    Document(#[from] serde_json::Error),

    /// A TOML document did not have the expected shape
    #[error("invalid TOML document: {0}")]
    Toml(#[from] toml::de::Error),
}

/// A constraint validator could not evaluate a constraint
///
/// The matcher records these as a failed rule; they never abort a pass.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The constraint names a validator that does not exist
    #[error("unknown validator \"{0}\"")]
    UnknownValidator(String),

    /// The validator's options are malformed
    #[error("invalid options for {validator}: {message}")]
    InvalidOptions {
        /// Validator id
        validator: String,
        /// What is wrong with the options
        message: String,
    },

    /// The validator cannot operate on an absent value
    #[error("{validator} cannot be applied to missing attribute {attribute}")]
    MissingValue {
        /// Validator id
        validator: String,
        /// Attribute that had no value
        attribute: String,
    },
}

/// Errors raised by protocol and study data sources
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    /// The source does not implement the requested operation
    #[error("{0} is not implemented")]
    NotImplemented(String),

    /// Reading from the underlying storage failed
    #[error("failed to read {path}: {message}")]
    Io {
        /// Path or location that was being read
        path: String,
        /// Underlying error message
        message: String,
    },

    /// Stored data could not be parsed
    #[error("failed to parse {path}: {message}")]
    Parse {
        /// Path or location that was being parsed
        path: String,
        /// Underlying error message
        message: String,
    },

    /// The requested study is unknown to the source
    #[error("study not found: {0}")]
    StudyNotFound(String),

    /// An invalid argument was passed to the source
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl SourceError {
    /// Build an I/O error for a path
    pub fn io(path: impl std::fmt::Display, err: &std::io::Error) -> Self {
        Self::Io {
            path: path.to_string(),
            message: err.to_string(),
        }
    }

    /// Build a parse error for a path
    pub fn parse(path: impl std::fmt::Display, err: impl std::fmt::Display) -> Self {
        Self::Parse {
            path: path.to_string(),
            message: err.to_string(),
        }
    }
}

/// Errors surfaced by the protocol engine
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The engine was constructed with unusable input
    #[error("invalid engine argument: {0}")]
    InvalidArgument(String),

    /// Neither a matching protocol nor the fallback protocol exists
    #[error("default protocol not found: {0}")]
    DefaultProtocolNotFound(String),

    /// A viewport references a prior study that does not exist
    #[error("prior study not found (abstract prior value {0})")]
    PriorStudyNotFound(i64),

    /// A data source failed
    #[error(transparent)]
    Source(#[from] SourceError),
}
