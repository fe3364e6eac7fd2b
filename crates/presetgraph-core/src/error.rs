//! Error types for preset validation.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("environment variable names must not be empty")]
    EmptyEnvironmentKey,

    #[error("cache variable names must not be empty")]
    EmptyCacheVariableName,

    #[error("missing required field \"{0}\"")]
    MissingField(&'static str),

    #[error("\"warnings.{0}\" is false but \"errors.{0}\" is true")]
    ConflictingDiagnostics(&'static str),

    #[error("invalid condition: {0}")]
    InvalidCondition(String),
}

pub type Result<T> = std::result::Result<T, Error>;
