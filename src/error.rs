//! Error types for the DB2 dialect compiler.

use thiserror::Error;

/// The main error type for DB2 compilation.
#[derive(Debug, Error)]
pub enum Db2Error {
    /// Identifier is too long or its quoting cannot be resolved.
    #[error("Invalid identifier '{name}': {reason}")]
    InvalidIdentifier { name: String, reason: String },

    /// Tuple comparison arity differs between the two sides.
    #[error("Shape mismatch: left side has {left} column(s), right side has {right}")]
    ShapeMismatch { left: usize, right: usize },

    /// The construct has no DB2 translation.
    #[error("Unsupported construct: {0}")]
    UnsupportedConstruct(String),

    /// Placeholder count and parameter count disagree.
    #[error("Parameter count mismatch: {placeholders} placeholder(s) but {params} parameter(s) in: {sql}")]
    ParamCountMismatch {
        sql: String,
        placeholders: usize,
        params: usize,
    },

    /// Pagination marks violate `0 <= low <= high`.
    #[error("Invalid row window: low mark {low} is above high mark {high}")]
    InvalidWindow { low: u64, high: u64 },

    /// SQL text could not be lifted into a statement.
    #[error("Parse error at position {position}: {message}")]
    Parse { position: usize, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Db2Error {
    /// Create a parse error at the given position.
    pub fn parse(position: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            position,
            message: message.into(),
        }
    }

    /// Create an unsupported-construct error.
    pub fn unsupported(what: impl Into<String>) -> Self {
        Self::UnsupportedConstruct(what.into())
    }

    /// Create an invalid-identifier error.
    pub fn identifier(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidIdentifier {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn shape(left: usize, right: usize) -> Self {
        Self::ShapeMismatch { left, right }
    }
}

/// Result type alias for DB2 compilation.
pub type Db2Result<T> = Result<T, Db2Error>;
