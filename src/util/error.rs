//! Error types for the scene description core.

use thiserror::Error;

/// Main error type for stage, prim and attribute operations.
///
/// Every variant is a recoverable precondition violation: callers are
/// expected to branch on it rather than treat it as fatal.
#[derive(Error, Debug)]
pub enum Error {
    /// A path string could not be parsed
    #[error("Invalid path syntax '{path}': {reason}")]
    InvalidPathSyntax { path: String, reason: String },

    /// A single path segment or property name is empty or malformed
    #[error("Invalid path segment: '{0}'")]
    InvalidSegment(String),

    /// Layer identity (e.g. "hello.usda") is malformed
    #[error("Invalid layer identity: '{0}'")]
    InvalidIdentity(String),

    /// Value type name is not present in the registry
    #[error("Unknown value type: {0}")]
    UnknownValueType(String),

    /// Value type name (or alias) is already registered
    #[error("Duplicate value type name: {0}")]
    DuplicateTypeName(String),

    /// Prim already defined with a different, non-empty type
    #[error("Prim <{path}> is already defined as '{existing}', cannot redefine as '{requested}'")]
    TypeConflict {
        path: String,
        existing: String,
        requested: String,
    },

    /// Attribute already exists with a different value type
    #[error("Attribute <{path}> already has type {existing}, requested {requested}")]
    AttributeTypeConflict {
        path: String,
        existing: String,
        requested: String,
    },

    /// Prim, attribute or path not present on the stage
    #[error("Not found: {0}")]
    NotFound(String),

    /// Value rejected by its type's validator
    #[error("Invalid value for {type_name}: {reason}")]
    InvalidValue { type_name: String, reason: String },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an "other" error from a string.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Create a not-found error.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Create a path syntax error.
    pub fn path_syntax(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPathSyntax {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a validator rejection error.
    pub fn invalid_value(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for scene operations.
pub type Result<T> = std::result::Result<T, Error>;
