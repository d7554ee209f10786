//! Error types for schema definitions
//!
//! Covers annotation parsing, structure lookup, default factories and
//! temporal text parsing.

/// Annotation text could not be parsed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid annotation '{input}' at offset {offset}: {message}")]
pub struct ParseAnnotationError {
    /// Full annotation text
    pub input: String,
    /// Byte offset of the failure
    pub offset: usize,
    /// What was expected
    pub message: String,
}

impl ParseAnnotationError {
    /// Create error at `offset` within `input`
    pub fn new(input: impl Into<String>, offset: usize, message: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            offset,
            message: message.into(),
        }
    }
}

/// Structure type lookup failed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveClassError {
    /// No structure registered under this name
    #[error("unknown structure type: '{name}'")]
    Unknown {
        /// Name as looked up
        name: String,
    },

    /// Short name matches several qualified names
    #[error("ambiguous structure type '{name}', candidates: {}", candidates.join(", "))]
    Ambiguous {
        /// Short name as looked up
        name: String,
        /// Matching qualified names
        candidates: Vec<String>,
    },
}

impl ResolveClassError {
    /// Create unknown-name error
    pub fn unknown(name: impl Into<String>) -> Self {
        Self::Unknown { name: name.into() }
    }
}

/// A default factory failed to produce a value
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("default factory '{name}' failed: {message}")]
pub struct FactoryError {
    /// Factory name
    pub name: String,
    /// Failure description
    pub message: String,
}

/// Temporal text did not match the exchange format
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind} text: '{text}'")]
pub struct TemporalParseError {
    /// `datetime` or `time`
    pub kind: &'static str,
    /// Rejected text
    pub text: String,
}

impl TemporalParseError {
    /// Create error for `kind`
    pub fn new(kind: &'static str, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

/// Errors while building schema definitions
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// Annotation parse failure
    #[error(transparent)]
    Annotation(#[from] ParseAnnotationError),

    /// Unknown named default factory
    #[error("unknown default factory '{0}' (expected list, dict, set or now)")]
    UnknownFactory(String),

    /// Field declared twice in one structure
    #[error("duplicate field '{field}' in {structure}")]
    DuplicateField {
        /// Qualified structure name
        structure: String,
        /// Repeated field name
        field: String,
    },

    /// Enumeration declared without members
    #[error("enumeration {0} has no members")]
    EmptyEnum(String),

    /// Invalid constraint pattern
    #[error("invalid pattern for field '{field}': {message}")]
    InvalidPattern {
        /// Field carrying the pattern
        field: String,
        /// Regex compile error
        message: String,
    },
}
