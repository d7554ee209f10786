//! Error taxonomy for resolution, acquisition and transport
//!
//! - [`ResolutionError`]: an annotation or structure cannot be reduced to a shape
//! - [`InputError`]: one prompt's text fails shape-local checks (re-prompted, never propagated)
//! - [`Aborted`]: the operator cancelled at a prompt
//! - [`TransportError`]: a value does not convert to or from its serialized form
//! - [`WizardError`]: everything that can end an acquisition pass

use std::fmt::Display;

/// Shape resolution failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolutionError {
    /// No rule recognizes the annotation (closed-world mode only)
    #[error("unrecognized annotation '{annotation}'")]
    Unrecognized {
        /// Annotation text as written
        annotation: String,
    },

    /// Nested structures recurse deeper than the configured ceiling
    #[error("structure nesting exceeds depth {limit} at '{path}'")]
    DepthExceeded {
        /// Configured ceiling
        limit: usize,
        /// Dotted field path where the ceiling was hit
        path: String,
    },
}

/// Rejected prompt input, shown to the operator as the re-prompt hint
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct InputError(pub String);

impl InputError {
    /// Create from message
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Operator cancelled at a prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("acquisition aborted by operator")]
pub struct Aborted;

/// Value could not be encoded or decoded
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransportError {
    /// Value kind does not match the strategy
    #[error("{strategy} strategy cannot encode a {found} value")]
    Encode {
        /// Strategy name
        strategy: &'static str,
        /// Kind of the offending value
        found: &'static str,
    },

    /// Transport value does not decode to the expected shape
    #[error("cannot decode {expected} from {found}")]
    Decode {
        /// Shape the strategy wanted
        expected: String,
        /// Transport value actually seen
        found: String,
    },

    /// NaN or infinite float
    #[error("non-finite float cannot be encoded")]
    NonFinite,

    /// Key not declared by the structure
    #[error("unknown field '{field}' for {structure}")]
    UnknownField {
        /// Qualified structure name
        structure: String,
        /// Undeclared key
        field: String,
    },

    /// No registered strategy handles the shape
    #[error("no strategy can encode {shape}")]
    Unsupported {
        /// Shape description
        shape: String,
    },

    /// Nested structure could not be introspected
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    /// Failure inside a composite value
    #[error("at '{path}': {source}")]
    At {
        /// Dotted element or key path
        path: String,
        /// Underlying failure
        #[source]
        source: Box<TransportError>,
    },
}

impl TransportError {
    /// Create encode error
    pub fn encode(strategy: &'static str, found: &'static str) -> Self {
        Self::Encode { strategy, found }
    }

    /// Create decode error
    pub fn decode(expected: impl Display, found: impl Display) -> Self {
        Self::Decode {
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    /// Wrap with the element or key where it happened
    #[must_use]
    pub fn at(self, segment: impl Display) -> Self {
        match self {
            Self::At { path, source } => Self::At {
                path: format!("{segment}.{path}"),
                source,
            },
            other => Self::At {
                path: segment.to_string(),
                source: Box::new(other),
            },
        }
    }
}

/// Errors that end an acquisition pass
#[derive(Debug, thiserror::Error)]
pub enum WizardError {
    /// Operator cancelled; no partial result exists
    #[error(transparent)]
    Aborted(#[from] Aborted),

    /// Annotation or structure resolution failed
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    /// Serialization failed
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Prompter answered with an index outside the offered choices
    #[error("choice {index} out of range for '{field}' ({count} options)")]
    InvalidChoice {
        /// Field being acquired
        field: String,
        /// Index the prompter returned
        index: usize,
        /// Number of choices offered
        count: usize,
    },

    /// Registry has no applicable strategy
    #[error("no strategy applies to field '{field}' ({shape})")]
    NoStrategy {
        /// Field being acquired
        field: String,
        /// Shape description
        shape: String,
    },
}

impl WizardError {
    /// Check for operator cancellation
    #[inline]
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_transport_paths_accumulate() {
        let err = TransportError::decode("int", "string").at("value").at(0).at("scores");
        assert_eq!(
            err.to_string(),
            "at 'scores.0.value': cannot decode int from string"
        );
    }

    #[test]
    fn abort_converts() {
        let err: WizardError = Aborted.into();
        assert!(err.is_aborted());
        assert_eq!(err.to_string(), "acquisition aborted by operator");
    }
}
