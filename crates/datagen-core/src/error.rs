//! Error taxonomy for evaluation and generation.

use crate::node::Location;

fn located(location: &Option<Location>) -> String {
    match location {
        Some(location) => format!("{location}: "),
        None => String::new(),
    }
}

/// Error type for evaluator and generator operations.
///
/// Every variant except [`GenError::Emit`] carries the source location of the
/// node that caused it, when known. Errors are never recovered from inside
/// the engine: the first one aborts the current entity, batch and script.
#[derive(Debug, thiserror::Error)]
pub enum GenError {
    /// AST node shape does not match what is expected at its position
    #[error("{}{message}", located(.location))]
    StructuralMismatch {
        message: String,
        location: Option<Location>,
    },

    /// Identifier absent from the whole scope chain
    #[error("{}Cannot resolve symbol `{name}`", located(.location))]
    UnresolvedSymbol {
        name: String,
        location: Option<Location>,
    },

    /// Wrong argument count or type for a builtin or distribution
    #[error("{}{message}", located(.location))]
    ArityOrTypeMismatch {
        message: String,
        location: Option<Location>,
    },

    /// Negative or inverted bounds, or a generation count below one
    #[error("{}{message}", located(.location))]
    RangeViolation {
        message: String,
        location: Option<Location>,
    },

    /// Operator applied to runtime values it cannot combine
    #[error("{}Incompatible types for operator {operator:?}: {left} and {right}", located(.location))]
    IncompatibleTypes {
        operator: String,
        left: String,
        right: String,
        location: Option<Location>,
    },

    /// Failure reported by an emitter
    #[error("Emitter error: {0}")]
    Emit(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl GenError {
    pub fn structural(message: impl Into<String>) -> Self {
        Self::StructuralMismatch {
            message: message.into(),
            location: None,
        }
    }

    pub fn unresolved(name: impl Into<String>) -> Self {
        Self::UnresolvedSymbol {
            name: name.into(),
            location: None,
        }
    }

    pub fn arity(message: impl Into<String>) -> Self {
        Self::ArityOrTypeMismatch {
            message: message.into(),
            location: None,
        }
    }

    pub fn range(message: impl Into<String>) -> Self {
        Self::RangeViolation {
            message: message.into(),
            location: None,
        }
    }

    pub fn incompatible(
        operator: impl Into<String>,
        left: impl Into<String>,
        right: impl Into<String>,
    ) -> Self {
        Self::IncompatibleTypes {
            operator: operator.into(),
            left: left.into(),
            right: right.into(),
            location: None,
        }
    }

    pub fn emit<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Emit(Box::new(err))
    }

    pub fn location(&self) -> Option<&Location> {
        match self {
            Self::StructuralMismatch { location, .. }
            | Self::UnresolvedSymbol { location, .. }
            | Self::ArityOrTypeMismatch { location, .. }
            | Self::RangeViolation { location, .. }
            | Self::IncompatibleTypes { location, .. } => location.as_ref(),
            Self::Emit(_) => None,
        }
    }

    /// Attach `at` as the source location unless one is already set.
    pub fn at(mut self, at: Option<&Location>) -> Self {
        let Some(at) = at else {
            return self;
        };
        match &mut self {
            Self::StructuralMismatch { location, .. }
            | Self::UnresolvedSymbol { location, .. }
            | Self::ArityOrTypeMismatch { location, .. }
            | Self::RangeViolation { location, .. }
            | Self::IncompatibleTypes { location, .. } => {
                if location.is_none() {
                    *location = Some(at.clone());
                }
            }
            Self::Emit(_) => {}
        }
        self
    }
}
