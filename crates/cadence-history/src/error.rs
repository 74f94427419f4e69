//! Error types for variable declaration and history access.

use std::error::Error;
use std::fmt;

/// Errors from the variable arena.
///
/// All variants are declaration-time or apply-time invariant violations;
/// the engine surfaces them as fatal configuration or modeling errors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HistoryError {
    /// The same variable name was declared twice.
    DuplicateVariable {
        /// The re-declared name.
        name: String,
    },
    /// An operation addressed a name or id the arena never declared.
    UnknownVariable {
        /// The undeclared name (or stringified id).
        name: String,
    },
    /// A vector declaration with dimension 0.
    ZeroDimension {
        /// The offending declaration's name.
        name: String,
    },
    /// A bounded history declaration retaining 0 entries.
    ZeroDepth {
        /// The offending declaration's name.
        name: String,
    },
    /// An element index at or beyond the declared dimension.
    ElementOutOfRange {
        /// The addressed declaration's name.
        name: String,
        /// The offending element index.
        element: u32,
        /// The declared dimension.
        dimension: u32,
    },
}

impl fmt::Display for HistoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateVariable { name } => {
                write!(f, "variable '{name}' declared twice")
            }
            Self::UnknownVariable { name } => write!(f, "unknown variable '{name}'"),
            Self::ZeroDimension { name } => {
                write!(f, "variable '{name}' declared with dimension 0")
            }
            Self::ZeroDepth { name } => {
                write!(f, "variable '{name}' declared with history depth 0")
            }
            Self::ElementOutOfRange {
                name,
                element,
                dimension,
            } => write!(
                f,
                "element {element} out of range for '{name}' (dimension {dimension})"
            ),
        }
    }
}

impl Error for HistoryError {}
