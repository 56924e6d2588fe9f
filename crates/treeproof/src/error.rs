//! Error types for treeproof

use crate::logic::SymbolKind;
use thiserror::Error;

/// Conflicting use of a symbol name within one signature
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignatureError {
    #[error("'{name}' is already used as a {existing}, it cannot also be a {requested}")]
    KindConflict {
        name: String,
        existing: SymbolKind,
        requested: SymbolKind,
    },

    #[error("'{name}' takes {expected} argument(s), but is used with {found}")]
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,
    },
}

/// Malformed input text
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Empty input")]
    Empty,

    #[error("Cannot parse '{fragment}' at position {position}")]
    Unparseable { position: usize, fragment: String },

    #[error("Missing argument for '{operator}' at position {position}")]
    MissingArgument { operator: String, position: usize },

    #[error("Unbalanced parentheses at position {position}")]
    Unbalanced { position: usize },

    #[error(transparent)]
    Signature(#[from] SignatureError),

    #[error("Unknown accessibility property '{0}'")]
    UnknownAccessibility(String),
}

#[derive(Error, Debug)]
pub enum ProverError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Internal invariant violated: {0}")]
    Invariant(String),
}

pub type Result<T> = std::result::Result<T, ProverError>;
