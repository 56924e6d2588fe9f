//! treeproof: a free-variable tableau prover for first-order and modal logic
//!
//! The prover searches for a closed tableau and, in lock-step, for a finite
//! countermodel. Branches with equations close through rigid E-unification.

pub mod config;
pub mod equality;
pub mod error;
pub mod json;
pub mod logic;
pub mod model;
pub mod parser;
pub mod prover;
pub mod tableau;

pub use config::ProverConfig;
pub use error::{ParseError, ProverError, Result, SignatureError};

// Re-export commonly used types from logic
pub use logic::{
    AccessibilityProperty, Formula, ModalSystem, Signature, Sort, Substitution, SymbolId,
    SymbolKind, Term,
};

pub use equality::{EqualityProblem, EqualityReasoner};
pub use json::ProofReport;
pub use model::{FinderStatus, Model, ModelFinder};
pub use parser::{parse_formula, parse_problem, Problem};
pub use prover::{NoObserver, ProofObserver, Prover, Status, StatusReport};
pub use tableau::{StepOutcome, Tree};
