//! Rigid equality reasoning for closing branches with equations

pub mod constraint;
pub mod problem;

pub use constraint::{SolvedForm, SubstitutionConstraint};
pub use problem::{BseRule, EqualityProblem, EqualityReasoner, EqualitySolution};
