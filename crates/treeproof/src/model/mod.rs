//! Finite model finder
//!
//! Runs beside the tableau on the clausal form of the same formulas and
//! tries domains of growing size until an interpretation satisfies every
//! ground constraint.

pub mod finder;
pub mod ground;
#[allow(clippy::module_inception)]
pub mod model;

pub use finder::{FinderStatus, ModelFinder};
pub use ground::{ground_clauses, Constraint, DomainSizes, GroundLiteral, GroundTerm};
pub use model::{Model, ModelStep};
