//! Terms, formulas and the operations on them shared by the tableau,
//! the equality reasoner and the model finder.

pub mod formula;
pub mod modal;
pub mod normal_form;
pub mod ordering;
pub mod signature;
pub mod substitution;
pub mod term;
pub mod unification;


pub use formula::{
    BinaryOp, ExpansionType, Formula, FormulaKind, ModalOp, ModalParts, Quantifier,
    QuantifierParts, SymbolSets,
};
pub use modal::{accessibility_axioms, translate_from_modal, AccessibilityProperty, ModalSystem};
pub use normal_form::{simplify_clauses, Clause};
pub use ordering::{TermOrder, TermOrdering};
pub use signature::{Signature, Sort, SymbolId, SymbolInfo, SymbolKind};
pub use substitution::Substitution;
pub use term::{Position, Term};
pub use unification::{unify, unify_lists, unify_with, UnificationError, UnificationResult};
