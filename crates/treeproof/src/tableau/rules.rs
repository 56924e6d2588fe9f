//! Expansion rules and the pending-task queue entries

use super::node::NodeId;
use crate::logic::{ExpansionType, Formula, Quantifier, Term};
use serde::Serialize;
use std::fmt;

/// Rule that produced a node, or that a pending task will apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Rule {
    Initial,
    /// Closure check for a literal
    Literal,
    Alpha,
    Beta,
    Gamma,
    Delta,
    ModalGamma,
    ModalDelta,
    Reflexivity,
    Symmetry,
    Transitivity,
    Euclidity,
    Seriality,
}

/// Task queue priorities; lower values run first
pub const PRIORITY_LITERAL: u8 = 0;
pub const PRIORITY_DELTA: u8 = 1;
pub const PRIORITY_GAMMA_EXISTENTIAL: u8 = 2;
pub const PRIORITY_GAMMA: u8 = 3;
pub const PRIORITY_MODAL_GAMMA: u8 = 4;
pub const PRIORITY_ALPHA: u8 = 5;
pub const PRIORITY_ACCESSIBILITY: u8 = 6;
pub const PRIORITY_BETA: u8 = 7;
pub const PRIORITY_SERIALITY: u8 = 8;
/// Gamma formulas waiting for another instance
pub const PRIORITY_REPEAT: u8 = 9;

impl Rule {
    /// Base priority of a task applying this rule
    pub fn priority(self) -> u8 {
        match self {
            Rule::Initial | Rule::Literal => PRIORITY_LITERAL,
            Rule::Delta | Rule::ModalDelta => PRIORITY_DELTA,
            Rule::Gamma => PRIORITY_GAMMA,
            Rule::ModalGamma => PRIORITY_MODAL_GAMMA,
            Rule::Alpha => PRIORITY_ALPHA,
            Rule::Reflexivity | Rule::Symmetry | Rule::Transitivity | Rule::Euclidity => {
                PRIORITY_ACCESSIBILITY
            }
            Rule::Beta => PRIORITY_BETA,
            Rule::Seriality => PRIORITY_SERIALITY,
        }
    }

    /// The rule that expands a formula, with its queue priority
    pub fn for_formula(formula: &Formula) -> (Rule, u8) {
        match formula.expansion() {
            ExpansionType::Literal => (Rule::Literal, PRIORITY_LITERAL),
            ExpansionType::Alpha => (Rule::Alpha, PRIORITY_ALPHA),
            ExpansionType::Beta => (Rule::Beta, PRIORITY_BETA),
            ExpansionType::Gamma => {
                // Witnesses first: instantiate universals whose body still has an existential
                let existential = formula
                    .quantifier_parts()
                    .map_or(false, |parts| parts.body.has_existential_force());
                if existential {
                    (Rule::Gamma, PRIORITY_GAMMA_EXISTENTIAL)
                } else {
                    (Rule::Gamma, PRIORITY_GAMMA)
                }
            }
            ExpansionType::Delta => (Rule::Delta, PRIORITY_DELTA),
            ExpansionType::Modal(Quantifier::Forall) => (Rule::ModalGamma, PRIORITY_MODAL_GAMMA),
            ExpansionType::Modal(Quantifier::Exists) => (Rule::ModalDelta, PRIORITY_DELTA),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Rule::Initial => "initial",
            Rule::Literal => "literal",
            Rule::Alpha => "alpha",
            Rule::Beta => "beta",
            Rule::Gamma => "gamma",
            Rule::Delta => "delta",
            Rule::ModalGamma => "modalGamma",
            Rule::ModalDelta => "modalDelta",
            Rule::Reflexivity => "reflexivity",
            Rule::Symmetry => "symmetry",
            Rule::Transitivity => "transitivity",
            Rule::Euclidity => "euclidity",
            Rule::Seriality => "seriality",
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskTarget {
    Node(NodeId),
    /// Seriality and reflexivity apply to worlds rather than nodes
    World(Term),
}

/// A pending expansion on one branch.
///
/// `gamma_origin` is the gamma node whose instance this task descends from;
/// the origin is queued again once the instance has been expanded.
#[derive(Debug, Clone)]
pub struct Task {
    pub rule: Rule,
    pub target: TaskTarget,
    pub priority: u8,
    pub gamma_origin: Option<NodeId>,
    pub(crate) seq: u64,
}

impl Task {
    pub(crate) fn sort_key(&self) -> (u8, u64) {
        (self.priority, self.seq)
    }

    pub fn node(&self) -> Option<NodeId> {
        match self.target {
            TaskTarget::Node(id) => Some(id),
            TaskTarget::World(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::{Signature, SymbolKind};

    #[test]
    fn priority_table_order() {
        let order = [
            Rule::Literal,
            Rule::Delta,
            Rule::Gamma,
            Rule::ModalGamma,
            Rule::Alpha,
            Rule::Transitivity,
            Rule::Beta,
            Rule::Seriality,
        ];
        for pair in order.windows(2) {
            assert!(pair[0].priority() < pair[1].priority(), "{:?}", pair);
        }
        assert!(Rule::Seriality.priority() < PRIORITY_REPEAT);
    }

    #[test]
    fn gamma_with_existential_body_runs_earlier() {
        let mut sig = Signature::new();
        let x = sig.register("x", SymbolKind::Variable, 0).unwrap();
        let y = sig.register("y", SymbolKind::Variable, 0).unwrap();
        let r = sig.register("R", SymbolKind::Predicate, 2).unwrap();
        let rxy = Formula::atom(r, vec![Term::Var(x), Term::Var(y)]);

        let all_exists = Formula::forall(x, Formula::exists(y, rxy.clone()));
        let all_all = Formula::forall(x, Formula::forall(y, rxy));
        assert_eq!(
            Rule::for_formula(&all_exists),
            (Rule::Gamma, PRIORITY_GAMMA_EXISTENTIAL)
        );
        assert_eq!(Rule::for_formula(&all_all), (Rule::Gamma, PRIORITY_GAMMA));
    }
}
