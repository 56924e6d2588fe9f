//! Modal logic support
//!
//! Modal formulas are translated into first-order formulas over an extra
//! world sort before the search starts. `□A` evaluated at world `w` becomes
//! `∀v(ℛwv → A@v)` and `◇A` becomes `∃v(ℛwv ∧ A@v)`. When accessibility is
//! universal the guards are dropped.

use super::formula::{Formula, FormulaKind, ModalOp, Quantifier};
use super::signature::{Signature, Sort};
use super::term::Term;
use crate::error::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Frame conditions on the accessibility relation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessibilityProperty {
    Reflexivity,
    Symmetry,
    Transitivity,
    Euclidity,
    Seriality,
    Universality,
}

impl AccessibilityProperty {
    pub const ALL: [AccessibilityProperty; 6] = [
        AccessibilityProperty::Reflexivity,
        AccessibilityProperty::Symmetry,
        AccessibilityProperty::Transitivity,
        AccessibilityProperty::Euclidity,
        AccessibilityProperty::Seriality,
        AccessibilityProperty::Universality,
    ];

    pub fn name(self) -> &'static str {
        match self {
            AccessibilityProperty::Reflexivity => "reflexivity",
            AccessibilityProperty::Symmetry => "symmetry",
            AccessibilityProperty::Transitivity => "transitivity",
            AccessibilityProperty::Euclidity => "euclidity",
            AccessibilityProperty::Seriality => "seriality",
            AccessibilityProperty::Universality => "universality",
        }
    }
}

impl fmt::Display for AccessibilityProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for AccessibilityProperty {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        AccessibilityProperty::ALL
            .iter()
            .copied()
            .find(|p| p.name() == lower)
            .ok_or_else(|| ParseError::UnknownAccessibility(s.to_string()))
    }
}

/// Named normal modal systems
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModalSystem {
    K,
    T,
    D,
    B,
    K4,
    S4,
    S5,
}

impl ModalSystem {
    pub fn properties(self) -> Vec<AccessibilityProperty> {
        use AccessibilityProperty::*;
        match self {
            ModalSystem::K => vec![],
            ModalSystem::T => vec![Reflexivity],
            ModalSystem::D => vec![Seriality],
            ModalSystem::B => vec![Reflexivity, Symmetry],
            ModalSystem::K4 => vec![Transitivity],
            ModalSystem::S4 => vec![Reflexivity, Transitivity],
            ModalSystem::S5 => vec![Universality],
        }
    }
}

impl FromStr for ModalSystem {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "K" => Ok(ModalSystem::K),
            "T" => Ok(ModalSystem::T),
            "D" => Ok(ModalSystem::D),
            "B" => Ok(ModalSystem::B),
            "K4" => Ok(ModalSystem::K4),
            "S4" => Ok(ModalSystem::S4),
            "S5" => Ok(ModalSystem::S5),
            _ => Err(ParseError::UnknownAccessibility(s.to_string())),
        }
    }
}

/// Standard translation of `formula` evaluated at `world`.
///
/// Identity atoms are left alone: individuals are rigid across worlds.
pub fn translate_from_modal(
    formula: &Formula,
    world: &Term,
    signature: &mut Signature,
    universal: bool,
) -> Formula {
    match formula.kind() {
        FormulaKind::Atom { predicate, terms } => {
            if *predicate == Signature::EQUALITY || *predicate == Signature::ACCESSIBILITY {
                return formula.clone();
            }
            let mut terms = terms.clone();
            terms.push(world.clone());
            Formula::atom(*predicate, terms)
        }
        FormulaKind::Not(sub) => {
            Formula::negation(translate_from_modal(sub, world, signature, universal))
        }
        FormulaKind::Binary { op, left, right } => {
            let left = translate_from_modal(left, world, signature, universal);
            let right = translate_from_modal(right, world, signature, universal);
            Formula::binary(*op, left, right)
        }
        FormulaKind::Quantified {
            quantifier,
            variable,
            sort,
            matrix,
        } => {
            let matrix = translate_from_modal(matrix, world, signature, universal);
            Formula::quantified(*quantifier, *variable, *sort, matrix)
        }
        FormulaKind::Modal { op, sub } => {
            let v = signature.fresh_bound_variable(Sort::World);
            let inner = translate_from_modal(sub, &Term::Var(v), signature, universal);
            let quantifier = op.quantifier();
            if universal {
                return Formula::quantified(quantifier, v, Sort::World, inner);
            }
            let guard = Formula::accessibility(world.clone(), Term::Var(v));
            let matrix = match op {
                ModalOp::Necessity => Formula::implies(guard, inner),
                ModalOp::Possibility => Formula::and(guard, inner),
            };
            Formula::quantified(quantifier, v, Sort::World, matrix)
        }
    }
}

/// First-order axioms for the selected frame conditions
pub fn accessibility_axioms(
    properties: &[AccessibilityProperty],
    signature: &mut Signature,
) -> Vec<Formula> {
    let mut axioms = Vec::new();
    for property in properties {
        let u = signature.fresh_bound_variable(Sort::World);
        let v = signature.fresh_bound_variable(Sort::World);
        let t = signature.fresh_bound_variable(Sort::World);
        let r = |a: usize, b: usize| {
            let vars = [u, v, t];
            Formula::accessibility(Term::Var(vars[a]), Term::Var(vars[b]))
        };
        let all = |vars: &[usize], body: Formula| {
            let names = [u, v, t];
            vars.iter().rev().fold(body, |acc, &i| {
                Formula::quantified(Quantifier::Forall, names[i], Sort::World, acc)
            })
        };
        let axiom = match property {
            AccessibilityProperty::Reflexivity => all(&[0], r(0, 0)),
            AccessibilityProperty::Symmetry => all(&[0, 1], Formula::implies(r(0, 1), r(1, 0))),
            AccessibilityProperty::Transitivity => all(
                &[0, 1, 2],
                Formula::implies(Formula::and(r(0, 1), r(1, 2)), r(0, 2)),
            ),
            AccessibilityProperty::Euclidity => all(
                &[0, 1, 2],
                Formula::implies(Formula::and(r(0, 1), r(0, 2)), r(1, 2)),
            ),
            AccessibilityProperty::Seriality => all(
                &[0],
                Formula::quantified(Quantifier::Exists, v, Sort::World, r(0, 1)),
            ),
            // Universality is handled by the unguarded translation
            AccessibilityProperty::Universality => continue,
        };
        axioms.push(axiom);
    }
    axioms
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::{ExpansionType, SymbolKind};

    #[test]
    fn box_becomes_guarded_universal() {
        let mut sig = Signature::new();
        let p = sig.register("p", SymbolKind::Predicate, 0).unwrap();
        let w = Term::Const(sig.initial_world());
        let f = Formula::modal(ModalOp::Necessity, Formula::atom(p, vec![]));

        let translated = translate_from_modal(&f, &w, &mut sig, false);
        assert_eq!(
            translated.expansion(),
            ExpansionType::Modal(Quantifier::Forall)
        );
        assert_eq!(translated.display(&sig).to_string(), "∀υ1(ℛ(ω0,υ1) → p(υ1))");
    }

    #[test]
    fn universal_translation_drops_guards() {
        let mut sig = Signature::new();
        let p = sig.register("p", SymbolKind::Predicate, 0).unwrap();
        let w = Term::Const(sig.initial_world());
        let f = Formula::modal(ModalOp::Possibility, Formula::atom(p, vec![]));

        let translated = translate_from_modal(&f, &w, &mut sig, true);
        assert_eq!(translated.expansion(), ExpansionType::Delta);
    }

    #[test]
    fn identity_atoms_are_rigid() {
        let mut sig = Signature::new();
        let a = Term::Const(sig.register("a", SymbolKind::Constant, 0).unwrap());
        let w = Term::Const(sig.initial_world());
        let eq = Formula::equality(a.clone(), a);
        assert_eq!(translate_from_modal(&eq, &w, &mut sig, false), eq);
    }

    #[test]
    fn property_names_parse() {
        assert_eq!(
            "Transitivity".parse::<AccessibilityProperty>().unwrap(),
            AccessibilityProperty::Transitivity
        );
        assert!("density".parse::<AccessibilityProperty>().is_err());
        assert_eq!(
            "s4".parse::<ModalSystem>().unwrap().properties(),
            vec![
                AccessibilityProperty::Reflexivity,
                AccessibilityProperty::Transitivity
            ]
        );
    }

    #[test]
    fn axioms_skip_universality() {
        let mut sig = Signature::new();
        let axioms = accessibility_axioms(
            &[
                AccessibilityProperty::Reflexivity,
                AccessibilityProperty::Universality,
                AccessibilityProperty::Seriality,
            ],
            &mut sig,
        );
        assert_eq!(axioms.len(), 2);
        assert_eq!(axioms[1].expansion(), ExpansionType::Gamma);
    }
}
