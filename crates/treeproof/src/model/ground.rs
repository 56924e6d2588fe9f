//! Grounding clauses over a finite domain

use crate::logic::{Clause, Formula, Signature, Sort, SymbolId, Term};
use std::collections::HashMap;
use std::fmt;

/// A term whose variables have been replaced by domain elements
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GroundTerm {
    Element(usize),
    App(SymbolId, Vec<GroundTerm>),
}

impl GroundTerm {
    /// Application subterms, arguments before the terms containing them
    pub fn applications(&self, out: &mut Vec<GroundTerm>) {
        if let GroundTerm::App(_, args) = self {
            for arg in args {
                arg.applications(out);
            }
            if !out.contains(self) {
                out.push(self.clone());
            }
        }
    }

    pub fn display<'a>(&'a self, signature: &'a Signature) -> GroundTermDisplay<'a> {
        GroundTermDisplay {
            term: self,
            signature,
        }
    }
}

pub struct GroundTermDisplay<'a> {
    term: &'a GroundTerm,
    signature: &'a Signature,
}

impl fmt::Display for GroundTermDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.term {
            GroundTerm::Element(i) => write!(f, "{}", i),
            GroundTerm::App(symbol, args) => {
                write!(f, "{}", self.signature.name(*symbol))?;
                if !args.is_empty() {
                    write!(f, "(")?;
                    for (i, arg) in args.iter().enumerate() {
                        if i > 0 {
                            write!(f, ",")?;
                        }
                        write!(f, "{}", arg.display(self.signature))?;
                    }
                    write!(f, ")")?;
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroundLiteral {
    pub predicate: SymbolId,
    pub args: Vec<GroundTerm>,
    pub positive: bool,
}

impl GroundLiteral {
    fn complement(&self) -> GroundLiteral {
        GroundLiteral {
            predicate: self.predicate,
            args: self.args.clone(),
            positive: !self.positive,
        }
    }
}

/// A ground clause: at least one literal must hold
pub type Constraint = Vec<GroundLiteral>;

/// Domain sizes for the two sorts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomainSizes {
    pub individuals: usize,
    pub worlds: usize,
}

impl DomainSizes {
    pub fn of(&self, sort: Sort) -> usize {
        match sort {
            Sort::Individual => self.individuals,
            Sort::World => self.worlds,
        }
    }
}

fn ground_term(term: &Term, assignment: &HashMap<SymbolId, usize>) -> GroundTerm {
    match term {
        Term::Var(v) => match assignment.get(v) {
            Some(&element) => GroundTerm::Element(element),
            None => GroundTerm::App(*v, Vec::new()),
        },
        Term::Free(s) | Term::Const(s) => GroundTerm::App(*s, Vec::new()),
        Term::App(f, args) => GroundTerm::App(
            *f,
            args.iter().map(|a| ground_term(a, assignment)).collect(),
        ),
    }
}

fn ground_literal(literal: &Formula, assignment: &HashMap<SymbolId, usize>) -> Option<GroundLiteral> {
    let (positive, predicate, args) = literal.literal_parts()?;
    Some(GroundLiteral {
        predicate,
        args: args.iter().map(|t| ground_term(t, assignment)).collect(),
        positive,
    })
}

/// Drop decided identity literals and duplicates; `None` when the
/// constraint is already satisfied
fn simplify(literals: Vec<GroundLiteral>) -> Option<Constraint> {
    let mut kept: Constraint = Vec::with_capacity(literals.len());
    for literal in literals {
        if literal.predicate == Signature::EQUALITY && literal.args.len() == 2 {
            let (s, t) = (&literal.args[0], &literal.args[1]);
            let decided = match (s, t) {
                (GroundTerm::Element(a), GroundTerm::Element(b)) => Some(a == b),
                _ if s == t => Some(true),
                _ => None,
            };
            match decided {
                Some(holds) if holds == literal.positive => return None,
                Some(_) => continue,
                None => {}
            }
        }
        if kept.contains(&literal.complement()) {
            return None;
        }
        if !kept.contains(&literal) {
            kept.push(literal);
        }
    }
    Some(kept)
}

/// All ground instances of `clauses` over the given domains, shortest
/// first. Returns `None` when more than `budget` constraints would be needed.
pub fn ground_clauses(
    clauses: &[Clause],
    signature: &Signature,
    sizes: DomainSizes,
    budget: usize,
) -> Option<Vec<Constraint>> {
    let mut constraints = Vec::new();
    for clause in clauses {
        let mut variables: Vec<SymbolId> = Vec::new();
        for literal in clause {
            for var in literal_variables(literal) {
                if !variables.contains(&var) {
                    variables.push(var);
                }
            }
        }
        let bounds: Vec<usize> = variables
            .iter()
            .map(|v| sizes.of(signature.sort(*v)))
            .collect();
        if bounds.iter().any(|&b| b == 0) {
            continue;
        }

        let mut values = vec![0usize; variables.len()];
        loop {
            let assignment: HashMap<SymbolId, usize> =
                variables.iter().copied().zip(values.iter().copied()).collect();
            let literals = clause
                .iter()
                .filter_map(|l| ground_literal(l, &assignment))
                .collect();
            if let Some(constraint) = simplify(literals) {
                if constraints.len() >= budget {
                    return None;
                }
                constraints.push(constraint);
            }
            if !advance(&mut values, &bounds) {
                break;
            }
        }
    }
    constraints.sort_by_key(|c: &Constraint| c.len());
    Some(constraints)
}

fn literal_variables(literal: &Formula) -> Vec<SymbolId> {
    let mut out = Vec::new();
    if let Some((_, _, args)) = literal.literal_parts() {
        for arg in args {
            arg.collect_bound_variables(&mut out);
        }
    }
    out
}

/// Odometer increment; false once every combination has been visited
pub(crate) fn advance(values: &mut [usize], bounds: &[usize]) -> bool {
    for i in (0..values.len()).rev() {
        values[i] += 1;
        if values[i] < bounds[i] {
            return true;
        }
        values[i] = 0;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::SymbolKind;

    #[test]
    fn odometer_visits_every_tuple() {
        let mut values = vec![0, 0];
        let mut seen = 1;
        while advance(&mut values, &[2, 3]) {
            seen += 1;
        }
        assert_eq!(seen, 6);
        assert_eq!(values, vec![0, 0]);
    }

    #[test]
    fn universal_clause_is_instantiated_per_element() {
        let mut sig = Signature::new();
        let x = sig.register("x", SymbolKind::Variable, 0).unwrap();
        let f = sig.register("F", SymbolKind::Predicate, 1).unwrap();
        let clause = vec![Formula::atom(f, vec![Term::Var(x)])];
        let sizes = DomainSizes {
            individuals: 3,
            worlds: 1,
        };
        let constraints = ground_clauses(&[clause], &sig, sizes, 100).unwrap();
        assert_eq!(constraints.len(), 3);
        assert_eq!(constraints[2][0].args, vec![GroundTerm::Element(2)]);
    }

    #[test]
    fn decided_identities_are_simplified() {
        // x=y ∨ Fx over two elements: the diagonal instances vanish
        let mut sig = Signature::new();
        let x = sig.register("x", SymbolKind::Variable, 0).unwrap();
        let y = sig.register("y", SymbolKind::Variable, 0).unwrap();
        let f = sig.register("F", SymbolKind::Predicate, 1).unwrap();
        let clause = vec![
            Formula::equality(Term::Var(x), Term::Var(y)),
            Formula::atom(f, vec![Term::Var(x)]),
        ];
        let sizes = DomainSizes {
            individuals: 2,
            worlds: 1,
        };
        let constraints = ground_clauses(&[clause], &sig, sizes, 100).unwrap();
        assert_eq!(constraints.len(), 2);
        assert!(constraints.iter().all(|c| c.len() == 1));
    }

    #[test]
    fn budget_is_enforced() {
        let mut sig = Signature::new();
        let x = sig.register("x", SymbolKind::Variable, 0).unwrap();
        let f = sig.register("F", SymbolKind::Predicate, 1).unwrap();
        let clause = vec![Formula::atom(f, vec![Term::Var(x)])];
        let sizes = DomainSizes {
            individuals: 5,
            worlds: 1,
        };
        assert!(ground_clauses(&[clause], &sig, sizes, 4).is_none());
    }
}
