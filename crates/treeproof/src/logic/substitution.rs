//! Substitutions of terms for free variables

use super::signature::{Signature, SymbolId};
use super::term::Term;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A finite mapping from free variables to terms.
///
/// Bindings are kept in insertion order and the mapping is kept idempotent:
/// no bound variable occurs in any range term.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Substitution {
    bindings: Vec<(SymbolId, Term)>,
}

impl Substitution {
    pub fn new() -> Self {
        Substitution {
            bindings: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn get(&self, var: SymbolId) -> Option<&Term> {
        self.bindings
            .iter()
            .find(|(v, _)| *v == var)
            .map(|(_, t)| t)
    }

    pub fn bindings(&self) -> &[(SymbolId, Term)] {
        &self.bindings
    }

    pub fn domain(&self) -> impl Iterator<Item = SymbolId> + '_ {
        self.bindings.iter().map(|(v, _)| *v)
    }

    /// Add `var ↦ term`, keeping the substitution idempotent.
    ///
    /// The term is first instantiated with the existing bindings, then the
    /// new binding is propagated into the existing range terms.
    pub fn bind(&mut self, var: SymbolId, term: Term) {
        let term = self.apply(&term);
        let from = Term::Free(var);
        for (_, existing) in self.bindings.iter_mut() {
            if existing.contains_free(var) {
                *existing = existing.replace(&from, &term, false);
            }
        }
        self.bindings.push((var, term));
    }

    pub fn apply(&self, term: &Term) -> Term {
        if self.bindings.is_empty() {
            return term.clone();
        }
        match term {
            Term::Free(v) => match self.get(*v) {
                Some(t) => t.clone(),
                None => term.clone(),
            },
            Term::App(f, args) => Term::App(*f, args.iter().map(|a| self.apply(a)).collect()),
            _ => term.clone(),
        }
    }

    /// Whether applying this substitution could change a term with these free variables
    pub fn affects(&self, free_variables: &[SymbolId]) -> bool {
        self.bindings.iter().any(|(v, _)| free_variables.contains(v))
    }

    pub fn is_idempotent(&self) -> bool {
        self.bindings
            .iter()
            .all(|(_, t)| self.bindings.iter().all(|(v, _)| !t.contains_free(*v)))
    }

    pub fn display<'a>(&'a self, signature: &'a Signature) -> SubstitutionDisplay<'a> {
        SubstitutionDisplay {
            substitution: self,
            signature,
        }
    }
}

pub struct SubstitutionDisplay<'a> {
    substitution: &'a Substitution,
    signature: &'a Signature,
}

impl fmt::Display for SubstitutionDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (var, term)) in self.substitution.bindings.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(
                f,
                "{} ↦ {}",
                self.signature.name(*var),
                term.display(self.signature)
            )?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::{Sort, SymbolKind};

    #[test]
    fn bind_propagates_into_existing_bindings() {
        let mut sig = Signature::new();
        let x = sig.fresh_free_variable(Sort::Individual);
        let y = sig.fresh_free_variable(Sort::Individual);
        let f = sig.register("f", SymbolKind::Function, 1).unwrap();
        let a = Term::Const(sig.register("a", SymbolKind::Constant, 0).unwrap());

        let mut subst = Substitution::new();
        subst.bind(x, Term::App(f, vec![Term::Free(y)]));
        subst.bind(y, a.clone());

        assert_eq!(subst.get(x), Some(&Term::App(f, vec![a.clone()])));
        assert!(subst.is_idempotent());
        assert_eq!(
            subst.display(&sig).to_string(),
            "{ξ1 ↦ f(a), ξ2 ↦ a}"
        );
    }

    #[test]
    fn apply_leaves_unbound_variables() {
        let mut sig = Signature::new();
        let x = sig.fresh_free_variable(Sort::Individual);
        let y = sig.fresh_free_variable(Sort::Individual);
        let mut subst = Substitution::new();
        subst.bind(x, Term::Free(y));
        assert_eq!(subst.apply(&Term::Free(x)), Term::Free(y));
        assert_eq!(subst.apply(&Term::Free(y)), Term::Free(y));
        assert!(subst.affects(&[x]));
        assert!(!subst.affects(&[y]));
    }
}
