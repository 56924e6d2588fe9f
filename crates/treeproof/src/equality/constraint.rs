//! Substitution constraints for rigid E-unification

use crate::logic::{unify_with, Substitution, Term, TermOrder, TermOrdering};

/// A substitution together with the ordering requirements it was derived under.
///
/// Each pair `(s, t)` in `orderings` demands `sσ ≻ tσ`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SolvedForm {
    pub substitution: Substitution,
    pub orderings: Vec<(Term, Term)>,
}

impl SolvedForm {
    /// Extend with the unification problems in `unify` and the ordering
    /// requirements in `greater`. Returns `None` when a unification fails or
    /// an ordering requirement is already violated.
    pub fn extend(
        &self,
        unify: &[(&Term, &Term)],
        greater: &[(&Term, &Term)],
        order: &TermOrder,
    ) -> Option<SolvedForm> {
        let mut substitution = self.substitution.clone();
        for (s, t) in unify {
            unify_with(s, t, &mut substitution).ok()?;
        }
        let mut orderings = self.orderings.clone();
        for (s, t) in greater {
            let pair = ((*s).clone(), (*t).clone());
            if !orderings.contains(&pair) {
                orderings.push(pair);
            }
        }
        let extended = SolvedForm {
            substitution,
            orderings,
        };
        extended.is_consistent(order).then_some(extended)
    }

    /// No ordering requirement evaluates to `≺` or `=` under the substitution
    pub fn is_consistent(&self, order: &TermOrder) -> bool {
        self.orderings.iter().all(|(s, t)| {
            let s = self.substitution.apply(s);
            let t = self.substitution.apply(t);
            !matches!(order.compare(&s, &t), TermOrdering::Less | TermOrdering::Equal)
        })
    }
}

/// Disjunction of solved forms.
///
/// An empty disjunction is unsatisfiable; the trivial constraint is a
/// single empty solved form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubstitutionConstraint {
    solved_forms: Vec<SolvedForm>,
}

impl SubstitutionConstraint {
    pub fn trivial() -> Self {
        SubstitutionConstraint {
            solved_forms: vec![SolvedForm::default()],
        }
    }

    pub fn unsatisfiable() -> Self {
        SubstitutionConstraint {
            solved_forms: Vec::new(),
        }
    }

    pub fn solved_forms(&self) -> &[SolvedForm] {
        &self.solved_forms
    }

    pub fn is_unsatisfiable(&self) -> bool {
        self.solved_forms.is_empty()
    }

    /// Extend every solved form, dropping those that become inconsistent
    pub fn extend(
        &self,
        unify: &[(&Term, &Term)],
        greater: &[(&Term, &Term)],
        order: &TermOrder,
    ) -> SubstitutionConstraint {
        let mut result = SubstitutionConstraint::unsatisfiable();
        for form in &self.solved_forms {
            if let Some(extended) = form.extend(unify, greater, order) {
                result.push(extended);
            }
        }
        result
    }

    /// Add a disjunct unless it is already present
    pub fn push(&mut self, form: SolvedForm) {
        if !self.solved_forms.contains(&form) {
            self.solved_forms.push(form);
        }
    }

    pub fn or(&mut self, other: SubstitutionConstraint) {
        for form in other.solved_forms {
            self.push(form);
        }
    }

    pub fn truncate(&mut self, len: usize) {
        self.solved_forms.truncate(len);
    }

    /// Full satisfiability of the ordering constraints.
    ///
    /// Orderings over non-ground terms are never proven unsatisfiable; the
    /// per-extension check in `SolvedForm::is_consistent` is the only pruning.
    pub fn check_satisfiable(&self, _order: &TermOrder) -> bool {
        true
    }

    /// The substitutions of all solved forms, in order
    pub fn substitutions(&self) -> impl Iterator<Item = &Substitution> + '_ {
        self.solved_forms.iter().map(|f| &f.substitution)
    }
}
