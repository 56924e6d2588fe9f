//! Searching growing domains for a finite model

use super::ground::{ground_clauses, DomainSizes};
use super::model::{Model, ModelStep};
use crate::config::ProverConfig;
use crate::logic::{
    accessibility_axioms, simplify_clauses, AccessibilityProperty, Clause, Formula, Signature,
    Sort, SymbolId,
};
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinderStatus {
    Searching,
    Found,
    /// Every allowed domain size was tried or grounding exceeded its budget
    GaveUp,
}

#[derive(Debug, Clone)]
pub struct ModelFinder {
    signature: Signature,
    clauses: Vec<Clause>,
    symbol_sorts: HashMap<SymbolId, Sort>,
    modal: bool,
    sizes: DomainSizes,
    max_individuals: usize,
    max_worlds: usize,
    max_ground_constraints: usize,
    model: Option<Model>,
    status: FinderStatus,
}

impl ModelFinder {
    /// Prepare a search for a model of `formulas`.
    ///
    /// The finder works on its own copy of the signature since clausal
    /// normal form introduces Skolem functions.
    pub fn new(formulas: &[Formula], signature: &Signature, config: &ProverConfig, modal: bool) -> Self {
        let mut signature = signature.clone();
        let mut clauses: Vec<Clause> = Vec::new();
        for formula in formulas {
            clauses.extend(formula.clausal_normal_form(&mut signature));
        }
        if modal {
            let properties: Vec<AccessibilityProperty> = config
                .accessibility
                .iter()
                .copied()
                .filter(|p| *p != AccessibilityProperty::Universality)
                .collect();
            for axiom in accessibility_axioms(&properties, &mut signature) {
                clauses.extend(axiom.clausal_normal_form(&mut signature));
            }
        }
        let clauses = simplify_clauses(clauses);
        let symbol_sorts = (0..signature.len() as u32)
            .map(SymbolId)
            .map(|id| (id, signature.sort(id)))
            .collect();

        ModelFinder {
            signature,
            clauses,
            symbol_sorts,
            modal,
            sizes: DomainSizes {
                individuals: 1,
                worlds: 1,
            },
            max_individuals: config.max_individuals.max(1),
            max_worlds: config.max_worlds.max(1),
            max_ground_constraints: config.max_ground_constraints,
            model: None,
            status: FinderStatus::Searching,
        }
    }

    pub fn status(&self) -> FinderStatus {
        self.status
    }

    pub fn sizes(&self) -> DomainSizes {
        self.sizes
    }

    /// Signature extended with the Skolem symbols of the clausal form
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// The model, once one has been found
    pub fn model(&self) -> Option<&Model> {
        match self.status {
            FinderStatus::Found => self.model.as_ref(),
            _ => None,
        }
    }

    pub fn step(&mut self) -> FinderStatus {
        if self.status != FinderStatus::Searching {
            return self.status;
        }
        if self.model.is_none() {
            let budget = self.max_ground_constraints;
            match ground_clauses(&self.clauses, &self.signature, self.sizes, budget) {
                Some(constraints) => {
                    self.model = Some(Model::new(constraints, self.sizes, self.symbol_sorts.clone()));
                }
                None => {
                    debug!(
                        individuals = self.sizes.individuals,
                        worlds = self.sizes.worlds,
                        budget,
                        "grounding budget exceeded"
                    );
                    self.status = FinderStatus::GaveUp;
                    return self.status;
                }
            }
        }
        let Some(model) = self.model.as_mut() else {
            return self.status;
        };
        match model.step() {
            ModelStep::Searching => {}
            ModelStep::Complete => {
                debug!(
                    individuals = self.sizes.individuals,
                    worlds = self.sizes.worlds,
                    "model found"
                );
                self.status = FinderStatus::Found;
            }
            ModelStep::Exhausted => {
                self.model = None;
                if !self.grow() {
                    debug!("model finder exhausted every domain size");
                    self.status = FinderStatus::GaveUp;
                }
            }
        }
        self.status
    }

    /// Enlarge the domains; worlds and individuals alternate for modal input
    fn grow(&mut self) -> bool {
        let can_individuals = self.sizes.individuals < self.max_individuals;
        let can_worlds = self.modal && self.sizes.worlds < self.max_worlds;
        if can_worlds && (self.sizes.worlds <= self.sizes.individuals || !can_individuals) {
            self.sizes.worlds += 1;
        } else if can_individuals {
            self.sizes.individuals += 1;
        } else {
            return false;
        }
        debug!(
            individuals = self.sizes.individuals,
            worlds = self.sizes.worlds,
            "domain enlarged"
        );
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::{SymbolKind, Term};

    fn run(finder: &mut ModelFinder) -> FinderStatus {
        for _ in 0..10_000 {
            match finder.step() {
                FinderStatus::Searching => continue,
                done => return done,
            }
        }
        FinderStatus::Searching
    }

    #[test]
    fn finds_two_element_model() {
        let mut sig = Signature::new();
        let f = sig.register("F", SymbolKind::Predicate, 1).unwrap();
        let a = Term::Const(sig.register("a", SymbolKind::Constant, 0).unwrap());
        let b = Term::Const(sig.register("b", SymbolKind::Constant, 0).unwrap());
        let formula = Formula::and(
            Formula::atom(f, vec![a]),
            Formula::negation(Formula::atom(f, vec![b])),
        );

        let mut finder = ModelFinder::new(&[formula], &sig, &ProverConfig::default(), false);
        assert_eq!(run(&mut finder), FinderStatus::Found);
        let model = finder.model().unwrap();
        assert_eq!(model.sizes().individuals, 2);
        assert!(model.satisfies_all());
    }

    #[test]
    fn gives_up_on_contradiction() {
        let mut sig = Signature::new();
        let p = Formula::atom(sig.register("p", SymbolKind::Predicate, 0).unwrap(), vec![]);
        let config = ProverConfig {
            max_individuals: 3,
            ..ProverConfig::default()
        };
        let mut finder = ModelFinder::new(&[p.clone(), p.negate()], &sig, &config, false);
        assert_eq!(run(&mut finder), FinderStatus::GaveUp);
        assert_eq!(finder.sizes().individuals, 3);
        assert!(finder.model().is_none());
    }

    #[test]
    fn modal_growth_alternates() {
        let sig = Signature::new();
        let config = ProverConfig {
            max_individuals: 2,
            max_worlds: 2,
            ..ProverConfig::default()
        };
        let mut finder = ModelFinder::new(&[], &sig, &config, true);
        assert!(finder.grow());
        assert_eq!(finder.sizes(), DomainSizes { individuals: 1, worlds: 2 });
        assert!(finder.grow());
        assert_eq!(finder.sizes(), DomainSizes { individuals: 2, worlds: 2 });
        assert!(!finder.grow());
    }
}
