//! Backtracking search for an interpretation of one domain size
//!
//! Constraints are processed in order. For each constraint the terms it
//! mentions for the first time receive denotations, enumerated like an
//! odometer, and then one of its literals is made true, either because it
//! already holds or by adding a predicate fact. Every constraint position
//! remembers the denotations and facts it introduced so backtracking undoes
//! exactly those.

use super::ground::{advance, Constraint, DomainSizes, GroundLiteral, GroundTerm};
use crate::logic::{Signature, Sort, SymbolId};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelStep {
    Searching,
    /// Every constraint is satisfied
    Complete,
    /// No interpretation of this domain size exists
    Exhausted,
}

type Fact = (SymbolId, Vec<usize>);

#[derive(Debug, Clone)]
struct ConstraintState {
    new_terms: Vec<GroundTerm>,
    bounds: Vec<usize>,
    values: Vec<usize>,
    next_disjunct: usize,
    chosen: Option<usize>,
    added_facts: Vec<Fact>,
    /// Denotations of `new_terms` are installed
    applied: bool,
}

#[derive(Debug, Clone)]
pub struct Model {
    sizes: DomainSizes,
    constraints: Vec<Constraint>,
    symbol_sorts: HashMap<SymbolId, Sort>,
    denotations: IndexMap<GroundTerm, usize>,
    extensions: IndexMap<Fact, bool>,
    states: Vec<ConstraintState>,
    exhausted: bool,
}

impl Model {
    pub fn new(
        constraints: Vec<Constraint>,
        sizes: DomainSizes,
        symbol_sorts: HashMap<SymbolId, Sort>,
    ) -> Self {
        Model {
            sizes,
            constraints,
            symbol_sorts,
            denotations: IndexMap::new(),
            extensions: IndexMap::new(),
            states: Vec::new(),
            exhausted: false,
        }
    }

    pub fn sizes(&self) -> DomainSizes {
        self.sizes
    }

    pub fn denotations(&self) -> impl Iterator<Item = (&GroundTerm, usize)> {
        self.denotations.iter().map(|(t, v)| (t, *v))
    }

    pub fn extensions(&self) -> impl Iterator<Item = (SymbolId, &[usize], bool)> {
        self.extensions
            .iter()
            .map(|((p, args), value)| (*p, args.as_slice(), *value))
    }

    pub fn denotation(&self, term: &GroundTerm) -> Option<usize> {
        match term {
            GroundTerm::Element(i) => Some(*i),
            GroundTerm::App(..) => self.denotations.get(term).copied(),
        }
    }

    pub fn extension(&self, predicate: SymbolId, args: &[usize]) -> Option<bool> {
        self.extensions.get(&(predicate, args.to_vec())).copied()
    }

    pub fn sort_of(&self, term: &GroundTerm) -> Sort {
        match term {
            GroundTerm::App(symbol, _) => self
                .symbol_sorts
                .get(symbol)
                .copied()
                .unwrap_or(Sort::Individual),
            GroundTerm::Element(_) => Sort::Individual,
        }
    }

    /// Work on the current constraint once
    pub fn step(&mut self) -> ModelStep {
        if self.exhausted {
            return ModelStep::Exhausted;
        }
        let needs_next = self.states.last().map_or(true, |s| s.chosen.is_some());
        if needs_next {
            let next = self.states.len();
            if next == self.constraints.len() {
                return ModelStep::Complete;
            }
            let state = self.open_constraint(next);
            self.states.push(state);
        }

        let top = self.states.len() - 1;
        if !self.states[top].applied {
            self.install(top);
            if !self.denotations_are_consistent() {
                self.next_assignment(top);
                return self.status();
            }
        }

        let start = self.states[top].next_disjunct;
        for d in start..self.constraints[top].len() {
            let literal = self.constraints[top][d].clone();
            if let Some(fact) = self.satisfy(&literal) {
                let state = &mut self.states[top];
                state.chosen = Some(d);
                state.next_disjunct = d + 1;
                state.added_facts.extend(fact);
                return self.status();
            }
        }
        self.next_assignment(top);
        self.status()
    }

    fn status(&self) -> ModelStep {
        if self.exhausted {
            ModelStep::Exhausted
        } else if self.states.len() == self.constraints.len()
            && self.states.last().map_or(true, |s| s.chosen.is_some())
        {
            ModelStep::Complete
        } else {
            ModelStep::Searching
        }
    }

    fn open_constraint(&self, position: usize) -> ConstraintState {
        let mut terms = Vec::new();
        for literal in &self.constraints[position] {
            for arg in &literal.args {
                arg.applications(&mut terms);
            }
        }
        terms.retain(|t| !self.denotations.contains_key(t));
        let bounds = terms
            .iter()
            .map(|t| self.sizes.of(self.sort_of(t)))
            .collect();
        ConstraintState {
            values: vec![0; terms.len()],
            new_terms: terms,
            bounds,
            next_disjunct: 0,
            chosen: None,
            added_facts: Vec::new(),
            applied: false,
        }
    }

    fn install(&mut self, position: usize) {
        let state = &mut self.states[position];
        for (term, value) in state.new_terms.iter().zip(&state.values) {
            self.denotations.insert(term.clone(), *value);
        }
        state.applied = true;
    }

    fn uninstall(&mut self, position: usize) {
        let state = &mut self.states[position];
        for term in &state.new_terms {
            self.denotations.shift_remove(term);
        }
        state.applied = false;
    }

    /// Move the odometer of `position`; drop the constraint and backtrack
    /// once every assignment has been tried
    fn next_assignment(&mut self, position: usize) {
        self.uninstall(position);
        let state = &mut self.states[position];
        state.next_disjunct = 0;
        if advance(&mut state.values, &state.bounds) {
            return;
        }
        self.states.pop();
        self.backtrack();
    }

    /// Reopen the previous constraint at its next literal
    fn backtrack(&mut self) {
        let Some(state) = self.states.last_mut() else {
            self.exhausted = true;
            return;
        };
        state.chosen = None;
        for fact in state.added_facts.drain(..) {
            self.extensions.shift_remove(&fact);
        }
    }

    fn evaluate(&self, args: &[GroundTerm]) -> Option<Vec<usize>> {
        args.iter().map(|t| self.denotation(t)).collect()
    }

    /// Make `literal` true if possible. The inner option is the fact that
    /// had to be added.
    fn satisfy(&mut self, literal: &GroundLiteral) -> Option<Option<Fact>> {
        let values = self.evaluate(&literal.args)?;
        if literal.predicate == Signature::EQUALITY && values.len() == 2 {
            return ((values[0] == values[1]) == literal.positive).then_some(None);
        }
        let key = (literal.predicate, values);
        match self.extensions.get(&key) {
            Some(&value) => (value == literal.positive).then_some(None),
            None => {
                self.extensions.insert(key.clone(), literal.positive);
                Some(Some(key))
            }
        }
    }

    /// Applications of the same function to arguments with equal
    /// denotations must denote the same element
    pub fn denotations_are_consistent(&self) -> bool {
        let mut seen: HashMap<(SymbolId, Vec<usize>), usize> = HashMap::new();
        for (term, &value) in &self.denotations {
            let GroundTerm::App(symbol, args) = term else {
                continue;
            };
            let Some(values) = self.evaluate(args) else {
                continue;
            };
            match seen.insert((*symbol, values), value) {
                Some(previous) if previous != value => return false,
                _ => {}
            }
        }
        true
    }

    /// Whether the current interpretation satisfies every constraint
    pub fn satisfies_all(&self) -> bool {
        self.constraints.iter().all(|constraint| {
            constraint.iter().any(|literal| {
                let Some(values) = self.evaluate(&literal.args) else {
                    return false;
                };
                if literal.predicate == Signature::EQUALITY && values.len() == 2 {
                    return (values[0] == values[1]) == literal.positive;
                }
                self.extension(literal.predicate, &values) == Some(literal.positive)
            })
        })
    }

    pub fn display(&self, signature: &Signature) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "individuals: {}, worlds: {}",
            self.sizes.individuals, self.sizes.worlds
        );
        for (term, value) in &self.denotations {
            let _ = writeln!(out, "{} ↦ {}", term.display(signature), value);
        }
        let mut predicates: Vec<SymbolId> = Vec::new();
        for ((p, _), _) in &self.extensions {
            if !predicates.contains(p) {
                predicates.push(*p);
            }
        }
        for p in predicates {
            let tuples: Vec<String> = self
                .extensions
                .iter()
                .filter(|((q, _), value)| *q == p && **value)
                .map(|((_, args), _)| match args.as_slice() {
                    [single] => single.to_string(),
                    many => format!(
                        "({})",
                        many.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(",")
                    ),
                })
                .collect();
            let _ = writeln!(out, "{}: {{{}}}", signature.name(p), tuples.join(", "));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::SymbolKind;

    struct TestContext {
        sig: Signature,
    }

    impl TestContext {
        fn new() -> Self {
            TestContext {
                sig: Signature::new(),
            }
        }

        fn constant(&mut self, name: &str) -> GroundTerm {
            let id = self.sig.register(name, SymbolKind::Constant, 0).unwrap();
            GroundTerm::App(id, vec![])
        }

        fn literal(&mut self, pred: &str, args: Vec<GroundTerm>, positive: bool) -> GroundLiteral {
            let predicate = self
                .sig
                .register(pred, SymbolKind::Predicate, args.len())
                .unwrap();
            GroundLiteral {
                predicate,
                args,
                positive,
            }
        }

        fn model(&self, constraints: Vec<Constraint>, individuals: usize) -> Model {
            let sizes = DomainSizes {
                individuals,
                worlds: 1,
            };
            Model::new(constraints, sizes, HashMap::new())
        }
    }

    fn run(model: &mut Model) -> ModelStep {
        for _ in 0..1000 {
            match model.step() {
                ModelStep::Searching => continue,
                done => return done,
            }
        }
        ModelStep::Searching
    }

    #[test]
    fn distinct_constants_need_two_elements() {
        // Fa, ¬Fb
        let mut ctx = TestContext::new();
        let a = ctx.constant("a");
        let b = ctx.constant("b");
        let fa = ctx.literal("F", vec![a.clone()], true);
        let not_fb = ctx.literal("F", vec![b.clone()], false);
        let f = fa.predicate;

        let mut small = ctx.model(vec![vec![fa.clone()], vec![not_fb.clone()]], 1);
        assert_eq!(run(&mut small), ModelStep::Exhausted);

        let mut model = ctx.model(vec![vec![fa], vec![not_fb]], 2);
        assert_eq!(run(&mut model), ModelStep::Complete);
        assert!(model.satisfies_all());
        assert_eq!(model.denotation(&a), Some(0));
        assert_eq!(model.denotation(&b), Some(1));
        assert_eq!(model.extension(f, &[0]), Some(true));
        assert_eq!(model.extension(f, &[1]), Some(false));
    }

    #[test]
    fn backtracking_undoes_facts() {
        // (Fa ∨ Ga), ¬Fa
        let mut ctx = TestContext::new();
        let a = ctx.constant("a");
        let fa = ctx.literal("F", vec![a.clone()], true);
        let ga = ctx.literal("G", vec![a.clone()], true);
        let not_fa = ctx.literal("F", vec![a], false);
        let f = fa.predicate;
        let g = ga.predicate;

        let mut model = ctx.model(vec![vec![fa, ga], vec![not_fa]], 1);
        assert_eq!(run(&mut model), ModelStep::Complete);
        assert_eq!(model.extension(f, &[0]), Some(false));
        assert_eq!(model.extension(g, &[0]), Some(true));
        assert!(model.satisfies_all());
    }

    #[test]
    fn function_values_stay_consistent() {
        // f(a) ≠ f(b) forces a and b apart
        let mut ctx = TestContext::new();
        let a = ctx.constant("a");
        let b = ctx.constant("b");
        let fun = ctx.sig.register("f", SymbolKind::Function, 1).unwrap();
        let fa = GroundTerm::App(fun, vec![a.clone()]);
        let fb = GroundTerm::App(fun, vec![b.clone()]);
        let distinct = GroundLiteral {
            predicate: Signature::EQUALITY,
            args: vec![fa, fb],
            positive: false,
        };

        let mut model = ctx.model(vec![vec![distinct]], 2);
        assert_eq!(run(&mut model), ModelStep::Complete);
        assert!(model.denotations_are_consistent());
        assert_ne!(model.denotation(&a), model.denotation(&b));
    }

    #[test]
    fn empty_constraint_exhausts() {
        let ctx = TestContext::new();
        let mut model = ctx.model(vec![vec![]], 3);
        assert_eq!(run(&mut model), ModelStep::Exhausted);
    }

    #[test]
    fn no_constraints_is_complete() {
        let ctx = TestContext::new();
        let mut model = ctx.model(vec![], 1);
        assert_eq!(model.step(), ModelStep::Complete);
    }
}
