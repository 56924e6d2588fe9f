//! Rigid E-unification problems and the BSE search
//!
//! A problem asks for a substitution under which the branch's equations
//! make two term lists equal. Two rewrite rules generate new problems:
//!
//! - **rrbs** rewrites a subterm of a goal side `s` (with `s ≻ t`) by an
//!   equation `l = r` oriented `l ≻ r`, after unifying `l` with the subterm.
//! - **lrbs** applies the same rewrite to a side of another equation, which
//!   is replaced by the rewritten one.
//!
//! Rewriting never happens at free-variable positions. The search is
//! breadth-first over problems and bounded by the number of problems
//! expanded.

use super::constraint::SubstitutionConstraint;
use crate::logic::{Signature, Term, TermOrder};
use std::collections::{HashSet, VecDeque};
use tracing::trace;

/// Upper bound on solved forms collected for one problem
const MAX_SOLVED_FORMS: usize = 16;

/// A rewrite step in the history of a problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BseRule {
    /// Goal pair `goal` rewritten with equation `equation`
    Rrbs { equation: usize, goal: usize },
    /// Equation `target` rewritten with equation `equation`
    Lrbs { equation: usize, target: usize },
}

#[derive(Debug, Clone)]
pub struct EqualityProblem {
    equations: Vec<(Term, Term)>,
    terms1: Vec<Term>,
    terms2: Vec<Term>,
    constraint: SubstitutionConstraint,
    history: Vec<BseRule>,
}

impl EqualityProblem {
    /// Make `terms1` and `terms2` pairwise equal using `equations`
    pub fn new(equations: Vec<(Term, Term)>, terms1: Vec<Term>, terms2: Vec<Term>) -> Self {
        EqualityProblem {
            equations,
            terms1,
            terms2,
            constraint: SubstitutionConstraint::trivial(),
            history: Vec::new(),
        }
    }

    pub fn constraint(&self) -> &SubstitutionConstraint {
        &self.constraint
    }

    /// Ways of closing the goal right now.
    ///
    /// Each goal pair is closed either by unifying its sides or by unifying
    /// it with an equation in either orientation; the pairs are combined
    /// conjunctively.
    pub fn solutions(&self, order: &TermOrder) -> SubstitutionConstraint {
        if self.terms1.len() != self.terms2.len() {
            return SubstitutionConstraint::unsatisfiable();
        }
        let mut current = self.constraint.clone();
        for (s, t) in self.terms1.iter().zip(&self.terms2) {
            let mut next = current.extend(&[(s, t)], &[], order);
            for (l, r) in &self.equations {
                next.or(current.extend(&[(s, l), (t, r)], &[], order));
                next.or(current.extend(&[(s, r), (t, l)], &[], order));
            }
            next.truncate(MAX_SOLVED_FORMS);
            if next.is_unsatisfiable() {
                return next;
            }
            current = next;
        }
        current
    }

    /// Goal sides with at least one rewrite applied
    pub fn rrbs(&self, order: &TermOrder) -> Vec<EqualityProblem> {
        let mut results = Vec::new();
        for goal in 0..self.terms1.len() {
            let sides = [
                (&self.terms1[goal], &self.terms2[goal], true),
                (&self.terms2[goal], &self.terms1[goal], false),
            ];
            for (s, t, first) in sides {
                for (index, equation) in self.equations.iter().enumerate() {
                    for (pos, rewritten, constraint) in self.rewrites(s, t, equation, order) {
                        let mut problem = self.clone();
                        let side = if first {
                            &mut problem.terms1[goal]
                        } else {
                            &mut problem.terms2[goal]
                        };
                        *side = rewritten;
                        problem.constraint = constraint;
                        problem.history.push(BseRule::Rrbs {
                            equation: index,
                            goal,
                        });
                        trace!(goal, equation = index, position = ?pos, "rrbs");
                        results.push(problem);
                    }
                }
            }
        }
        results
    }

    /// Equations rewritten with other equations
    pub fn lrbs(&self, order: &TermOrder) -> Vec<EqualityProblem> {
        let mut results = Vec::new();
        for target in 0..self.equations.len() {
            let (a, b) = &self.equations[target];
            for (s, t, first) in [(a, b, true), (b, a, false)] {
                for (index, equation) in self.equations.iter().enumerate() {
                    if index == target {
                        continue;
                    }
                    for (pos, rewritten, constraint) in self.rewrites(s, t, equation, order) {
                        let mut problem = self.clone();
                        problem.equations[target] = if first {
                            (rewritten, t.clone())
                        } else {
                            (t.clone(), rewritten)
                        };
                        problem.constraint = constraint;
                        problem.history.push(BseRule::Lrbs {
                            equation: index,
                            target,
                        });
                        trace!(target, equation = index, position = ?pos, "lrbs");
                        results.push(problem);
                    }
                }
            }
        }
        results
    }

    /// Rewrites of `s` (required to be greater than `t`) by `equation` in
    /// both orientations, with the constraint each one needs
    fn rewrites(
        &self,
        s: &Term,
        t: &Term,
        equation: &(Term, Term),
        order: &TermOrder,
    ) -> Vec<(Vec<usize>, Term, SubstitutionConstraint)> {
        let (left, right) = equation;
        if left == right {
            return Vec::new();
        }
        let mut results = Vec::new();
        for (l, r) in [(left, right), (right, left)] {
            for (pos, subterm) in s.positions() {
                if subterm.is_free_variable() {
                    continue;
                }
                let constraint = self
                    .constraint
                    .extend(&[(l, subterm)], &[(l, r), (s, t)], order);
                if constraint.is_unsatisfiable() || !constraint.check_satisfiable(order) {
                    continue;
                }
                let rewritten = s.replace_at(&pos, r.clone());
                results.push((pos, rewritten, constraint));
            }
        }
        results
    }

    fn key(&self) -> (Vec<(Term, Term)>, Vec<Term>, Vec<Term>, SubstitutionConstraint) {
        (
            self.equations.clone(),
            self.terms1.clone(),
            self.terms2.clone(),
            self.constraint.clone(),
        )
    }
}

/// A solved problem: the closing constraint and the rewrites that led to it
#[derive(Debug, Clone)]
pub struct EqualitySolution {
    pub constraint: SubstitutionConstraint,
    pub history: Vec<BseRule>,
}

/// Breadth-first BSE search
pub struct EqualityReasoner<'a> {
    order: TermOrder<'a>,
    max_problems: usize,
}

impl<'a> EqualityReasoner<'a> {
    pub fn new(signature: &'a Signature, max_problems: usize) -> Self {
        EqualityReasoner {
            order: TermOrder::new(signature),
            max_problems,
        }
    }

    /// First solution found, in breadth-first order, within the problem budget
    pub fn solve(&self, problem: EqualityProblem) -> Option<EqualitySolution> {
        let mut queue = VecDeque::from([problem]);
        let mut seen = HashSet::new();
        let mut expanded = 0;

        while let Some(problem) = queue.pop_front() {
            let solutions = problem.solutions(&self.order);
            if !solutions.is_unsatisfiable() && solutions.check_satisfiable(&self.order) {
                trace!(
                    steps = problem.history.len(),
                    forms = solutions.solved_forms().len(),
                    "equality problem solved"
                );
                return Some(EqualitySolution {
                    constraint: solutions,
                    history: problem.history,
                });
            }
            expanded += 1;
            if expanded >= self.max_problems {
                trace!(expanded, "equality search budget exhausted");
                return None;
            }
            for successor in problem
                .rrbs(&self.order)
                .into_iter()
                .chain(problem.lrbs(&self.order))
            {
                if seen.insert(successor.key()) {
                    queue.push_back(successor);
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::{Sort, SymbolKind};

    struct TestContext {
        sig: Signature,
    }

    impl TestContext {
        fn new() -> Self {
            TestContext {
                sig: Signature::new(),
            }
        }

        fn constant(&mut self, name: &str) -> Term {
            Term::Const(self.sig.register(name, SymbolKind::Constant, 0).unwrap())
        }

        fn func(&mut self, name: &str, args: Vec<Term>) -> Term {
            let id = self.sig.register(name, SymbolKind::Function, args.len()).unwrap();
            Term::App(id, args)
        }

        fn var(&mut self) -> Term {
            Term::Free(self.sig.fresh_free_variable(Sort::Individual))
        }
    }

    #[test]
    fn transitivity_needs_one_lrbs_step() {
        let mut ctx = TestContext::new();
        let b = ctx.constant("b");
        let c = ctx.constant("c");
        let d = ctx.constant("d");
        let problem = EqualityProblem::new(
            vec![(b.clone(), d.clone()), (c.clone(), d)],
            vec![b],
            vec![c],
        );

        let solution = EqualityReasoner::new(&ctx.sig, 100).solve(problem).unwrap();
        assert_eq!(solution.history.len(), 1);
        assert!(matches!(solution.history[0], BseRule::Lrbs { .. }));
        assert!(solution.constraint.substitutions().all(|s| s.is_empty()));
    }

    #[test]
    fn rewriting_inside_a_goal_term() {
        // a = b ⊢ f(a) = f(b)
        let mut ctx = TestContext::new();
        let a = ctx.constant("a");
        let b = ctx.constant("b");
        let fa = ctx.func("f", vec![a.clone()]);
        let fb = ctx.func("f", vec![b.clone()]);
        let problem = EqualityProblem::new(vec![(a, b)], vec![fa], vec![fb]);

        let solution = EqualityReasoner::new(&ctx.sig, 100).solve(problem).unwrap();
        assert_eq!(solution.history.len(), 1);
        assert!(matches!(solution.history[0], BseRule::Rrbs { .. }));
    }

    #[test]
    fn free_variables_are_instantiated() {
        // f(a) = b ⊢ f(x) = b, solved by x ↦ a without rewriting
        let mut ctx = TestContext::new();
        let a = ctx.constant("a");
        let b = ctx.constant("b");
        let x = ctx.var();
        let fa = ctx.func("f", vec![a.clone()]);
        let fx = ctx.func("f", vec![x.clone()]);
        let problem = EqualityProblem::new(vec![(fa, b.clone())], vec![fx], vec![b]);

        let solution = EqualityReasoner::new(&ctx.sig, 100).solve(problem).unwrap();
        assert!(solution.history.is_empty());
        let sigma = solution.constraint.substitutions().next().unwrap();
        assert_eq!(sigma.apply(&x), a);
    }

    #[test]
    fn unrelated_equations_do_not_help() {
        let mut ctx = TestContext::new();
        let a = ctx.constant("a");
        let b = ctx.constant("b");
        let c = ctx.constant("c");
        let problem = EqualityProblem::new(vec![(a.clone(), c)], vec![a], vec![b]);
        assert!(EqualityReasoner::new(&ctx.sig, 50).solve(problem).is_none());
    }

    #[test]
    fn goal_lists_of_different_length_are_unsolvable() {
        let mut ctx = TestContext::new();
        let a = ctx.constant("a");
        let problem = EqualityProblem::new(Vec::new(), vec![a.clone()], vec![a.clone(), a]);
        let order = TermOrder::new(&ctx.sig);
        assert!(problem.solutions(&order).is_unsatisfiable());
    }
}
